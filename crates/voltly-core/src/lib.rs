// voltly-core: converter engine and poll pipeline between voltly-api and consumers.

pub mod config;
pub mod convert;
pub mod coordinator;
pub mod error;
pub mod path;
pub mod registry;
pub mod station;
pub mod subscribe;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::StationConfig;
pub use convert::{Converter, Decode, Domain, FlatValues};
pub use coordinator::StationCoordinator;
pub use error::CoreError;
pub use path::get_value;
pub use registry::ConverterRegistry;
pub use subscribe::{StateSubscriber, Subscription};
