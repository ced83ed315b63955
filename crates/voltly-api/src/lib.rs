// voltly-api: Async Rust client for the Baidu charge_service station API

pub mod client;
pub mod error;
pub mod models;
pub mod place;
pub mod transport;

pub use client::{ChargeClient, API_BASE, DEFAULT_TP_CODE};
pub use error::Error;
pub use place::extract_poi_uid;
pub use transport::TransportConfig;
