pub mod config_cmd;
pub mod find;
pub mod status;
pub mod watch;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route a station-addressing command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Status(args) => status::handle(args, global).await,
        Command::Watch(args) => watch::handle(args, global).await,
        Command::Find(args) => find::handle(args, global).await,
        Command::Config(_) | Command::Completions(_) => {
            unreachable!("handled before dispatch")
        }
    }
}
