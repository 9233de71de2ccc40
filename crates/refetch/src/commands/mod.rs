//! Command handlers.

pub mod config_cmd;
pub mod get;
pub mod key;
pub mod span;
pub mod util;
pub mod watch;

use refetch_core::Revalidator;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch commands that need an engine.
pub async fn dispatch(
    cmd: &Command,
    revalidator: &Revalidator,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Get(args) => get::handle(args, revalidator, global).await,
        Command::Watch(args) => watch::handle(args, revalidator, global).await,
        other => Err(CliError::Engine {
            message: format!("{other:?} does not use the request engine"),
        }),
    }
}
