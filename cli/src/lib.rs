//! Terminal front end for a remote contact agenda.
//!
//! ## Exit Codes
//! - 0: Success
//! - 1: Operation failure (remote, validation, not found, cancelled)
//! - 2: Configuration or usage error

pub mod agenda_cmd;
pub mod prompt;
pub mod render;
mod shell;

pub use agenda_cmd::AgendaCli;

use agenda_core::{ConfigError, OperationError};
use tracing_subscriber::EnvFilter;

pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG: u8 = 2;

/// Install the stderr subscriber. `RUST_LOG` wins unless `verbose` is set.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("agenda_core=debug,agenda_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Print a failure the way the user should see it.
pub fn report(err: &anyhow::Error) {
    match err.downcast_ref::<OperationError>() {
        Some(OperationError::Validation(errors)) => {
            eprintln!("Invalid contact:");
            eprintln!("{}", render::field_errors(errors));
        }
        Some(op) => eprintln!("{}", op.user_message()),
        None => eprintln!("error: {err:#}"),
    }
}

pub fn exit_code(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<ConfigError>().is_some() {
        EXIT_CONFIG
    } else {
        EXIT_FAILURE
    }
}
