use std::fmt::Display;

use tracing::{error, warn};

/// Logs a failed step and continues with `None`.
pub fn log_error<T, E: Display>(result: Result<T, E>, msg: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            error!("{msg}: {err}");
            None
        }
    }
}

/// Logs a failure that is deliberately tolerated. Returns `true` if the result was an error.
pub fn log_tolerated<T, E: Display>(result: Result<T, E>, msg: &str) -> bool {
    match result {
        Ok(_) => false,
        Err(err) => {
            warn!("{msg}: {err}");
            true
        }
    }
}
