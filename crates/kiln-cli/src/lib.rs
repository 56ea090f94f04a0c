//! Library side of the kiln binaries.

pub mod cli;
pub mod generate;
pub mod layout;
pub mod logging;
pub mod summary;
pub mod testrun;

use logging::{LogConfig, init_logging};

/// Sets up logging from the environment, reporting failure on stderr.
pub fn init_logging_from_env() {
    if let Err(error) = init_logging(&LogConfig::from_env()) {
        eprintln!("warning: failed to initialize logging: {error}");
    }
}
