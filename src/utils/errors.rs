#![forbid(unsafe_code)]

use thiserror::Error;

/// Error enumerates the errors returned by this application.
#[derive(Error, Debug)]
pub enum Errors {
    /// Input parameter logging.
    #[error("hello_server input parameters:\n{}", .0)]
    InputParms(String),

    /// The PORT environment variable could not be parsed as a TCP port.
    #[error("Invalid PORT value '{}': {}", .0, .1)]
    InvalidPort(String, String),

    /// Inaccessible logger configuration file.
    #[error("Unable to initialize Log4rs logging: {}", .0)]
    Log4rsInitialization(String),
}
