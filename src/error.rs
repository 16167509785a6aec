use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckinError {
    #[error("Request to the portal failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Local file access failed: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse page: {0}")]
    ParsingError(String),

    #[error("The portal session appears to have expired")]
    SessionExpired,

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Could not find required element on the page: {0}")]
    ElementNotFound(String),

    #[error("Check-in was rejected by the portal: {0}")]
    CheckInRejected(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, CheckinError>;
