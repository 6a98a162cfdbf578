//! Error handling for the hazard watch crate.

/// A specialized `Result` type for hazard watch operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// The main error type for hazard watch operations.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input could not be parsed
    #[error("Failed to parse input: {0}")]
    ParseError(String),

    /// Hardware link could not be opened or read
    #[error("Hardware link error: {0}")]
    Link(String),

    /// Actuation hook command failed
    #[error("Actuation error: {0}")]
    Actuation(String),

    /// Web server error
    #[error("Web server error: {0}")]
    WebServer(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MonitorError {
    /// Create a new parse error
    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a new hardware link error
    pub fn link_error(msg: impl Into<String>) -> Self {
        Self::Link(msg.into())
    }

    /// Create a new actuation error
    pub fn actuation_error(msg: impl Into<String>) -> Self {
        Self::Actuation(msg.into())
    }

    /// Create a new web server error
    pub fn web_server_error(msg: impl Into<String>) -> Self {
        Self::WebServer(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
