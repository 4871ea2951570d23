//! Error types for the discovery engine
//!
//! Only failures a caller can act on get their own variant. Degraded
//! dependencies (weather provider, cache backend) are absorbed where they
//! happen and never surface here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Rejected configuration value, caught at startup
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Rejected request input: bad coordinates, radius, limit, or an
    /// unknown preference value
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// POI dataset could not be read or parsed
    #[error("POI store error: {message}")]
    Store { message: String },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl EngineError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// True for errors caused by the request rather than the service
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(self, EngineError::Validation { .. })
    }

    /// Message safe to return to an API caller. Validation details pass
    /// through verbatim; everything else is summarized without internals.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            EngineError::Validation { message } => format!("Invalid input: {message}"),
            EngineError::Config { .. } => {
                "Service configuration problem. Check the config file and environment overrides."
                    .to_string()
            }
            EngineError::Store { .. } => "POI catalog is unavailable.".to_string(),
            EngineError::Io { .. } => "A file operation failed.".to_string(),
        }
    }
}
