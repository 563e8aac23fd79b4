//! Error taxonomy for the runtime bridge.
//!
//! Every failure that originates inside the embedded runtime is rendered to
//! text at the point of detection and carried here as an owned `String`.
//! No variant holds a foreign object.

use thiserror::Error;

/// Stable error codes, prefixed onto messages that cross a process boundary.
pub mod error_codes {
    pub const INIT_ERROR: &str = "INIT_ERROR";
    pub const RESOLUTION_ERROR: &str = "RESOLUTION_ERROR";
    pub const INVOCATION_ERROR: &str = "INVOCATION_ERROR";
    pub const PRECONDITION_ERROR: &str = "PRECONDITION_ERROR";
    pub const INVALID_RESULT: &str = "INVALID_RESULT";
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
}

/// The embedded runtime failed to start.
///
/// Cached for the life of the process and handed back to every later caller,
/// hence `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("embedded runtime failed to initialize: {message}")]
pub struct InitError {
    pub message: String,
}

impl InitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors returned by every bridge operation.
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Init(#[from] InitError),

    /// Module or function could not be found, or is not callable.
    #[error("cannot resolve {module}.{function}: {message}")]
    Resolution {
        module: String,
        function: String,
        message: String,
    },

    /// The callable raised during a detection call. The handle stays usable.
    #[error("{module}.{function} raised: {message}")]
    Invocation {
        module: String,
        function: String,
        message: String,
    },

    /// The caller passed input the bridge refuses to forward.
    #[error("precondition violated: {message}")]
    Precondition { message: String },

    /// The callable returned something other than a sequence of indices.
    #[error("{module}.{function} returned an invalid result: {message}")]
    InvalidResult {
        module: String,
        function: String,
        message: String,
    },
}

impl BridgeError {
    /// Stable code for this error, see [`error_codes`].
    pub fn code(&self) -> &'static str {
        match self {
            Self::Init(_) => error_codes::INIT_ERROR,
            Self::Resolution { .. } => error_codes::RESOLUTION_ERROR,
            Self::Invocation { .. } => error_codes::INVOCATION_ERROR,
            Self::Precondition { .. } => error_codes::PRECONDITION_ERROR,
            Self::InvalidResult { .. } => error_codes::INVALID_RESULT,
        }
    }

    /// Message prefixed with its code, e.g. `[RESOLUTION_ERROR] cannot resolve ...`.
    pub fn coded_message(&self) -> String {
        format!("[{}] {self}", self.code())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }
}

/// Errors loading a [`crate::RuntimeConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {message}")]
    Parse { message: String },
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        error_codes::CONFIG_ERROR
    }
}
