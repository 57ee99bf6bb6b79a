//! Error types for assistant-engine

use thiserror::Error;

/// Core library error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Invalid {entity} payload: {source}")]
    Structural {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid {entity} payload: missing field `{field}`")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("Polling task run {task_key}/{run_id} exceeded {attempts} retries")]
    PollTimeout {
        task_key: String,
        run_id: i64,
        attempts: u32,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The service could not be reached or answered with a bad status or body.
    Transport,
    /// A payload decoded fine but lacked a required field.
    Structural,
    /// A task run never left the running state within the retry budget.
    Timeout,
    /// Client configuration was rejected.
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Request(_) | Error::Http { .. } | Error::Transport(_) | Error::Decode(_) => {
                ErrorKind::Transport
            }
            Error::Structural { .. } | Error::MissingField { .. } => ErrorKind::Structural,
            Error::PollTimeout { .. } => ErrorKind::Timeout,
            Error::Config(_) | Error::Io(_) => ErrorKind::Config,
        }
    }

    pub fn is_transport(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    pub fn is_structural(&self) -> bool {
        self.kind() == ErrorKind::Structural
    }

    pub fn is_timeout(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }

    /// Adapter for `map_err` when hydrating `entity` from a JSON value.
    pub fn structural(entity: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| Error::Structural { entity, source }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

/// Result type alias using Error.
pub type Result<T> = std::result::Result<T, Error>;
