//! Courier error types

use thiserror::Error;

/// Failure classifications detected by courier itself
///
/// Everything else (transport failures, parameter encoders, IO) is carried
/// through [`Error`] unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ErrorKind {
    /// Server answered 400
    #[error("Bad request")]
    BadRequest,
    /// Server answered 401
    #[error("Unauthorized")]
    Unauthorized,
    /// Server answered 403
    #[error("Forbidden")]
    Forbidden,
    /// Server answered 404
    #[error("Resource not found")]
    ResourceNotFound,
    /// Server answered 500
    #[error("Server unavailable")]
    ServerUnavailable,
    /// The environment resolved the endpoint path to something that is not a URL
    #[error("Malformed URL")]
    MalformedUrl,
    /// Response could not be understood, or a 4xx without a dedicated kind
    #[error("Unknown response")]
    UnknownResponse,
    /// Server sent a formatted error payload
    #[error("Formatted error")]
    FormattedError,
}

/// Errors raised while encoding endpoint parameters into a request
#[derive(Debug, Error)]
pub enum EncodingError {
    /// JSON body encoding failed
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
    /// Form/query encoding failed
    #[error("Form encoding error: {0}")]
    Form(#[from] serde_urlencoded::ser::Error),
    /// Error reported by a custom encoder
    #[error("{0}")]
    Custom(String),
}

impl EncodingError {
    /// Build an error for a custom encoder
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}

/// Courier Error
#[derive(Debug, Error)]
pub enum Error {
    /// Classified failure
    #[error(transparent)]
    Kind(#[from] ErrorKind),
    /// Error produced by the HTTP engine, passed through as is
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// Parameter encoding error
    #[error("Parameter encoding error: {0}")]
    Encoding(#[from] EncodingError),
    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
    /// IO error
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Configuration error
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    /// No async runtime was available
    #[error("Runtime unavailable: {0}")]
    Runtime(String),
    /// The producer of a task went away without resolving it
    #[error("Task abandoned before completion")]
    Abandoned,
}

impl Error {
    /// Wrap an HTTP engine error
    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport(Box::new(err))
    }

    /// The classification of this error, if courier produced one
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Kind(kind) => Some(*kind),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::transport(err)
    }
}
