use phishwatch_core::NormalizeError;
use thiserror::Error;

/// Classified failure of a single service operation.
///
/// Every variant renders as a message fit to show next to the operation
/// that produced it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// Input rejected locally; no request was sent.
    #[error("{0}")]
    Validation(String),

    /// The request did not complete (connect failure, timeout, broken body).
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with a non-2xx status.
    #[error("{message} (HTTP {status})")]
    Server { status: u16, message: String },

    /// A 2xx response whose body could not be decoded.
    #[error("could not decode response: {0}")]
    Parse(String),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Network(_) => "network",
            Self::Server { .. } => "server",
            Self::Parse(_) => "parse",
        }
    }
}

impl From<NormalizeError> for ApiError {
    fn from(err: NormalizeError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}
