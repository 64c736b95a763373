// Error taxonomy for calls against the compute unit API.
//
// Every failure the calling surface can report is one of two kinds: the
// caller got something wrong (token, permissions, request) or the service
// did (5xx, unreachable, malformed reply). Both carry the message shown to
// the user; the CLI boundary prints it and exits non-zero.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Missing/expired/malformed token, forbidden resource, bad request.
    #[error("{0}")]
    Client(String),
    /// Unreachable server, 5xx, or a response that is not JSON.
    #[error("{0}")]
    Server(String),
}

impl ApiError {
    pub fn client(msg: impl Into<String>) -> Self {
        ApiError::Client(msg.into())
    }

    pub fn server(msg: impl Into<String>) -> Self {
        ApiError::Server(msg.into())
    }

    pub fn is_client(&self) -> bool {
        matches!(self, ApiError::Client(_))
    }

    pub fn is_server(&self) -> bool {
        matches!(self, ApiError::Server(_))
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Client(m) | ApiError::Server(m) => m,
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
