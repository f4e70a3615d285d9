//! Remote-side errors and their mapping into the store taxonomy.

use thiserror::Error;
use touchline_store::StoreError;

/// The one message every offline fast-fail carries.
///
/// Callers and tests match on this string, so it is part of the
/// contract; never reword it.
pub const OFFLINE_MESSAGE: &str = "cloud unavailable: device is offline";

/// Result type for remote API operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors the remote transport can produce.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The device has no connectivity; the transport was not touched.
    #[error("{OFFLINE_MESSAGE}")]
    Offline,

    /// The server answered with a non-success status.
    #[error("http {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Server-provided description.
        message: String,
    },

    /// The caller's credentials were rejected.
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Server-provided description.
        message: String,
    },

    /// The response could not be understood.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl RemoteError {
    /// Creates an HTTP error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Whether retrying the same call can succeed.
    ///
    /// Offline and 5xx responses are transient; everything the server
    /// rejected deliberately is not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Offline => true,
            Self::Http { status, .. } => *status >= 500,
            Self::Unauthorized { .. } | Self::Protocol(_) => false,
        }
    }
}

impl From<RemoteError> for StoreError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Offline => StoreError::network_retryable(OFFLINE_MESSAGE),
            RemoteError::Http { status, message } => match status {
                401 | 403 => StoreError::auth(message),
                409 => StoreError::conflict(message),
                s if s >= 500 => {
                    StoreError::network(format!("http {s}: {message}"), true)
                }
                s => StoreError::validation(format!("http {s}: {message}")),
            },
            RemoteError::Unauthorized { message } => StoreError::auth(message),
            RemoteError::Protocol(message) => {
                StoreError::network(format!("protocol error: {message}"), false)
            }
        }
    }
}
