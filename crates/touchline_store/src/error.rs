//! The closed error taxonomy every store backend maps into.

use std::io;
use thiserror::Error;
use touchline_model::{EntityId, EntityKind, ValidationError};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors a store operation can fail with.
///
/// The set is closed on purpose: callers match on these variants (or on
/// [`ErrorKind`]) to decide between retrying, surfacing a message, and
/// giving up, and a backend must map whatever its substrate produces
/// into one of them. Absence is never an error; lookups return
/// `None`/`false` instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store has been closed, or was never opened.
    #[error("store is not initialized")]
    NotInitialized,

    /// A create hit an id that is already present.
    #[error("{kind} {id} already exists")]
    AlreadyExists {
        /// Collection of the colliding entity.
        kind: EntityKind,
        /// The id that was already taken.
        id: EntityId,
    },

    /// The entity failed validation and was not written.
    #[error("validation failed: {message}")]
    Validation {
        /// What failed.
        message: String,
    },

    /// The persistence substrate failed.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the failure.
        message: String,
    },

    /// A network-backed operation failed.
    #[error("network error: {message}")]
    Network {
        /// Description of the failure.
        message: String,
        /// Whether retrying the same operation can succeed.
        retryable: bool,
    },

    /// The caller is not authorized for this operation.
    #[error("not authorized: {message}")]
    Auth {
        /// Description of the failure.
        message: String,
    },

    /// The backend does not support this operation.
    #[error("not supported: {message}")]
    NotSupported {
        /// What is unsupported, and by which backend.
        message: String,
    },

    /// The write conflicts with concurrent state.
    #[error("conflict: {message}")]
    Conflict {
        /// Description of the conflict.
        message: String,
    },

    /// The store directory is held by another process.
    #[error("store locked: another process has exclusive access")]
    Locked,
}

impl StoreError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>, retryable: bool) -> Self {
        Self::Network {
            message: message.into(),
            retryable,
        }
    }

    /// Creates a retryable network error.
    pub fn network_retryable(message: impl Into<String>) -> Self {
        Self::network(message, true)
    }

    /// Creates an authorization error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Creates a not-supported error.
    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::NotSupported {
            message: message.into(),
        }
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Whether retrying the failed operation unchanged can succeed.
    ///
    /// Only transient network failures qualify; everything else needs a
    /// different input or a different world first.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { retryable: true, .. })
    }

    /// The class of this error, for callers that match on class.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotInitialized => ErrorKind::NotInitialized,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::Network { .. } => ErrorKind::Network,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::NotSupported { .. } => ErrorKind::NotSupported,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Locked => ErrorKind::Locked,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(err: ValidationError) -> Self {
        Self::Validation {
            message: err.message,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        Self::storage(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::storage(format!("serialization failed: {err}"))
    }
}

/// The class of a [`StoreError`], one discriminant per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// [`StoreError::NotInitialized`].
    NotInitialized,
    /// [`StoreError::AlreadyExists`].
    AlreadyExists,
    /// [`StoreError::Validation`].
    Validation,
    /// [`StoreError::Storage`].
    Storage,
    /// [`StoreError::Network`].
    Network,
    /// [`StoreError::Auth`].
    Auth,
    /// [`StoreError::NotSupported`].
    NotSupported,
    /// [`StoreError::Conflict`].
    Conflict,
    /// [`StoreError::Locked`].
    Locked,
}
