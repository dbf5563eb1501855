//! Error types for the auth core.
//!
//! Collaborator failures are wrapped with the name of the operation that hit
//! them so server-side logs stay traceable. What reaches the caller is only
//! the coarse [`ErrorKind`]: internal details are replaced by a correlation
//! id when the error is turned into a gRPC [`Status`].

use crate::context::ContextError;
use crate::jwt::SigningError;
use crate::password::HashError;
use crate::storage::{AppId, StorageError};
use thiserror::Error;
use tonic::{Code, Status};
use uuid::Uuid;

/// Errors returned by [`crate::AuthService`].
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AuthError {
    /// A required request field was empty or zero.
    #[error("{field} is required")]
    MissingField {
        /// Name of the missing field
        field: &'static str,
    },

    /// Unknown email or wrong password. The two causes are never told apart.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Registration hit an email that is already taken.
    #[error("user already exists")]
    UserAlreadyExists,

    /// The application id does not resolve to a registered application.
    #[error("application {app_id} not found")]
    AppNotFound {
        /// Requested application id
        app_id: AppId,
    },

    /// The request context was cancelled or its deadline passed.
    #[error("{op}: {source}")]
    Cancelled {
        /// Operation that was interrupted
        op: &'static str,
        /// Why the context is done
        source: ContextError,
    },

    /// Credential store or application registry failure.
    #[error("{op}: {source}")]
    Storage {
        /// Operation that called the collaborator
        op: &'static str,
        /// Collaborator error, kept unchanged
        source: StorageError,
    },

    /// Password hashing failed.
    #[error("{op}: {source}")]
    Hashing {
        /// Operation that requested the hash
        op: &'static str,
        /// Hasher error
        source: HashError,
    },

    /// Token signing failed.
    #[error("{op}: {source}")]
    Signing {
        /// Operation that requested the token
        op: &'static str,
        /// Signer error
        source: SigningError,
    },

    /// Invalid configuration detected at construction time.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Caller-facing error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or empty input, detected before any collaborator call
    Validation,
    /// Unknown user or wrong password
    InvalidCredentials,
    /// Duplicate registration
    Conflict,
    /// Unknown application id
    Resolution,
    /// Caller cancelled the request
    Cancelled,
    /// Caller deadline passed
    DeadlineExceeded,
    /// Store, registry, hashing, signing or configuration failure
    Internal,
}

impl ErrorKind {
    /// gRPC status code for this kind.
    #[must_use]
    pub const fn grpc_code(&self) -> Code {
        match self {
            Self::Validation => Code::InvalidArgument,
            Self::InvalidCredentials => Code::Unauthenticated,
            Self::Conflict => Code::AlreadyExists,
            Self::Resolution => Code::NotFound,
            Self::Cancelled => Code::Cancelled,
            Self::DeadlineExceeded => Code::DeadlineExceeded,
            Self::Internal => Code::Internal,
        }
    }
}

impl AuthError {
    /// Build a validation error for `field`.
    #[must_use]
    pub const fn missing(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// Build a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Get the caller-facing kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField { .. } => ErrorKind::Validation,
            Self::InvalidCredentials => ErrorKind::InvalidCredentials,
            Self::UserAlreadyExists => ErrorKind::Conflict,
            Self::AppNotFound { .. } => ErrorKind::Resolution,
            Self::Cancelled {
                source: ContextError::Cancelled,
                ..
            } => ErrorKind::Cancelled,
            Self::Cancelled {
                source: ContextError::DeadlineExceeded,
                ..
            } => ErrorKind::DeadlineExceeded,
            Self::Storage { .. } | Self::Hashing { .. } | Self::Signing { .. } | Self::Config(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Check if the caller may retry the operation unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Storage { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Message safe to hand to the caller.
    ///
    /// Internal errors never expose their details.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::InvalidCredentials | ErrorKind::Conflict => {
                self.to_string()
            }
            ErrorKind::Resolution => "application not found".to_string(),
            ErrorKind::Cancelled => "request cancelled".to_string(),
            ErrorKind::DeadlineExceeded => "deadline exceeded".to_string(),
            ErrorKind::Internal => "internal error".to_string(),
        }
    }

    /// Convert to a gRPC status tagged with `correlation_id`.
    #[must_use]
    pub fn to_status(&self, correlation_id: Uuid) -> Status {
        let kind = self.kind();
        let message = format!("{} [correlation_id: {}]", self.public_message(), correlation_id);
        Status::new(kind.grpc_code(), message)
    }
}
