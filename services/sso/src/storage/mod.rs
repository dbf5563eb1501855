//! Collaborator contracts for persistence.
//!
//! The auth core only sees these traits. Every method takes the caller's
//! [`RequestContext`] and may be called from many requests at once, so
//! implementations must be thread-safe.

pub mod memory;

use crate::context::{ContextError, RequestContext};
use secrecy::{ExposeSecret, SecretString};
use std::future::Future;
use thiserror::Error;

pub use memory::{InMemoryApplicationRegistry, InMemoryCredentialStore};

/// Store-assigned user identifier.
pub type UserId = i64;
/// Caller-supplied application identifier.
pub type AppId = i32;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Store-assigned id
    pub id: UserId,
    /// Login key, unique per store
    pub email: String,
    /// Output of the password hasher, never plaintext
    pub password_hash: Vec<u8>,
}

impl User {
    /// Create a user record.
    #[must_use]
    pub fn new(id: UserId, email: impl Into<String>, password_hash: Vec<u8>) -> Self {
        Self {
            id,
            email: email.into(),
            password_hash,
        }
    }
}

/// A client application and its signing secret.
#[derive(Debug)]
pub struct Application {
    /// Application id
    pub id: AppId,
    /// Display name
    pub name: String,
    /// HMAC signing secret; redacted in `Debug`
    pub secret: SecretString,
}

impl Application {
    /// Create an application.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `secret` is empty or `id` is zero.
    pub fn new(
        id: AppId,
        name: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self, crate::AuthError> {
        let secret = secret.into();
        if id == 0 {
            return Err(crate::AuthError::config("application id must be non-zero"));
        }
        if secret.is_empty() {
            return Err(crate::AuthError::config(format!(
                "application {id} has an empty secret"
            )));
        }
        Ok(Self {
            id,
            name: name.into(),
            secret: SecretString::from(secret),
        })
    }
}

impl Clone for Application {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            secret: SecretString::from(self.secret.expose_secret().to_owned()),
        }
    }
}

/// Errors reported by collaborators.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StorageError {
    /// No user with the requested email or id
    #[error("user not found")]
    UserNotFound,

    /// A user with this email already exists
    #[error("user already exists")]
    UserExists,

    /// No application with the requested id
    #[error("application not found")]
    AppNotFound,

    /// The request context finished before the call did
    #[error(transparent)]
    Context(#[from] ContextError),

    /// Backend temporarily unreachable
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl StorageError {
    /// Create an unavailable error with the given message.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Check if this error is transient.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Persists users and answers admin-flag queries.
pub trait CredentialStore: Send + Sync {
    /// Persist a new user and return its id.
    ///
    /// A duplicate email must fail with [`StorageError::UserExists`].
    fn save_user(
        &self,
        ctx: &RequestContext,
        email: &str,
        password_hash: &[u8],
    ) -> impl Future<Output = Result<UserId, StorageError>> + Send;

    /// Look a user up by email.
    ///
    /// An unknown email must fail with [`StorageError::UserNotFound`].
    fn user(
        &self,
        ctx: &RequestContext,
        email: &str,
    ) -> impl Future<Output = Result<User, StorageError>> + Send;

    /// Whether the user holds admin privileges.
    fn is_admin(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
    ) -> impl Future<Output = Result<bool, StorageError>> + Send;
}

/// Resolves application ids to applications.
pub trait ApplicationRegistry: Send + Sync {
    /// Look an application up by id.
    ///
    /// An unknown id must fail with [`StorageError::AppNotFound`].
    fn app(
        &self,
        ctx: &RequestContext,
        app_id: AppId,
    ) -> impl Future<Output = Result<Application, StorageError>> + Send;
}
