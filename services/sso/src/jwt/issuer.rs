//! Token signing.
//!
//! Tokens are HMAC-signed with the secret of the application they are scoped
//! to. Validation belongs to whoever holds the same secret; nothing here
//! decodes tokens.

use crate::config::JwtAlgorithm;
use crate::error::AuthError;
use crate::jwt::claims::Claims;
use crate::storage::{Application, User};
use jsonwebtoken::{EncodingKey, Header, encode};
use secrecy::ExposeSecret;
use std::time::Duration;
use thiserror::Error;

/// Token signing failure.
#[derive(Error, Debug)]
pub enum SigningError {
    /// The application has no usable secret
    #[error("application {app_id} has an empty signing secret")]
    EmptySecret {
        /// Application whose secret is empty
        app_id: crate::storage::AppId,
    },

    /// JWT encoding failed
    #[error("JWT encoding error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Issue an HS256 token for `user` on `app`, valid for `ttl`.
///
/// # Errors
///
/// Returns [`SigningError`] if the secret is empty or encoding fails.
pub fn new_token(user: &User, app: &Application, ttl: Duration) -> Result<String, SigningError> {
    sign(&Claims::new(user, app, ttl), app, JwtAlgorithm::HS256)
}

fn sign(claims: &Claims, app: &Application, algorithm: JwtAlgorithm) -> Result<String, SigningError> {
    let secret = app.secret.expose_secret();
    if secret.is_empty() {
        return Err(SigningError::EmptySecret { app_id: app.id });
    }

    let header = Header::new(algorithm.to_jwt());
    let key = EncodingKey::from_secret(secret.as_bytes());
    Ok(encode(&header, claims, &key)?)
}

/// Shortest lifetime a token can carry.
pub const MIN_TTL: Duration = Duration::from_secs(1);

/// Issues tokens with a fixed lifetime and algorithm.
#[derive(Debug, Clone, Copy)]
pub struct TokenIssuer {
    ttl: Duration,
    algorithm: JwtAlgorithm,
}

impl TokenIssuer {
    /// Create an HS256 issuer.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `ttl` is under one second.
    pub fn new(ttl: Duration) -> Result<Self, AuthError> {
        Self::with_algorithm(ttl, JwtAlgorithm::HS256)
    }

    /// Create an issuer using `algorithm`.
    ///
    /// Claims carry whole seconds, so the TTL must be at least one.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `ttl` is under one second.
    pub fn with_algorithm(ttl: Duration, algorithm: JwtAlgorithm) -> Result<Self, AuthError> {
        if ttl < MIN_TTL {
            return Err(AuthError::config("token TTL must be at least one second"));
        }
        Ok(Self { ttl, algorithm })
    }

    /// Configured token lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Configured signing algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> JwtAlgorithm {
        self.algorithm
    }

    /// Sign a token for `user` scoped to `app`.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] if the secret is empty or encoding fails.
    pub fn issue(&self, user: &User, app: &Application) -> Result<String, SigningError> {
        sign(&Claims::new(user, app, self.ttl), app, self.algorithm)
    }
}
