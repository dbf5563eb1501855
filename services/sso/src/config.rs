//! Centralized configuration for the SSO service.
//!
//! All configuration is loaded from environment variables and validated
//! at startup. Nothing here is re-read per request.

use crate::error::AuthError;
use crate::password::{DEFAULT_COST, MAX_COST, MIN_COST};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Longest accepted `REQUEST_TIMEOUT`.
pub const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(3600);

/// Deployment environment. Selects log format and verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Developer machine: human-readable debug logs
    Local,
    /// Shared development: JSON debug logs
    Dev,
    /// Production: JSON info logs
    Prod,
}

impl FromStr for Environment {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            _ => Err(AuthError::config(format!("unknown environment: {s}"))),
        }
    }
}

impl Environment {
    /// Name as written in `ENV`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Dev => "dev",
            Self::Prod => "prod",
        }
    }
}

/// JWT signing algorithm. Only HMAC variants: tokens are signed with the
/// per-application shared secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwtAlgorithm {
    /// HMAC with SHA-256
    HS256,
    /// HMAC with SHA-384
    HS384,
    /// HMAC with SHA-512
    HS512,
}

impl FromStr for JwtAlgorithm {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "HS256" => Ok(Self::HS256),
            "HS384" => Ok(Self::HS384),
            "HS512" => Ok(Self::HS512),
            _ => Err(AuthError::config(format!("Invalid JWT algorithm: {s}"))),
        }
    }
}

impl JwtAlgorithm {
    /// Matching `jsonwebtoken` algorithm.
    #[must_use]
    pub const fn to_jwt(self) -> jsonwebtoken::Algorithm {
        match self {
            Self::HS256 => jsonwebtoken::Algorithm::HS256,
            Self::HS384 => jsonwebtoken::Algorithm::HS384,
            Self::HS512 => jsonwebtoken::Algorithm::HS512,
        }
    }
}

/// SSO service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment environment
    pub env: Environment,
    /// Lifetime of issued tokens
    pub token_ttl: Duration,
    /// Token signing algorithm
    pub jwt_algorithm: JwtAlgorithm,
    /// bcrypt work factor
    pub bcrypt_cost: u32,
    /// Deadline applied to requests that arrive without one
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env: Environment::Local,
            token_ttl: Duration::from_secs(3600),
            jwt_algorithm: JwtAlgorithm::HS256,
            bcrypt_cost: DEFAULT_COST,
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, AuthError> {
        dotenvy::dotenv().ok();

        let env = env::var("ENV")
            .unwrap_or_else(|_| Environment::Local.as_str().to_string())
            .parse()?;
        let token_ttl = Duration::from_secs(parse_env("TOKEN_TTL", 3600)?);
        let jwt_algorithm = env::var("JWT_ALGORITHM")
            .unwrap_or_else(|_| "HS256".to_string())
            .parse()?;
        let bcrypt_cost = parse_env("BCRYPT_COST", DEFAULT_COST)?;
        let request_timeout = Duration::from_secs(parse_env("REQUEST_TIMEOUT", 5)?);

        let config = Self {
            env,
            token_ttl,
            jwt_algorithm,
            bcrypt_cost,
            request_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first violation.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.token_ttl.is_zero() {
            return Err(AuthError::config("TOKEN_TTL must be positive"));
        }
        if !(MIN_COST..=MAX_COST).contains(&self.bcrypt_cost) {
            return Err(AuthError::config(format!(
                "BCRYPT_COST must be between {MIN_COST} and {MAX_COST}, got {}",
                self.bcrypt_cost
            )));
        }
        if self.request_timeout.is_zero() || self.request_timeout > MAX_REQUEST_TIMEOUT {
            return Err(AuthError::config(format!(
                "REQUEST_TIMEOUT must be between 1 and {} seconds",
                MAX_REQUEST_TIMEOUT.as_secs()
            )));
        }
        Ok(())
    }
}

/// Parse environment variable with default value.
fn parse_env<T: FromStr>(name: &str, default: T) -> Result<T, AuthError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|e| AuthError::config(format!("Invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}
