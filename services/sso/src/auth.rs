//! Auth service - ties together credential lookup, password verification,
//! application resolution and token issuance.
//!
//! The service holds no per-request state. Every collaborator call is raced
//! against the caller's [`RequestContext`], and every call runs inside a
//! child of the span given at construction.

use crate::config::Config;
use crate::context::{ContextError, RequestContext};
use crate::error::AuthError;
use crate::jwt::TokenIssuer;
use crate::password::{BcryptHasher, PasswordHasher};
use crate::storage::{AppId, ApplicationRegistry, CredentialStore, StorageError, UserId};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, Span, error, info, info_span, warn};

const LOGIN: &str = "auth.login";
const REGISTER_USER: &str = "auth.register_user";
const IS_ADMIN: &str = "auth.is_admin";

/// Authentication service.
///
/// Provides:
/// - Login: credentials in, application-scoped token out
/// - Registration
/// - Admin-privilege checks
pub struct AuthService<C, A, H = BcryptHasher> {
    store: Arc<C>,
    registry: Arc<A>,
    hasher: H,
    issuer: TokenIssuer,
    log: Span,
}

impl<C, A> AuthService<C, A, BcryptHasher>
where
    C: CredentialStore,
    A: ApplicationRegistry,
{
    /// Build a bcrypt-backed service from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a sub-second TTL or an invalid bcrypt cost.
    pub fn from_config(config: &Config, store: Arc<C>, registry: Arc<A>) -> Result<Self, AuthError> {
        let hasher = BcryptHasher::new(config.bcrypt_cost)?;
        let issuer = TokenIssuer::with_algorithm(config.token_ttl, config.jwt_algorithm)?;
        Ok(Self::new(store, registry, hasher, issuer))
    }
}

impl<C, A, H> AuthService<C, A, H>
where
    C: CredentialStore,
    A: ApplicationRegistry,
    H: PasswordHasher,
{
    /// Create a new auth service.
    pub fn new(store: Arc<C>, registry: Arc<A>, hasher: H, issuer: TokenIssuer) -> Self {
        Self {
            store,
            registry,
            hasher,
            issuer,
            log: info_span!("auth"),
        }
    }

    /// Create a service issuing tokens valid for `token_ttl`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `token_ttl` is under one second.
    pub fn with_ttl(
        store: Arc<C>,
        registry: Arc<A>,
        hasher: H,
        token_ttl: Duration,
    ) -> Result<Self, AuthError> {
        Ok(Self::new(store, registry, hasher, TokenIssuer::new(token_ttl)?))
    }

    /// Parent span for every operation's log output.
    #[must_use]
    pub fn with_log_span(mut self, span: Span) -> Self {
        self.log = span;
        self
    }

    /// Lifetime of issued tokens.
    #[must_use]
    pub const fn token_ttl(&self) -> Duration {
        self.issuer.ttl()
    }

    /// Authenticate `email`/`password` and issue a token scoped to `app_id`.
    ///
    /// An unknown email and a wrong password both yield
    /// [`AuthError::InvalidCredentials`].
    ///
    /// # Errors
    ///
    /// Validation, credential, resolution, cancellation or internal errors.
    pub async fn login(
        &self,
        ctx: &RequestContext,
        email: &str,
        password: &str,
        app_id: AppId,
    ) -> Result<String, AuthError> {
        let span = info_span!(parent: &self.log, "login", op = LOGIN, email = %email, app_id);
        self.login_in_span(ctx, email, password, app_id)
            .instrument(span)
            .await
    }

    async fn login_in_span(
        &self,
        ctx: &RequestContext,
        email: &str,
        password: &str,
        app_id: AppId,
    ) -> Result<String, AuthError> {
        require(email, "email")?;
        require(password, "password")?;
        if app_id == 0 {
            return Err(AuthError::missing("app_id"));
        }

        let user = match call(ctx, self.store.user(ctx, email)).await {
            Ok(user) => user,
            Err(StorageError::UserNotFound) => {
                warn!("user not found");
                return Err(AuthError::InvalidCredentials);
            }
            Err(err) => {
                error!(error = %err, "failed to get user");
                return Err(wrap(LOGIN, err));
            }
        };

        let matched = ctx
            .run(self.hasher.verify(&user.password_hash, password))
            .await
            .map_err(|source| AuthError::Cancelled { op: LOGIN, source })?;
        if !matched {
            warn!(user_id = user.id, "invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let app = match call(ctx, self.registry.app(ctx, app_id)).await {
            Ok(app) => app,
            Err(StorageError::AppNotFound) => {
                error!("application not found");
                return Err(AuthError::AppNotFound { app_id });
            }
            Err(err) => {
                error!(error = %err, "failed to get application");
                return Err(wrap(LOGIN, err));
            }
        };

        let token = self.issuer.issue(&user, &app).map_err(|source| {
            error!(error = %source, "failed to create token");
            AuthError::Signing { op: LOGIN, source }
        })?;

        ctx.check()
            .map_err(|source| AuthError::Cancelled { op: LOGIN, source })?;

        info!(user_id = user.id, "user logged in successfully");
        Ok(token)
    }

    /// Register a new user and return the id the store assigned.
    ///
    /// # Errors
    ///
    /// Validation errors, [`AuthError::UserAlreadyExists`] for a taken email,
    /// cancellation, hashing or store failures.
    pub async fn register_user(
        &self,
        ctx: &RequestContext,
        email: &str,
        password: &str,
    ) -> Result<UserId, AuthError> {
        let span = info_span!(parent: &self.log, "register_user", op = REGISTER_USER, email = %email);
        self.register_in_span(ctx, email, password)
            .instrument(span)
            .await
    }

    async fn register_in_span(
        &self,
        ctx: &RequestContext,
        email: &str,
        password: &str,
    ) -> Result<UserId, AuthError> {
        require(email, "email")?;
        require(password, "password")?;

        let hash = ctx
            .run(self.hasher.hash(password))
            .await
            .map_err(|source| AuthError::Cancelled { op: REGISTER_USER, source })?
            .map_err(|source| {
                error!(error = %source, "failed to hash password");
                AuthError::Hashing { op: REGISTER_USER, source }
            })?;

        let user_id = match call(ctx, self.store.save_user(ctx, email, &hash)).await {
            Ok(id) => id,
            Err(StorageError::UserExists) => {
                warn!("user already exists");
                return Err(AuthError::UserAlreadyExists);
            }
            Err(err) => {
                error!(error = %err, "failed to save user");
                return Err(wrap(REGISTER_USER, err));
            }
        };

        info!(user_id, "user registered");
        Ok(user_id)
    }

    /// Whether `user_id` holds admin privileges, straight from the store.
    ///
    /// # Errors
    ///
    /// Validation error for a zero id; store errors are passed through
    /// wrapped in [`AuthError::Storage`].
    pub async fn is_admin(&self, ctx: &RequestContext, user_id: UserId) -> Result<bool, AuthError> {
        let span = info_span!(parent: &self.log, "is_admin", op = IS_ADMIN, user_id);
        self.is_admin_in_span(ctx, user_id).instrument(span).await
    }

    async fn is_admin_in_span(&self, ctx: &RequestContext, user_id: UserId) -> Result<bool, AuthError> {
        if user_id == 0 {
            return Err(AuthError::missing("user_id"));
        }

        let is_admin = call(ctx, self.store.is_admin(ctx, user_id))
            .await
            .map_err(|err| {
                error!(error = %err, "failed to check admin status");
                wrap(IS_ADMIN, err)
            })?;

        info!(is_admin, "checked if user is admin");
        Ok(is_admin)
    }
}

impl<C, A, H> std::fmt::Debug for AuthService<C, A, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

fn require(value: &str, field: &'static str) -> Result<(), AuthError> {
    if value.is_empty() {
        return Err(AuthError::missing(field));
    }
    Ok(())
}

/// Run a collaborator call under `ctx`, folding context expiry into the
/// collaborator's own error type.
async fn call<T, F>(ctx: &RequestContext, fut: F) -> Result<T, StorageError>
where
    F: Future<Output = Result<T, StorageError>>,
{
    ctx.run(fut).await?
}

fn wrap(op: &'static str, err: StorageError) -> AuthError {
    match err {
        StorageError::Context(source) => AuthError::Cancelled { op, source },
        source => AuthError::Storage { op, source },
    }
}
