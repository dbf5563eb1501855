use crate::storage::{AppId, Application, User, UserId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Claims carried by every issued token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject user id
    pub user_id: UserId,
    /// Subject email
    pub email: String,
    /// Application the token is scoped to
    pub app_id: AppId,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
}

impl Claims {
    /// Claims for `user` on `app`, expiring `ttl` from now.
    #[must_use]
    pub fn new(user: &User, app: &Application, ttl: Duration) -> Self {
        Self::issued_at(user, app, ttl, chrono::Utc::now().timestamp())
    }

    /// Claims issued at an explicit instant.
    #[must_use]
    pub fn issued_at(user: &User, app: &Application, ttl: Duration, now: i64) -> Self {
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            user_id: user.id,
            email: user.email.clone(),
            app_id: app.id,
            iat: now,
            exp: now.saturating_add(ttl),
        }
    }
}
