//! In-memory collaborators for development and tests.

use super::{AppId, Application, ApplicationRegistry, CredentialStore, StorageError, User, UserId};
use crate::context::RequestContext;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct UserRecord {
    user: User,
    is_admin: bool,
}

/// Credential store backed by a map keyed on email.
#[derive(Debug)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<String, UserRecord>>,
    next_id: AtomicI64,
}

impl InMemoryCredentialStore {
    /// Create an empty store. Ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Set or clear the admin flag of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UserNotFound`] for an unknown id.
    pub async fn set_admin(&self, user_id: UserId, is_admin: bool) -> Result<(), StorageError> {
        let mut users = self.users.write().await;
        let record = users
            .values_mut()
            .find(|r| r.user.id == user_id)
            .ok_or(StorageError::UserNotFound)?;
        record.is_admin = is_admin;
        Ok(())
    }

    /// Number of stored users.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Whether the store has no users.
    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    async fn save_user(
        &self,
        ctx: &RequestContext,
        email: &str,
        password_hash: &[u8],
    ) -> Result<UserId, StorageError> {
        ctx.check()?;

        let mut users = self.users.write().await;
        if users.contains_key(email) {
            return Err(StorageError::UserExists);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let user = User::new(id, email, password_hash.to_vec());
        users.insert(
            email.to_owned(),
            UserRecord {
                user,
                is_admin: false,
            },
        );
        Ok(id)
    }

    async fn user(&self, ctx: &RequestContext, email: &str) -> Result<User, StorageError> {
        ctx.check()?;

        self.users
            .read()
            .await
            .get(email)
            .map(|r| r.user.clone())
            .ok_or(StorageError::UserNotFound)
    }

    async fn is_admin(&self, ctx: &RequestContext, user_id: UserId) -> Result<bool, StorageError> {
        ctx.check()?;

        self.users
            .read()
            .await
            .values()
            .find(|r| r.user.id == user_id)
            .map(|r| r.is_admin)
            .ok_or(StorageError::UserNotFound)
    }
}

/// Application registry backed by a map keyed on id.
#[derive(Debug, Default)]
pub struct InMemoryApplicationRegistry {
    apps: RwLock<HashMap<AppId, Application>>,
}

impl InMemoryApplicationRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `app`, replacing any application with the same id.
    ///
    /// Replacing an application rotates its secret: it stays the only
    /// active one.
    pub async fn register(&self, app: Application) {
        self.apps.write().await.insert(app.id, app);
    }
}

impl ApplicationRegistry for InMemoryApplicationRegistry {
    async fn app(&self, ctx: &RequestContext, app_id: AppId) -> Result<Application, StorageError> {
        ctx.check()?;

        self.apps
            .read()
            .await
            .get(&app_id)
            .cloned()
            .ok_or(StorageError::AppNotFound)
    }
}
