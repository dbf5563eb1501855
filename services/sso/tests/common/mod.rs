//! Shared test doubles for the SSO integration tests.
//!
//! Every double counts how often it was entered so tests can assert that
//! validation failures never reach a collaborator.

#![allow(dead_code)]

use sso::context::RequestContext;
use sso::password::{BcryptHasher, HashError, MIN_COST, PasswordHasher};
use sso::storage::{
    AppId, Application, ApplicationRegistry, CredentialStore, InMemoryApplicationRegistry,
    InMemoryCredentialStore, StorageError, User, UserId,
};
use sso::AuthService;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Test application id.
pub const APP_ID: AppId = 7;
/// Test application secret.
pub const APP_SECRET: &str = "s3cret";
/// Token lifetime used by [`service`].
pub const TTL: Duration = Duration::from_secs(3600);

/// How a double answers once entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Delegate to the in-memory implementation
    Normal,
    /// Fail with a retryable backend error
    Unavailable,
    /// Never answer
    Hang,
}

async fn enter(calls: &AtomicUsize, behavior: Behavior) -> Result<(), StorageError> {
    calls.fetch_add(1, Ordering::SeqCst);
    match behavior {
        Behavior::Normal => Ok(()),
        Behavior::Unavailable => Err(StorageError::unavailable("backend offline")),
        Behavior::Hang => std::future::pending().await,
    }
}

/// Credential store double.
#[derive(Debug)]
pub struct TestStore {
    inner: InMemoryCredentialStore,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl TestStore {
    pub fn new() -> Self {
        Self::with_behavior(Behavior::Normal)
    }

    pub fn with_behavior(behavior: Behavior) -> Self {
        Self {
            inner: InMemoryCredentialStore::new(),
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Insert a user directly, bypassing the call counter.
    pub async fn seed(&self, email: &str, password: &str) -> UserId {
        let hash = BcryptHasher::new(MIN_COST).unwrap().hash(password).await.unwrap();
        self.inner
            .save_user(&RequestContext::background(), email, &hash)
            .await
            .unwrap()
    }

    pub async fn set_admin(&self, user_id: UserId, is_admin: bool) {
        self.inner.set_admin(user_id, is_admin).await.unwrap();
    }

    pub async fn len(&self) -> usize {
        self.inner.len().await
    }
}

impl CredentialStore for TestStore {
    async fn save_user(
        &self,
        ctx: &RequestContext,
        email: &str,
        password_hash: &[u8],
    ) -> Result<UserId, StorageError> {
        enter(&self.calls, self.behavior).await?;
        self.inner.save_user(ctx, email, password_hash).await
    }

    async fn user(&self, ctx: &RequestContext, email: &str) -> Result<User, StorageError> {
        enter(&self.calls, self.behavior).await?;
        self.inner.user(ctx, email).await
    }

    async fn is_admin(&self, ctx: &RequestContext, user_id: UserId) -> Result<bool, StorageError> {
        enter(&self.calls, self.behavior).await?;
        self.inner.is_admin(ctx, user_id).await
    }
}

/// Application registry double, preloaded with [`APP_ID`].
#[derive(Debug)]
pub struct TestRegistry {
    inner: InMemoryApplicationRegistry,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl TestRegistry {
    pub async fn new() -> Self {
        Self::with_behavior(Behavior::Normal).await
    }

    pub async fn with_behavior(behavior: Behavior) -> Self {
        let inner = InMemoryApplicationRegistry::new();
        inner
            .register(Application::new(APP_ID, "console", APP_SECRET).unwrap())
            .await;
        Self {
            inner,
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ApplicationRegistry for TestRegistry {
    async fn app(&self, ctx: &RequestContext, app_id: AppId) -> Result<Application, StorageError> {
        enter(&self.calls, self.behavior).await?;
        self.inner.app(ctx, app_id).await
    }
}

/// Cheap bcrypt hasher that counts invocations.
#[derive(Debug, Clone)]
pub struct CountingHasher {
    inner: BcryptHasher,
    calls: Arc<AtomicUsize>,
}

impl CountingHasher {
    pub fn new() -> Self {
        Self {
            inner: BcryptHasher::new(MIN_COST).unwrap(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PasswordHasher for CountingHasher {
    async fn hash(&self, plaintext: &str) -> Result<Vec<u8>, HashError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.hash(plaintext).await
    }

    async fn verify(&self, hash: &[u8], plaintext: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.verify(hash, plaintext).await
    }
}

/// Service wired to the doubles above.
pub struct Harness {
    pub service: AuthService<TestStore, TestRegistry, CountingHasher>,
    pub store: Arc<TestStore>,
    pub registry: Arc<TestRegistry>,
    pub hasher: CountingHasher,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with(TestStore::new(), TestRegistry::new().await)
    }

    pub fn with(store: TestStore, registry: TestRegistry) -> Self {
        let store = Arc::new(store);
        let registry = Arc::new(registry);
        let hasher = CountingHasher::new();
        let service =
            AuthService::with_ttl(Arc::clone(&store), Arc::clone(&registry), hasher.clone(), TTL)
                .unwrap();
        Self {
            service,
            store,
            registry,
            hasher,
        }
    }

    /// Calls made to any collaborator so far.
    pub fn collaborator_calls(&self) -> usize {
        self.store.calls() + self.registry.calls() + self.hasher.calls()
    }
}
