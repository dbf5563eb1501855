//! gRPC adapter for the `sso.v1.Auth` service.
//!
//! Builds the [`RequestContext`] from the caller's deadline, delegates to
//! [`AuthService`] and maps [`AuthError`] onto [`Status`]. Field checks stay
//! in [`AuthService`]; this layer never second-guesses them.
//!
//! Requests carry plaintext passwords and are never logged whole.

pub mod timeout;

pub use crate::proto::sso::v1::auth_server::{Auth, AuthServer};
pub use crate::proto::sso::v1::{
    IsAdminRequest, IsAdminResponse, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
};

use crate::auth::AuthService;
use crate::context::RequestContext;
use crate::error::{AuthError, ErrorKind};
use crate::password::{BcryptHasher, PasswordHasher};
use crate::storage::{ApplicationRegistry, CredentialStore};
use std::sync::Arc;
use std::time::Duration;
use tonic::{Request, Response, Status};
use tracing::{error, warn};
use uuid::Uuid;

/// `sso.v1.Auth` implementation over a shared [`AuthService`].
pub struct AuthGrpc<C, A, H = BcryptHasher> {
    auth: Arc<AuthService<C, A, H>>,
    default_timeout: Duration,
}

impl<C, A, H> Clone for AuthGrpc<C, A, H> {
    fn clone(&self) -> Self {
        Self {
            auth: Arc::clone(&self.auth),
            default_timeout: self.default_timeout,
        }
    }
}

impl<C, A, H> AuthGrpc<C, A, H>
where
    C: CredentialStore + 'static,
    A: ApplicationRegistry + 'static,
    H: PasswordHasher + 'static,
{
    /// Create the service. `default_timeout` applies to requests that carry
    /// no `grpc-timeout` header.
    pub const fn new(auth: Arc<AuthService<C, A, H>>, default_timeout: Duration) -> Self {
        Self {
            auth,
            default_timeout,
        }
    }

    /// Wrap in the generated server, ready for
    /// `tonic::transport::Server::add_service`.
    #[must_use]
    pub fn into_server(self) -> AuthServer<Self> {
        AuthServer::new(self)
    }

    fn context<T>(&self, request: &Request<T>) -> RequestContext {
        let timeout = timeout::request_timeout(request.metadata()).unwrap_or(self.default_timeout);
        RequestContext::with_timeout(timeout)
    }
}

#[tonic::async_trait]
impl<C, A, H> Auth for AuthGrpc<C, A, H>
where
    C: CredentialStore + 'static,
    A: ApplicationRegistry + 'static,
    H: PasswordHasher + 'static,
{
    async fn login(&self, request: Request<LoginRequest>) -> Result<Response<LoginResponse>, Status> {
        let ctx = self.context(&request);
        let req = request.into_inner();

        let token = self
            .auth
            .login(&ctx, &req.email, &req.password, req.app_id)
            .await
            .map_err(into_status)?;

        Ok(Response::new(LoginResponse { token }))
    }

    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<RegisterResponse>, Status> {
        let ctx = self.context(&request);
        let req = request.into_inner();

        let user_id = self
            .auth
            .register_user(&ctx, &req.email, &req.password)
            .await
            .map_err(into_status)?;

        Ok(Response::new(RegisterResponse { user_id }))
    }

    async fn is_admin(
        &self,
        request: Request<IsAdminRequest>,
    ) -> Result<Response<IsAdminResponse>, Status> {
        let ctx = self.context(&request);
        let req = request.into_inner();

        let is_admin = self
            .auth
            .is_admin(&ctx, req.user_id)
            .await
            .map_err(into_status)?;

        Ok(Response::new(IsAdminResponse { is_admin }))
    }
}

impl<C, A, H> std::fmt::Debug for AuthGrpc<C, A, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGrpc")
            .field("default_timeout", &self.default_timeout)
            .finish_non_exhaustive()
    }
}

/// Convert a service error to a status, logging internal failures under
/// the correlation id the caller will see.
fn into_status(err: AuthError) -> Status {
    let correlation_id = Uuid::new_v4();
    match err.kind() {
        ErrorKind::Internal => {
            error!(%correlation_id, error = %err, retryable = err.is_retryable(), "request failed");
        }
        ErrorKind::Cancelled | ErrorKind::DeadlineExceeded => {
            warn!(%correlation_id, error = %err, "request abandoned");
        }
        _ => {}
    }
    err.to_status(correlation_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryApplicationRegistry, InMemoryCredentialStore, StorageError};
    use tonic::Code;
    use tonic::server::NamedService;

    type Grpc = AuthGrpc<InMemoryCredentialStore, InMemoryApplicationRegistry>;

    fn handlers(default_timeout: Duration) -> Grpc {
        let auth = AuthService::with_ttl(
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(InMemoryApplicationRegistry::new()),
            BcryptHasher::new(4).unwrap(),
            Duration::from_secs(60),
        )
        .unwrap();
        AuthGrpc::new(Arc::new(auth), default_timeout)
    }

    #[test]
    fn test_into_status_hides_internal_detail() {
        let status = into_status(AuthError::Storage {
            op: "auth.login",
            source: StorageError::unavailable("db-primary:5432 refused"),
        });

        assert_eq!(status.code(), Code::Internal);
        assert!(status.message().starts_with("internal error [correlation_id: "));
        assert!(!status.message().contains("db-primary"));
    }

    #[test]
    fn test_server_is_mountable() {
        assert_eq!(<AuthServer<Grpc> as NamedService>::NAME, "sso.v1.Auth");
        let _server = handlers(Duration::from_secs(5)).into_server();
    }

    #[tokio::test]
    async fn test_context_uses_caller_timeout() {
        let grpc = handlers(Duration::from_secs(5));
        let mut request = Request::new(IsAdminRequest { user_id: 1 });
        request
            .metadata_mut()
            .insert(timeout::GRPC_TIMEOUT_HEADER, "100m".parse().unwrap());

        let deadline = grpc.context(&request).deadline().unwrap();
        let left = deadline - tokio::time::Instant::now();
        assert!(left <= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_context_falls_back_to_default() {
        let grpc = handlers(Duration::from_secs(5));
        let request = Request::new(IsAdminRequest { user_id: 1 });

        let deadline = grpc.context(&request).deadline().unwrap();
        let left = deadline - tokio::time::Instant::now();
        assert!(left > Duration::from_secs(4));
        assert!(left <= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_unbounded_default_timeout_does_not_panic() {
        let grpc = handlers(Duration::MAX);
        let request = Request::new(IsAdminRequest { user_id: 1 });
        assert_eq!(grpc.context(&request).deadline(), None);

        let status = grpc.is_admin(request).await.unwrap_err();
        assert_eq!(status.code(), Code::Internal);
    }

    #[tokio::test]
    async fn test_register_then_login_unknown_app() {
        let grpc = handlers(Duration::from_secs(5));

        let registered = grpc
            .register(Request::new(RegisterRequest {
                email: "alice@example.com".to_string(),
                password: "correct-pass".to_string(),
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(registered.user_id, 1);

        let status = grpc
            .login(Request::new(LoginRequest {
                email: "alice@example.com".to_string(),
                password: "correct-pass".to_string(),
                app_id: 7,
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::NotFound);
    }
}
