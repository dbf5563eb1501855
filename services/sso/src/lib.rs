//! SSO auth core.
//!
//! Verifies user credentials, issues application-scoped JWTs, registers
//! users and answers admin-privilege queries. Persistence and the RPC
//! listener live outside this crate; they plug in through the
//! [`storage`] traits and the [`grpc`] adapter.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod grpc;
pub mod jwt;
pub mod observability;
pub mod password;
pub mod storage;

/// Generated protobuf types and service stubs.
#[allow(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
pub mod proto {
    /// `sso` API.
    pub mod sso {
        /// `sso.v1` messages and the `Auth` service.
        pub mod v1 {
            tonic::include_proto!("sso.v1");
        }
    }
}

// Re-exports for convenience
pub use auth::AuthService;
pub use config::Config;
pub use context::RequestContext;
pub use error::{AuthError, ErrorKind};
pub use storage::{Application, ApplicationRegistry, CredentialStore, StorageError, User};
