//! Application-scoped JWT issuance.

pub mod claims;
pub mod issuer;

pub use claims::Claims;
pub use issuer::{SigningError, TokenIssuer, new_token};
