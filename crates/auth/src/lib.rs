//! `eduhub-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it validates
//! tokens into a [`Principal`] and answers role/ownership questions about it.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, authorize_course_mutation, can_manage_course, require_role};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator};
pub use principal::Principal;
pub use roles::Role;
