pub mod claims;
pub mod config;
pub mod engine;
pub mod error;
pub mod extractors;
pub mod guards;
pub mod keystore;
pub mod roles;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testutil;

pub use claims::Claims;
pub use config::JwtConfig;
pub use engine::AuthEngine;
pub use error::{AuthError, AuthResult};
pub use extractors::{basic_credentials, bearer_token, get_claims, set_claims};
pub use guards::{authorized, ensure_role, is_self_or_role, GuardError};
pub use jsonwebtoken::Algorithm;
pub use keystore::{KeyLookup, KeyStore};
pub use roles::{KNOWN_ROLES, ROLE_ADMIN, ROLE_USER};
