//! Authentication
//!
//! - [`JwtService`] - token issuing and validation
//! - [`CurrentUser`] - the authenticated caller, extracted from the bearer token

pub mod extractor;
pub mod jwt;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
