//! # ClassConnect Auth
//!
//! Stateless access tokens and the request gate built on them.
//!
//! - [`claims`]: the signed payload (`userId`, `email`, `role`, `exp`)
//! - [`token`]: HS256 issuance and verification against [`JwtConfig`]
//! - [`access`]: bearer header parsing, [`AuthContext`] and role checks
//!
//! There is no revocation list: a token stays valid for its whole TTL and
//! logout is the client discarding it.
//!
//! # Example
//!
//! ```ignore
//! use chrono::Utc;
//! use classconnect_auth::{issue, verify};
//!
//! let token = issue(user.id, &user.email, user.role, Utc::now(), &jwt_config)?;
//! let claims = verify(&token, Utc::now(), &jwt_config)?;
//! ```
//!
//! [`JwtConfig`]: classconnect_config::JwtConfig

pub mod access;
pub mod claims;
pub mod token;

pub use access::{AccessError, AuthContext, authenticate, bearer_token, check_role, parse_bearer};
pub use claims::Claims;
pub use token::{TokenError, issue, verify};
