//! # ClassConnect Core
//!
//! Foundational types shared by every ClassConnect crate:
//!
//! - [`errors`]: the HTTP-mapped [`AppError`] and the `{"error": ...}` body shape
//! - [`password`]: bcrypt-backed [`PasswordHasher`]
//!
//! # Example
//!
//! ```ignore
//! use classconnect_core::{AppError, PasswordHasher};
//!
//! let hasher = PasswordHasher::default();
//! let digest = hasher.hash("correct horse battery staple")?;
//! assert!(hasher.verify("correct horse battery staple", &digest));
//!
//! let error = AppError::not_found(anyhow::anyhow!("Class not found"));
//! ```

pub mod errors;
pub mod password;

pub use errors::{AppError, ErrorResponse};
pub use password::{HashError, MIN_COST, PasswordHasher};
