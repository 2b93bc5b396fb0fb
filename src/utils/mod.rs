//! Shared helpers for the HTTP layer.
//!
//! - [`email`]: reset and verification mail over SMTP
//! - [`tokens`]: random reset tokens and class codes

pub mod email;
pub mod tokens;
