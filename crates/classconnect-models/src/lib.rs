//! # ClassConnect Models
//!
//! Entities, request/response DTOs and the submission lifecycle for the
//! ClassConnect API.
//!
//! # Modules
//!
//! - [`users`]: accounts, roles and role profiles
//! - [`auth`]: login, registration and reset-token DTOs
//! - [`classes`]: classes, join codes and rosters
//! - [`assignments`]: assignments and partial updates
//! - [`submissions`]: submission states, transitions and views
//! - [`announcements`]: class announcements
//! - [`chat`]: class chat messages

pub mod announcements;
pub mod assignments;
pub mod auth;
pub mod chat;
pub mod classes;
pub mod submissions;
pub mod users;

pub use submissions::{SubmissionStatus, SubmissionView};
pub use users::UserRole;
