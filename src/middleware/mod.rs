//! Request gates.
//!
//! - [`auth`]: bearer verification and the [`auth::AuthUser`] extractor
//! - [`role`]: role allow-lists applied as route layers
//!
//! # Flow
//!
//! 1. Client sends `Authorization: Bearer <token>`
//! 2. [`auth::require_auth`] verifies it and stores an `AuthContext` in the
//!    request extensions, or answers 401
//! 3. [`role::require_teacher`] / [`role::require_student`] compare the
//!    role against the route's allow-list, or answer 403
//! 4. The handler reads the context through [`auth::AuthUser`]
//!
//! ```ignore
//! Router::new()
//!     .route(
//!         "/",
//!         post(create_class).route_layer(from_fn_with_state(state.clone(), require_teacher)),
//!     )
//!     .route_layer(from_fn_with_state(state.clone(), require_auth));
//! ```

pub mod auth;
pub mod role;
