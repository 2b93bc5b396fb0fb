//! # ClassConnect DB
//!
//! Persistence for the ClassConnect API.
//!
//! - [`store`]: the store traits services depend on
//! - [`pg`]: the Postgres implementation, pool setup and migrations
//! - [`memory`]: an in-process implementation for tests and local runs
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use classconnect_db::{PgStore, Store, init_db_pool, migrate};
//!
//! let pool = init_db_pool(&database_config).await?;
//! migrate(&pool).await?;
//! let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
//! ```

pub mod error;
pub mod memory;
pub mod pg;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use pg::{PgStore, init_db_pool, migrate};
pub use store::{
    AnnouncementStore, AssignmentStore, ChatStore, ClassStore, ResetTokenStore, Store,
    SubmissionStore, UserStore,
};

pub use sqlx::PgPool;
