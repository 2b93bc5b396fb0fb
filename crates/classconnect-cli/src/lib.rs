//! # ClassConnect CLI
//!
//! Database seeding utilities for ClassConnect testing and development.
//!
//! The seeder writes through [`classconnect_db::Store`], so it runs against
//! Postgres from the binary and against the in-memory store in tests.
//!
//! ## Usage
//!
//! ```ignore
//! use classconnect_cli::seeder::{SeedConfig, seed_all};
//!
//! let summary = seed_all(&store, &hasher, SeedConfig::default(), Utc::now()).await?;
//! ```

pub mod seeder;
