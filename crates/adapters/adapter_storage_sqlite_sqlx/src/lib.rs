//! # gasguard-adapter-storage-sqlite-sqlx
//!
//! `SQLite` caller registry using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement [`IdentityResolver`](gasguard_app::ports::IdentityResolver)
//!   and [`CallerRegistry`](gasguard_app::ports::CallerRegistry) on top of a
//!   `caller_devices` table
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Keep registration order so the first device of a caller is stable
//!
//! ## Dependency rule
//! Depends on `gasguard-app` (for port traits) and `gasguard-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod caller_registry;
pub mod error;
pub mod pool;

pub use caller_registry::SqliteCallerRegistry;
pub use error::StorageError;
pub use pool::{Config, Database};
