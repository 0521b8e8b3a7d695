//! TaskVault Database — SurrealDB connection management and repository
//! implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types ([`DbError`])
//! - SurrealDB implementations of the `taskvault-core` repository
//!   traits
//!
//! Protected fields are stored decomposed: ciphertext, redacted display
//! form, and (where equality lookup is needed) the deterministic hash
//! land in separate columns. Plaintext PII never reaches this crate.

mod connection;
mod error;
mod schema;

pub mod repository;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};
