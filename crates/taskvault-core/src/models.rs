//! Domain models for TASKVAULT.
//!
//! These are the core types shared across all crates.

pub mod audit;
pub mod refresh_token;
pub mod task;
pub mod user;
