//! Configuration model for editlock.
//!
//! This module defines the `LockConfig` struct that represents the optional
//! `editlock.yaml` file. It supports forward-compatible YAML parsing (unknown
//! fields are ignored), sensible defaults for every field, and validation of
//! config values.

mod model;
mod operations;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export public API
pub use model::LockConfig;
pub use types::FailurePolicy;
