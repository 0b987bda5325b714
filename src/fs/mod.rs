//! Filesystem primitives for the shared lock file.
//!
//! Every mutation of the lock file goes through one of these functions:
//! atomic replace, exclusive create, idempotent remove, or quarantine.

pub mod atomic;

pub use atomic::{atomic_write, create_exclusive, quarantine, read_optional, remove_if_exists};
