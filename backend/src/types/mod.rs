//! Shared strongly-typed identifiers.

pub mod id;

pub use id::*;
