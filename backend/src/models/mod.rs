//! Typed objects produced from validated request input.

pub mod user;
