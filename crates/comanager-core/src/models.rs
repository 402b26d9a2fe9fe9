//! Domain models for delegated co-manager access.
//!
//! These are the core types shared across all crates.

pub mod audit;
pub mod delegate;
pub mod owner;
pub mod permission;
