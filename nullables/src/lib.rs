//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies of the spine (wall clock, append guards) sit behind
//! traits. This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod policy;

pub use clock::NullClock;
pub use policy::DenyTypes;
