//! # Duel Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Roster fixtures
//! - Determinism test harness
//! - Head-to-head win-rate helpers
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod balance;
pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
