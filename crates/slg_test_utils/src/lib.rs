//! # SLG Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Fixture map, catalog and a ready-made [`fixtures::TestWorld`]
//! - Manual clock
//! - Seeded reproducibility harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod strategies;

/// Re-export proptest for convenience.
pub use proptest;
