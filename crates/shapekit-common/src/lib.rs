//! Common types and utilities for the shapekit runtime type checker.
//!
//! This crate provides foundational pieces used across the shapekit crates:
//! - String interning (`Atom`, `ShardedInterner`)
//! - Centralized limits and thresholds

// String interning for key and class-name deduplication
pub mod interner;
pub use interner::{Atom, ShardedInterner};

// Centralized limits and thresholds
pub mod limits;
