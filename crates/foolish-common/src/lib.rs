//! Common types and constants shared by the Foolish crates.
//!
//! This crate provides foundational pieces used across the syntax tree,
//! the execution core and the command-line driver:
//! - Evaluation limits (`limits`)
//! - Source positions carried by syntax nodes (`position`)

pub mod limits;
pub mod position;

pub use position::SourceLocation;
