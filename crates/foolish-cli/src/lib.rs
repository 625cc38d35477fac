//! The `fvm` driver: load a syntax tree, evaluate it, report the result.

// Command-line arguments
pub mod args;
pub use args::{CliArgs, OutputFormat};

// Loading and evaluating programs
pub mod driver;

// Tracing subscriber setup (FOOLISH_LOG / FOOLISH_LOG_FORMAT)
pub mod tracing_config;
