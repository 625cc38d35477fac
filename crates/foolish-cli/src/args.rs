use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the fvm binary.
#[derive(Parser, Debug)]
#[command(
    name = "fvm",
    version,
    about = "Evaluate a Foolish syntax tree with the brane computer"
)]
pub struct CliArgs {
    /// JSON syntax tree to evaluate, or `-` to read it from stdin.
    pub program: PathBuf,

    /// Give up after this many root steps.
    #[arg(long = "max-steps")]
    pub max_steps: Option<u64>,

    /// How to print the result.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Indentation unit for text output.
    #[arg(long, default_value = "  ")]
    pub tab: String,

    /// Trace every root step (needs FOOLISH_LOG=trace).
    #[arg(long = "trace-steps")]
    pub trace_steps: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Indented `name = value` rendering.
    Text,
    /// Structural JSON snapshot.
    Json,
}

impl CliArgs {
    pub fn reads_stdin(&self) -> bool {
        self.program.as_os_str() == "-"
    }
}
