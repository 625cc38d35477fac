//! Program loading and evaluation for the fvm binary.

use crate::args::{CliArgs, OutputFormat};
use anyhow::{Context, Result};
use foolish_ast::{Expr, ExprRef};
use foolish_ubc::{Sequencer, SequencerOptions, Snapshot, StepCount, Ubc, UbcOptions};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// JSON report printed by `--format json`.
#[derive(Debug, Serialize)]
pub struct Report {
    pub steps: u64,
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    pub result: Snapshot,
}

/// Read the program named by `args` and render its evaluation.
pub fn run(args: &CliArgs) -> Result<String> {
    let source = if args.reads_stdin() {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("failed to read program from stdin")?;
        source
    } else {
        read_program(&args.program)?
    };
    let program = parse_program(&source)
        .with_context(|| format!("invalid syntax tree in {}", args.program.display()))?;
    evaluate(&program, args)
}

pub fn read_program(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

pub fn parse_program(source: &str) -> Result<ExprRef> {
    let expr: Expr = serde_json::from_str(source).context("failed to parse JSON syntax tree")?;
    Ok(Arc::new(expr))
}

/// Evaluate `program` to completion and render it in the requested format.
pub fn evaluate(program: &ExprRef, args: &CliArgs) -> Result<String> {
    let mut options = UbcOptions {
        trace_steps: args.trace_steps,
        ..UbcOptions::default()
    };
    if let Some(max_steps) = args.max_steps {
        options.max_steps = max_steps;
    }
    debug!(max_steps = options.max_steps, program = %program, "evaluating");

    let mut ubc = Ubc::with_options(options);
    let root = ubc.build(program);
    let StepCount(steps) = ubc.run(root).context("failed to evaluate program")?;
    let is_abstract = ubc.is_abstract(root);
    info!(steps, is_abstract, "evaluation complete");

    match args.format {
        OutputFormat::Text => {
            let options = SequencerOptions {
                tab: args.tab.clone(),
            };
            Ok(Sequencer::with_options(&ubc, options).sequence(root))
        }
        OutputFormat::Json => {
            let report = Report {
                steps,
                is_abstract,
                result: Snapshot::capture(&ubc, root),
            };
            serde_json::to_string_pretty(&report).context("failed to serialize result")
        }
    }
}
