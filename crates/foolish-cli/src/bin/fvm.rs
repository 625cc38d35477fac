use anyhow::Result;
use clap::Parser;
use foolish_cli::{CliArgs, driver, tracing_config};

fn main() -> Result<()> {
    // Initialize tracing if FOOLISH_LOG or RUST_LOG is set.
    tracing_config::init_tracing();

    let args = CliArgs::parse();
    let output = driver::run(&args)?;
    println!("{output}");
    Ok(())
}
