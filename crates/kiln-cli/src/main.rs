//! `kiln-gen`: writes the build files for the host platform.

use anyhow::{Context, Result};
use clap::Parser;
use kiln_cli::cli::GenCli;
use kiln_cli::generate::generate;
use kiln_cli::layout::{ProjectLayout, sibling_tools};
use kiln_cli::summary::print_summary;
use kiln_model::Platform;

fn run() -> Result<()> {
    let cwd = std::env::current_dir().context("failed to read the working directory")?;
    let layout = ProjectLayout::discover(&cwd)?;
    let exe = std::env::current_exe().context("failed to locate the kiln-gen executable")?;
    let host = Platform::host();
    let tools = sibling_tools(&exe, host.unwrap_or(Platform::Linux));
    let report = generate(&layout, &tools, host)?;
    print_summary(&report);
    Ok(())
}

fn main() {
    let _cli = GenCli::parse();
    kiln_cli::init_logging_from_env();
    if let Err(error) = run() {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}
