//! `kiln-testrun ROOT COMPILER TOKEN`: runs one annotated test.

use clap::Parser;
use kiln_cli::cli::TestRunCli;
use kiln_cli::testrun::{EXIT_RUNNER_FAILURE, run};

fn main() {
    // Usage errors must not be mistaken for a return-code mismatch.
    let cli = match TestRunCli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            std::process::exit(EXIT_RUNNER_FAILURE);
        }
    };
    kiln_cli::init_logging_from_env();
    let status = match run(&cli.root, &cli.compiler, &cli.token) {
        Ok(status) => status,
        Err(error) => {
            eprintln!("error: {error:#}");
            EXIT_RUNNER_FAILURE
        }
    };
    std::process::exit(status);
}
