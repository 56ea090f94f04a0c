//! `kiln-scenario SCRIPT OUTPUT`: compiles an update scenario into C.

use clap::Parser;
use kiln_cli::cli::ScenarioCli;
use kiln_scenario::compile_script;

fn main() {
    let cli = ScenarioCli::parse();
    kiln_cli::init_logging_from_env();
    if let Err(error) = compile_script(&cli.script, &cli.output) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
