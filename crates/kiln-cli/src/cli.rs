//! Argument definitions for the kiln binaries.
//!
//! The interfaces are fixed by the build files that invoke them, so none of
//! the binaries accepts options; logging is configured from the environment.

use std::path::PathBuf;

use clap::Parser;

/// Writes `out/<platform><config>/build.ninja` for the host platform.
#[derive(Debug, Parser)]
#[command(name = "kiln-gen", disable_help_flag = true, disable_version_flag = true)]
pub struct GenCli {}

/// Runs one annotated test and checks its output and return code.
#[derive(Debug, Parser)]
#[command(
    name = "kiln-testrun",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct TestRunCli {
    /// Project root; the compiler runs from here.
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Compiler executable, relative to the root unless absolute.
    #[arg(value_name = "COMPILER")]
    pub compiler: PathBuf,

    /// Payload token describing the test.
    #[arg(value_name = "TOKEN", allow_hyphen_values = true)]
    pub token: String,
}

/// Compiles an update scenario script into a C harness.
#[derive(Debug, Parser)]
#[command(
    name = "kiln-scenario",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct ScenarioCli {
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,

    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,
}
