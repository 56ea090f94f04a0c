use std::path::PathBuf;

use thiserror::Error;

use crate::recorder::ScenarioState;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("cannot {operation} a scenario that is {state}")]
    InvalidState {
        operation: &'static str,
        state: ScenarioState,
    },

    #[error("file {file} is not tracked by the scenario")]
    UntrackedFile { file: String },

    #[error("line {line} is out of range for {file} ({lines} lines)")]
    LineOutOfRange {
        file: String,
        line: usize,
        lines: usize,
    },

    #[error("{find:?} does not occur on line {line} of {file}")]
    PatternNotFound {
        file: String,
        line: usize,
        find: String,
    },

    #[error("{path}:{line}: {message}")]
    Script {
        path: String,
        line: usize,
        message: String,
    },

    #[error("failed to read scenario script {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write update test harness {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ScenarioError>;
