use std::path::PathBuf;

use kiln_model::ModelError;
use kiln_payload::PayloadError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("invalid command template: {0}")]
    Command(#[from] ModelError),

    #[error("failed to encode test payload for {test}: {source}")]
    Payload {
        test: String,
        #[source]
        source: PayloadError,
    },

    #[error("output {output} is produced by both {first} and {second}")]
    DuplicateOutput {
        output: String,
        first: String,
        second: String,
    },

    #[error("node {node} uses undeclared rule {rule}")]
    UndeclaredRule { node: String, rule: &'static str },

    #[error("dependency cycle through {node}")]
    Cycle { node: String },

    #[error("failed to write build file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, GraphError>;
