//! Incremental-update test scenarios.
//!
//! A [`Scenario`] records a sequence of source edits and return-code
//! assertions against a set of tracked files and renders them as a standalone
//! C program that drives the embeddable compiler through the same updates.
//! Scenarios are usually written as scripts (see [`script`]) and compiled by
//! the `kiln-scenario` binary.

pub mod error;
pub mod recorder;
mod render;
pub mod script;

pub use error::{Result, ScenarioError};
pub use recorder::{Scenario, ScenarioState, SourceLocation, Step};
pub use script::{compile_script, render_script};
