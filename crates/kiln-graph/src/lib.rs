//! Build graph generation.
//!
//! - [`matrix`]: static per-(platform, build type) command table
//! - [`graph`]: backend-agnostic build graph with validation and reachability
//! - [`builder`]: assembles the full graph for one configuration
//! - [`ninja`]: renders a graph as a Ninja manifest

pub mod builder;
pub mod error;
pub mod graph;
pub mod matrix;
pub mod ninja;

pub use builder::{GraphBuilder, ToolPaths, out_dir_name};
pub use error::{GraphError, Result};
pub use graph::{BuildGraph, BuildNode, DiscoveredDeps, GraphPath, Rule, RuleKind};
pub use matrix::{CommandSet, CommandTemplates, ConfigMatrix, PlatformSettings};
pub use ninja::{ShellStyle, render_ninja, write_ninja};
