//! Build-file generation for every configuration of the host platform.

use std::path::PathBuf;

use anyhow::{Context, Result};
use kiln_graph::{GraphBuilder, RuleKind, ShellStyle, ToolPaths, write_ninja};
use kiln_model::{BuildType, Platform};
use tracing::{debug, info, warn};

use crate::layout::ProjectLayout;

pub const BUILD_FILE: &str = "build.ninja";

/// One written build file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCell {
    pub platform: Platform,
    pub build_type: BuildType,
    pub path: PathBuf,
    pub nodes: usize,
    pub tests: usize,
    pub scenarios: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub cells: Vec<GeneratedCell>,
    pub disabled_tests: Vec<String>,
}

/// Writes `out/<p><c>/build.ninja` for each build type of `host`.
///
/// An unsupported host (`None`) writes nothing and is not an error.
pub fn generate(
    layout: &ProjectLayout,
    tools: &ToolPaths,
    host: Option<Platform>,
) -> Result<GenerationReport> {
    let Some(platform) = host else {
        debug!(os = std::env::consts::OS, "unsupported host, no build files written");
        return Ok(GenerationReport::default());
    };

    let tests = kiln_inventory::scan_tests(&layout.root).context("failed to scan tests")?;
    let scenarios = kiln_inventory::discover_scenarios(&layout.root)
        .context("failed to discover update scenarios")?;
    let disabled_tests: Vec<String> = tests
        .values()
        .filter(|record| !record.enabled)
        .map(|record| record.path.clone())
        .collect();
    for path in &disabled_tests {
        warn!(test = %path, "test is disabled");
    }

    let shell = ShellStyle::for_platform(platform);
    let mut cells = Vec::new();
    for build_type in BuildType::ALL {
        let graph = GraphBuilder::new(platform, build_type, tools)
            .build(&tests, &scenarios)
            .with_context(|| format!("failed to build the {platform} {build_type} graph"))?;

        let dir = layout.build_dir(platform, build_type);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let path = dir.join(BUILD_FILE);
        write_ninja(&path, &graph, shell)?;
        info!(path = %path.display(), "wrote build file");

        cells.push(GeneratedCell {
            platform,
            build_type,
            path,
            nodes: graph.nodes.len(),
            tests: graph.nodes_of(RuleKind::RunTest).count(),
            scenarios: graph.nodes_of(RuleKind::RunGeneratedBinary).count(),
        });
    }

    Ok(GenerationReport {
        cells,
        disabled_tests,
    })
}
