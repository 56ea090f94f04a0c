//! Project directory layout.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use kiln_graph::ToolPaths;
use kiln_model::{BuildType, Platform};

/// File whose presence under `src/` marks the project root.
pub const ROOT_MARKER: &str = "codegen.in.c";
pub const SOURCE_DIR: &str = "src";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Walks up from `start` to the first directory containing
    /// `src/codegen.in.c`.
    pub fn discover(start: &Path) -> Result<Self> {
        for dir in start.ancestors() {
            if dir.join(SOURCE_DIR).join(ROOT_MARKER).is_file() {
                return Ok(Self::new(dir));
            }
        }
        bail!(
            "no {SOURCE_DIR}/{ROOT_MARKER} found in {} or any parent directory",
            start.display()
        )
    }

    pub fn source_dir(&self) -> PathBuf {
        self.root.join(SOURCE_DIR)
    }

    /// Directory holding one configuration's build file, e.g. `out/ld`.
    pub fn build_dir(&self, platform: Platform, build_type: BuildType) -> PathBuf {
        self.root.join(kiln_graph::out_dir_name(platform, build_type))
    }
}

/// Kiln executables installed next to `exe`, the running binary.
pub fn sibling_tools(exe: &Path, platform: Platform) -> ToolPaths {
    let dir = exe.parent().unwrap_or_else(|| Path::new("."));
    let settings = kiln_graph::ConfigMatrix::settings(platform);
    let tool = |stem: &str| {
        dir.join(settings.executable(stem))
            .to_string_lossy()
            .into_owned()
    };
    ToolPaths {
        test_runner: tool("kiln-testrun"),
        scenario_compiler: tool("kiln-scenario"),
        generator: tool("kiln-gen"),
    }
}
