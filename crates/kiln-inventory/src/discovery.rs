//! Test source discovery under the project's `test/` directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use kiln_model::AnnotatedTest;
use tracing::{debug, warn};

use crate::directives::parse_annotations;
use crate::error::{InventoryError, Result};

/// Directory holding test sources, relative to the project root.
pub const TEST_DIR: &str = "test";

const SCENARIO_PREFIX: &str = "update_";
const SCENARIO_EXTENSION: &str = "scenario";

/// Lists file names in `dir` accepted by `keep`, sorted.
fn list_files(dir: &Path, keep: impl Fn(&str) -> bool) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(InventoryError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| InventoryError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut names = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| InventoryError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            warn!(path = %path.display(), "skipping test file with non UTF-8 name");
            continue;
        };
        if keep(name) {
            names.push(name.to_string());
        }
    }

    names.sort();
    Ok(names)
}

fn has_extension(name: &str, extension: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == extension)
}

/// Lists `test/*.c` as project-relative paths with `/` separators.
pub fn list_test_sources(root: &Path) -> Result<Vec<String>> {
    let names = list_files(&root.join(TEST_DIR), |name| has_extension(name, "c"))?;
    Ok(names
        .into_iter()
        .map(|name| format!("{TEST_DIR}/{name}"))
        .collect())
}

/// Scans every `test/*.c` for directives.
///
/// Disabled tests are included with `enabled == false`; callers decide
/// whether to drop them.
pub fn scan_tests(root: &Path) -> Result<BTreeMap<String, AnnotatedTest>> {
    let mut tests = BTreeMap::new();
    for relative in list_test_sources(root)? {
        let path: PathBuf = root.join(&relative);
        let bytes = std::fs::read(&path).map_err(|e| InventoryError::FileRead {
            path: path.clone(),
            source: e,
        })?;
        // Test sources may deliberately contain invalid UTF-8; directives are ASCII.
        let source = String::from_utf8_lossy(&bytes);
        let record = parse_annotations(&relative, &source);
        debug!(
            test = %relative,
            enabled = record.enabled,
            expected_return_code = record.expected_return_code,
            checks_output = record.checks_output(),
            "scanned test"
        );
        tests.insert(relative, record);
    }
    Ok(tests)
}

/// Lists `test/update_*.scenario` scripts as project-relative paths.
pub fn discover_scenarios(root: &Path) -> Result<Vec<String>> {
    let names = list_files(&root.join(TEST_DIR), |name| {
        name.starts_with(SCENARIO_PREFIX) && has_extension(name, SCENARIO_EXTENSION)
    })?;
    Ok(names
        .into_iter()
        .map(|name| format!("{TEST_DIR}/{name}"))
        .collect())
}
