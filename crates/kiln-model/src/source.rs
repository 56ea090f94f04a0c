//! Compiler source units and their link/bundle order.

use serde::{Deserialize, Serialize};

/// Core translation units of the compiler, in translation order.
///
/// The order matters for the amalgamated build: `type.c` defines statically
/// initialized type tables that later units reference and cannot forward
/// declare.
pub const CORE_SOURCES: &[&str] = &[
    "type.c",
    "alloc.c",
    "entry.c",
    "hashmap.c",
    "link.c",
    "main.c",
    "parse.c",
    "preprocess.c",
    "tokenize.c",
    "unicode.c",
    "util.c",
];

/// The command-line entry unit is linked into the compiler but not bundled.
const ENTRY_SOURCE: &str = "entry.c";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceRole {
    Core,
    /// Output of the platform code generator. Must be translated before any
    /// unit of the same link target that references its tables.
    Generated,
    Test,
    Harness,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnit {
    pub path: String,
    pub role: SourceRole,
    /// Whether the unit is part of the amalgamated embeddable source.
    pub bundled: bool,
}

impl SourceUnit {
    pub fn core(path: impl Into<String>) -> Self {
        let path = path.into();
        let bundled = path != ENTRY_SOURCE;
        Self {
            path,
            role: SourceRole::Core,
            bundled,
        }
    }

    pub fn generated(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            role: SourceRole::Generated,
            bundled: true,
        }
    }

    pub fn is_ordering_sensitive(&self) -> bool {
        self.role == SourceRole::Generated
    }

    /// File stem used to name the unit's object file.
    pub fn stem(&self) -> &str {
        let name = self.path.rsplit('/').next().unwrap_or(&self.path);
        name.rsplit_once('.').map_or(name, |(stem, _)| stem)
    }
}

/// The core units in manifest order.
pub fn core_units() -> Vec<SourceUnit> {
    CORE_SOURCES.iter().copied().map(SourceUnit::core).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_unit_is_not_bundled() {
        let units = core_units();
        let unbundled: Vec<&str> = units
            .iter()
            .filter(|u| !u.bundled)
            .map(|u| u.path.as_str())
            .collect();
        assert_eq!(unbundled, vec!["entry.c"]);
    }

    #[test]
    fn stem_strips_directory_and_extension() {
        assert_eq!(SourceUnit::core("type.c").stem(), "type");
        assert_eq!(SourceUnit::generated("codegen.l.c").stem(), "codegen.l");
        assert_eq!(SourceUnit::core("embed/libdyibicc.c").stem(), "libdyibicc");
    }

    #[test]
    fn only_generated_units_are_ordering_sensitive() {
        assert!(SourceUnit::generated("codegen.w.c").is_ordering_sensitive());
        assert!(!SourceUnit::core("parse.c").is_ordering_sensitive());
    }
}
