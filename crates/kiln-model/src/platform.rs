//! Host platform families and build configurations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Host platform family a build graph targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Linux,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Windows, Platform::Linux];

    /// Single-letter code used in output directory and file names.
    pub fn code(self) -> &'static str {
        match self {
            Platform::Windows => "w",
            Platform::Linux => "l",
        }
    }

    /// Maps an operating system identifier (as in `std::env::consts::OS`)
    /// to a supported platform family.
    pub fn from_os_id(os: &str) -> Option<Self> {
        match os {
            "windows" => Some(Platform::Windows),
            "linux" => Some(Platform::Linux),
            _ => None,
        }
    }

    /// Platform of the running host, if supported.
    pub fn host() -> Option<Self> {
        Self::from_os_id(std::env::consts::OS)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Windows => f.write_str("windows"),
            Platform::Linux => f.write_str("linux"),
        }
    }
}

/// Build configuration axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    Release,
    Debug,
    /// Debug build instrumented with AddressSanitizer.
    Sanitized,
}

impl BuildType {
    pub const ALL: [BuildType; 3] = [BuildType::Release, BuildType::Debug, BuildType::Sanitized];

    pub fn code(self) -> &'static str {
        match self {
            BuildType::Release => "r",
            BuildType::Debug => "d",
            BuildType::Sanitized => "a",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildType::Release => f.write_str("release"),
            BuildType::Debug => f.write_str("debug"),
            BuildType::Sanitized => f.write_str("sanitized"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_supported_hosts() {
        assert_eq!(Platform::from_os_id("windows"), Some(Platform::Windows));
        assert_eq!(Platform::from_os_id("linux"), Some(Platform::Linux));
    }

    #[test]
    fn unsupported_hosts_have_no_platform() {
        assert_eq!(Platform::from_os_id("macos"), None);
        assert_eq!(Platform::from_os_id("freebsd"), None);
        assert_eq!(Platform::from_os_id(""), None);
    }

    #[test]
    fn codes_are_distinct() {
        let codes: Vec<String> = Platform::ALL
            .iter()
            .flat_map(|p| BuildType::ALL.iter().map(move |b| format!("{}{}", p.code(), b.code())))
            .collect();
        let mut unique = codes.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), codes.len());
    }
}
