//! Logging infrastructure using `tracing` and `tracing-subscriber`.
//!
//! The kiln binaries take no flags, so logging is configured from the
//! environment:
//!
//! - `KILN_LOG`: level for kiln crates (`error`, `warn`, `info`, `debug`,
//!   `trace`; default `warn`)
//! - `KILN_LOG_FORMAT`: `pretty`, `compact` or `json`
//! - `KILN_LOG_FILE`: append logs to this file instead of stderr
//! - `NO_COLOR`: disable ANSI colors
//!
//! `RUST_LOG` overrides the filter entirely. Logs never go to stdout, which
//! carries test output and summaries.

use std::fs::OpenOptions;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use tracing::Level;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub const LEVEL_VAR: &str = "KILN_LOG";
pub const FORMAT_VAR: &str = "KILN_LOG_FORMAT";
pub const FILE_VAR: &str = "KILN_LOG_FILE";
pub const NO_COLOR_VAR: &str = "NO_COLOR";

const KILN_CRATES: &[&str] = &[
    "kiln_cli",
    "kiln_graph",
    "kiln_inventory",
    "kiln_model",
    "kiln_payload",
    "kiln_scenario",
];

/// Configuration for logging behavior.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub with_target: bool,
    pub with_ansi: bool,
    pub format: LogFormat,
    /// When set, logs are appended to this file.
    pub log_file: Option<PathBuf>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    /// Single-line format.
    Compact,
    /// JSON format for machine parsing.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {other:?}")),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            with_target: false,
            with_ansi: true,
            format: LogFormat::default(),
            log_file: None,
        }
    }
}

impl LogConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::from_lookup(|name| std::env::var(name).ok());
        if config.log_file.is_none() && !io::stderr().is_terminal() {
            config.with_ansi = false;
        }
        config
    }

    /// Builds a configuration from a variable lookup. Unparseable values fall
    /// back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let level = lookup(LEVEL_VAR)
            .and_then(|value| Level::from_str(value.trim()).ok())
            .unwrap_or(defaults.level);
        let format = lookup(FORMAT_VAR)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(defaults.format);
        let log_file = lookup(FILE_VAR)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        // Any non-empty NO_COLOR disables color (https://no-color.org).
        let no_color = lookup(NO_COLOR_VAR).is_some_and(|value| !value.is_empty());
        Self {
            level,
            with_ansi: !no_color && log_file.is_none(),
            format,
            log_file,
            ..defaults
        }
    }
}

/// Initialize the global tracing subscriber with the given configuration.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    if let Some(path) = &config.log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        init_logging_with_writer(config, SharedFileWriter::new(file));
    } else {
        init_logging_with_writer(config, io::stderr);
    }
    Ok(())
}

/// Initialize logging with a custom writer.
pub fn init_logging_with_writer<W>(config: &LogConfig, writer: W)
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = build_env_filter(config.level);

    // `try_init` so a second initialisation (e.g. in tests) is a no-op.
    let _ = match config.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(config.with_target);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_writer(writer)
                .with_ansi(config.with_ansi)
                .with_target(config.with_target)
                .without_time();
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(config.with_ansi)
                .with_target(config.with_target)
                .without_time();
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
    };
}

#[derive(Clone)]
struct SharedFileWriter {
    file: Arc<Mutex<std::fs::File>>,
}

impl SharedFileWriter {
    fn new(file: std::fs::File) -> Self {
        Self {
            file: Arc::new(Mutex::new(file)),
        }
    }
}

struct SharedFileGuard {
    file: Arc<Mutex<std::fs::File>>,
}

impl Write for SharedFileGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        guard.flush()
    }
}

impl<'a> MakeWriter<'a> for SharedFileWriter {
    type Writer = SharedFileGuard;

    fn make_writer(&'a self) -> Self::Writer {
        SharedFileGuard {
            file: Arc::clone(&self.file),
        }
    }
}

fn filter_directives(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    let mut directives = String::from("warn");
    for krate in KILN_CRATES {
        directives.push_str(&format!(",{krate}={level}"));
    }
    directives
}

/// Build an `EnvFilter` from the given level, respecting `RUST_LOG`.
fn build_env_filter(level: Level) -> EnvFilter {
    // Dependencies stay at warn; kiln crates use the configured level.
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directives(level)))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_to_warn_pretty_stderr() {
        let config = LogConfig::from_lookup(lookup(&[]));
        assert_eq!(config.level, Level::WARN);
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.log_file.is_none());
        assert!(config.with_ansi);
    }

    #[test]
    fn reads_every_variable() {
        let config = LogConfig::from_lookup(lookup(&[
            (LEVEL_VAR, "debug"),
            (FORMAT_VAR, "JSON"),
            (FILE_VAR, "/tmp/kiln.log"),
        ]));
        assert_eq!(config.level, Level::DEBUG);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/kiln.log")));
        assert!(!config.with_ansi);
    }

    #[test]
    fn no_color_and_bad_values() {
        let config = LogConfig::from_lookup(lookup(&[
            (LEVEL_VAR, "loud"),
            (FORMAT_VAR, "xml"),
            (NO_COLOR_VAR, "1"),
        ]));
        assert_eq!(config.level, Level::WARN);
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(!config.with_ansi);
    }

    #[test]
    fn filter_keeps_dependencies_at_warn() {
        let directives = filter_directives(Level::TRACE);
        assert!(directives.starts_with("warn,"));
        assert!(directives.contains("kiln_graph=trace"));
        assert!(directives.contains("kiln_scenario=trace"));
    }
}
