//! Runs one annotated test against a built compiler.
//!
//! Exit statuses: 0 pass, 1 output mismatch, 2 return-code mismatch,
//! 3 when the test could not be run at all.

use std::fmt;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use anyhow::{Context, Result};
use kiln_model::AnnotatedTest;
use tracing::debug;

pub const EXIT_TEXT_MISMATCH: i32 = 1;
pub const EXIT_RETURN_CODE_MISMATCH: i32 = 2;
pub const EXIT_RUNNER_FAILURE: i32 = 3;

/// What the compiler did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observed {
    pub return_code: i64,
    /// Captured stdout; `None` when stdout was inherited.
    pub stdout: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    Text { got: String, expected: String },
    ReturnCode { got: i64, expected: i64 },
}

impl Mismatch {
    pub fn exit_status(&self) -> i32 {
        match self {
            Mismatch::Text { .. } => EXIT_TEXT_MISMATCH,
            Mismatch::ReturnCode { .. } => EXIT_RETURN_CODE_MISMATCH,
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Text { got, expected } => {
                write!(f, "got output:\n\n{got}\nbut expected:\n\n{expected}")
            }
            Mismatch::ReturnCode { got, expected } => {
                write!(f, "got return code {got}, but expected {expected}")
            }
        }
    }
}

/// Compares an observed run with the record. Output is checked first.
pub fn check(record: &AnnotatedTest, observed: &Observed) -> std::result::Result<(), Mismatch> {
    if record.checks_output() {
        let got = observed.stdout.as_deref().unwrap_or_default();
        if got != record.expected_text {
            return Err(Mismatch::Text {
                got: got.to_string(),
                expected: record.expected_text.clone(),
            });
        }
    }
    if observed.return_code != record.expected_return_code {
        return Err(Mismatch::ReturnCode {
            got: observed.return_code,
            expected: record.expected_return_code,
        });
    }
    Ok(())
}

/// Return code of a finished process; a signal `N` is reported as `-N`.
pub fn return_code(status: ExitStatus) -> i64 {
    if let Some(code) = status.code() {
        return i64::from(code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -i64::from(signal);
        }
    }
    -1
}

/// Runs `compiler` from `root` with the record's arguments.
///
/// A relative `root` is taken from the current directory; a relative
/// `compiler` is taken from `root`.
pub fn execute(root: &Path, compiler: &Path, record: &AnnotatedTest) -> Result<Observed> {
    let root = std::path::absolute(root)
        .with_context(|| format!("failed to resolve project root {}", root.display()))?;
    let root = root.as_path();
    let compiler = if compiler.is_absolute() {
        compiler.to_path_buf()
    } else {
        root.join(compiler)
    };
    let mut command = Command::new(&compiler);
    command.args(&record.run_args).current_dir(root);
    debug!(
        test = %record.path,
        compiler = %compiler.display(),
        args = ?record.run_args,
        "running test"
    );

    if record.checks_output() {
        let output = command
            .stderr(Stdio::inherit())
            .output()
            .with_context(|| format!("failed to run {}", compiler.display()))?;
        Ok(Observed {
            return_code: return_code(output.status),
            stdout: Some(String::from_utf8_lossy(&output.stdout).into_owned()),
        })
    } else {
        let status = command
            .status()
            .with_context(|| format!("failed to run {}", compiler.display()))?;
        Ok(Observed {
            return_code: return_code(status),
            stdout: None,
        })
    }
}

/// Decodes `token`, runs the test and returns the process exit status.
pub fn run(root: &Path, compiler: &Path, token: &str) -> Result<i32> {
    let record = kiln_payload::decode(token).context("invalid test payload")?;
    let observed = execute(root, compiler, &record)?;
    match check(&record, &observed) {
        Ok(()) => Ok(0),
        Err(mismatch) => {
            println!("{mismatch}");
            Ok(mismatch.exit_status())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: i64, text: &str) -> AnnotatedTest {
        let mut record = AnnotatedTest::new("test/t.c");
        record.expected_return_code = code;
        record.expected_text = text.to_string();
        record
    }

    #[test]
    fn return_code_only_ignores_stdout() {
        let record = record(2, "");
        let pass = Observed {
            return_code: 2,
            stdout: Some("anything".to_string()),
        };
        assert_eq!(check(&record, &pass), Ok(()));
        let fail = Observed {
            return_code: 0,
            stdout: None,
        };
        let mismatch = check(&record, &fail).unwrap_err();
        assert_eq!(mismatch.exit_status(), 2);
        assert_eq!(mismatch.to_string(), "got return code 0, but expected 2");
    }

    #[test]
    fn text_is_checked_before_return_code() {
        let record = record(0, "hello\n");
        let observed = Observed {
            return_code: 7,
            stdout: Some("hullo\n".to_string()),
        };
        let mismatch = check(&record, &observed).unwrap_err();
        assert_eq!(mismatch.exit_status(), 1);
        insta::assert_snapshot!(mismatch.to_string().replace('\n', "|"), @"got output:||hullo||but expected:||hello|");
    }

    #[test]
    fn text_must_match_exactly() {
        let record = record(0, "a\n");
        let observed = Observed {
            return_code: 0,
            stdout: Some("a\r\n".to_string()),
        };
        assert!(check(&record, &observed).is_err());
    }
}
