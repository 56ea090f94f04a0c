//! Line directives embedded in test sources.
//!
//! Directives are matched at the start of a line:
//!
//! - `// RUN: <args>`: compiler arguments, last one wins
//! - `// RET: <code>`: expected return code, last parseable one wins
//! - `// TXT: <line>`: one line of expected stdout, repeatable
//! - `// DISABLED`: excludes the test
//!
//! Anything else, including a `RET` that is not an integer, is ignored.

use kiln_model::AnnotatedTest;

pub const RUN_PREFIX: &str = "// RUN: ";
pub const RET_PREFIX: &str = "// RET: ";
pub const TXT_PREFIX: &str = "// TXT: ";
pub const DISABLED_PREFIX: &str = "// DISABLED";

/// Replaced with the test's own path in run arguments and expected text.
pub const SELF_TOKEN: &str = "{self}";

/// Run arguments used when a test has no `RUN` directive.
pub const DEFAULT_RUN: &str = "-Itest test/common.c {self}";

/// Extracts the expectations of one test source.
pub fn parse_annotations(path: &str, source: &str) -> AnnotatedTest {
    let mut run = DEFAULT_RUN.to_string();
    let mut ret = 0i64;
    let mut txt = String::new();
    let mut disabled = false;

    for line in source.lines() {
        if let Some(rest) = line.strip_prefix(RUN_PREFIX) {
            run = rest.trim_end().to_string();
        } else if let Some(rest) = line.strip_prefix(RET_PREFIX) {
            if let Ok(code) = rest.trim().parse::<i64>() {
                ret = code;
            }
        } else if let Some(rest) = line.strip_prefix(TXT_PREFIX) {
            txt.push_str(rest.trim_end());
            txt.push('\n');
        } else if line.starts_with(DISABLED_PREFIX) {
            disabled = true;
        }
    }

    let run = run.replace(SELF_TOKEN, path);
    AnnotatedTest {
        path: path.to_string(),
        run_args: run.split_whitespace().map(str::to_string).collect(),
        expected_return_code: ret,
        expected_text: txt.replace(SELF_TOKEN, path),
        enabled: !disabled,
    }
}
