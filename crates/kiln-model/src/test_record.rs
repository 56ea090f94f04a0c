use serde::{Deserialize, Serialize};

/// Expectations extracted from one annotated test source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedTest {
    /// Project-relative path with `/` separators.
    pub path: String,
    /// Arguments passed to the compiler when running the test.
    pub run_args: Vec<String>,
    /// Expected process return code. Signal terminations are negative.
    #[serde(default)]
    pub expected_return_code: i64,
    /// Expected standard output; empty means output is not checked.
    #[serde(default)]
    pub expected_text: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl AnnotatedTest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            run_args: Vec::new(),
            expected_return_code: 0,
            expected_text: String::new(),
            enabled: true,
        }
    }

    /// Whether the runner must capture and compare standard output.
    pub fn checks_output(&self) -> bool {
        !self.expected_text.is_empty()
    }
}
