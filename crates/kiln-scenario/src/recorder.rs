//! The scenario state machine.
//!
//! Edits are buffered per file and flushed as whole-file updates right before
//! each assertion, so an update always carries the file's cumulative content
//! and a file that has not changed since its last flush is not sent again.

use std::fmt;
use std::panic::Location;

use tracing::debug;

use crate::error::{Result, ScenarioError};
use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioState {
    Empty,
    Tracking,
    Finalized,
}

impl fmt::Display for ScenarioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScenarioState::Empty => "empty",
            ScenarioState::Tracking => "tracking files",
            ScenarioState::Finalized => "finalized",
        })
    }
}

/// Where an assertion was authored; printed by the generated program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// The location of the code calling this function.
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self::new(location.file(), location.line())
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Replace the compiler's view of `file` with `contents`.
    Update { file: String, contents: String },
    /// Run the compiled program's `main` and compare its result.
    Assert {
        return_code: i32,
        location: SourceLocation,
    },
}

#[derive(Debug, Clone)]
struct TrackedFile {
    name: String,
    contents: String,
    dirty: bool,
}

#[derive(Debug, Clone)]
pub struct Scenario {
    state: ScenarioState,
    steps: Vec<Step>,
    files: Vec<TrackedFile>,
    initial_contents: Vec<(String, String)>,
    include_paths: Vec<String>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario {
    pub fn new() -> Self {
        Self {
            state: ScenarioState::Empty,
            steps: Vec::new(),
            files: Vec::new(),
            initial_contents: Vec::new(),
            include_paths: Vec::new(),
        }
    }

    pub fn state(&self) -> ScenarioState {
        self.state
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Tracked file names in the order they were first added.
    pub fn tracked_files(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|file| file.name.as_str())
    }

    /// Current content of a tracked file.
    pub fn contents(&self, name: &str) -> Option<&str> {
        self.file(name).map(|file| file.contents.as_str())
    }

    pub fn initial_contents(&self) -> &[(String, String)] {
        &self.initial_contents
    }

    pub fn include_paths(&self) -> &[String] {
        &self.include_paths
    }

    fn require(&self, operation: &'static str, allowed: &[ScenarioState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(ScenarioError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn file(&self, name: &str) -> Option<&TrackedFile> {
        self.files.iter().find(|file| file.name == name)
    }

    /// Starts tracking `files` with their exact initial content and flushes.
    ///
    /// Calling this again while tracking adds (or reseeds) files.
    pub fn initial<I, N, C>(&mut self, files: I) -> Result<()>
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<String>,
    {
        self.require("seed", &[ScenarioState::Empty, ScenarioState::Tracking])?;
        for (name, contents) in files {
            let name = name.into();
            let contents = contents.into();
            match self.initial_contents.iter_mut().find(|(n, _)| *n == name) {
                Some((_, initial)) => initial.clone_from(&contents),
                None => self.initial_contents.push((name.clone(), contents.clone())),
            }
            match self.files.iter_mut().find(|file| file.name == name) {
                Some(file) => {
                    file.contents = contents;
                    file.dirty = true;
                }
                None => self.files.push(TrackedFile {
                    name,
                    contents,
                    dirty: true,
                }),
            }
        }
        self.state = ScenarioState::Tracking;
        self.flush();
        Ok(())
    }

    /// Replaces the first occurrence of `find` on the 1-based `line` of `file`.
    ///
    /// # Errors
    ///
    /// Fails if the file is not tracked, the line does not exist or does not
    /// contain `find`.
    pub fn sub(&mut self, file: &str, line: usize, find: &str, replace: &str) -> Result<()> {
        self.require("edit", &[ScenarioState::Tracking])?;
        let tracked = self
            .files
            .iter_mut()
            .find(|tracked| tracked.name == file)
            .ok_or_else(|| ScenarioError::UntrackedFile {
                file: file.to_string(),
            })?;

        let lines: Vec<&str> = tracked.contents.split_inclusive('\n').collect();
        let line_count = lines.len();
        let target = line
            .checked_sub(1)
            .and_then(|index| lines.get(index))
            .ok_or_else(|| ScenarioError::LineOutOfRange {
                file: file.to_string(),
                line,
                lines: line_count,
            })?;

        let body_len = target.trim_end_matches(['\n', '\r']).len();
        let (body, terminator) = target.split_at(body_len);
        if !body.contains(find) {
            return Err(ScenarioError::PatternNotFound {
                file: file.to_string(),
                line,
                find: find.to_string(),
            });
        }
        let edited = format!("{}{terminator}", body.replacen(find, replace, 1));
        let mut contents = String::with_capacity(tracked.contents.len() + replace.len());
        for (index, text) in lines.iter().copied().enumerate() {
            contents.push_str(if index + 1 == line { edited.as_str() } else { text });
        }
        tracked.contents = contents;
        tracked.dirty = true;
        Ok(())
    }

    /// Flushes pending edits, then asserts that `main` returns `return_code`.
    pub fn expect(&mut self, return_code: i32, location: SourceLocation) -> Result<()> {
        self.require("assert on", &[ScenarioState::Tracking])?;
        self.flush();
        debug!(return_code, %location, "recorded assertion");
        self.steps.push(Step::Assert {
            return_code,
            location,
        });
        Ok(())
    }

    /// [`Scenario::expect`] with the caller's own source location.
    #[track_caller]
    pub fn expect_here(&mut self, return_code: i32) -> Result<()> {
        let location = SourceLocation::caller();
        self.expect(return_code, location)
    }

    /// Adds an include directory for the embedded compiler.
    pub fn include_path(&mut self, dir: impl Into<String>) -> Result<()> {
        self.require(
            "add an include path to",
            &[ScenarioState::Empty, ScenarioState::Tracking],
        )?;
        self.include_paths.push(dir.into());
        Ok(())
    }

    /// Finalizes the scenario and renders the C program.
    pub fn done(&mut self) -> Result<String> {
        self.require("finalize", &[ScenarioState::Tracking])?;
        self.state = ScenarioState::Finalized;
        Ok(render::render_program(self))
    }

    fn flush(&mut self) {
        for file in self.files.iter_mut().filter(|file| file.dirty) {
            self.steps.push(Step::Update {
                file: file.name.clone(),
                contents: file.contents.clone(),
            });
            file.dirty = false;
        }
    }
}
