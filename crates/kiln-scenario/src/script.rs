//! Scenario scripts.
//!
//! A script is a line-oriented description of a [`Scenario`]:
//!
//! ```text
//! # comment
//! include some/dir
//! initial
//! file main.c <<EOF
//! int main() { return 1; }
//! EOF
//! file other.c "int x;\n"
//! end
//! expect 1
//! sub main.c 1 "return 1" "return 2"
//! expect 2
//! done
//! ```
//!
//! Heredoc lines each get a trailing `\n`. Inline contents and `sub`
//! arguments are JSON string literals. `expect` records `<script>:<line>` as
//! its location.

use std::iter::Enumerate;
use std::path::{Component, Path};
use std::str::Lines;

use tracing::{debug, info};

use crate::error::{Result, ScenarioError};
use crate::recorder::{Scenario, SourceLocation};

struct Parser<'a> {
    name: &'a str,
    lines: Enumerate<Lines<'a>>,
    line_count: usize,
    scenario: Scenario,
}

/// Splits one JSON string literal off the front of `rest`.
fn take_string(rest: &str) -> std::result::Result<(String, &str), String> {
    let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<String>();
    match stream.next() {
        Some(Ok(value)) => Ok((value, &rest[stream.byte_offset()..])),
        Some(Err(err)) => Err(format!("invalid string literal: {err}")),
        None => Err("expected a string literal".to_string()),
    }
}

fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    text.split_once(char::is_whitespace)
        .map_or((text, ""), |(word, rest)| (word, rest.trim_start()))
}

impl<'a> Parser<'a> {
    fn error(&self, line: usize, message: impl Into<String>) -> ScenarioError {
        ScenarioError::Script {
            path: self.name.to_string(),
            line,
            message: message.into(),
        }
    }

    fn at(&self, line: usize) -> impl Fn(ScenarioError) -> ScenarioError + '_ {
        move |err| self.error(line, err.to_string())
    }

    /// Returns the finalized program once `done` is reached.
    fn run(mut self) -> Result<String> {
        while let Some((index, raw)) = self.lines.next() {
            let line = index + 1;
            let text = raw.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            let (keyword, rest) = split_word(text);
            match keyword {
                "include" if !rest.is_empty() => {
                    let dir = rest.to_string();
                    self.scenario.include_path(dir).map_err(self.at(line))?;
                }
                "initial" if rest.is_empty() => self.initial_block(line)?,
                "sub" => self.sub(line, rest)?,
                "expect" => {
                    let code: i32 = rest
                        .parse()
                        .map_err(|_| self.error(line, format!("invalid return code {rest:?}")))?;
                    let location =
                        SourceLocation::new(self.name, u32::try_from(line).unwrap_or(u32::MAX));
                    self.scenario.expect(code, location).map_err(self.at(line))?;
                }
                "done" if rest.is_empty() => {
                    let program = self.scenario.done().map_err(self.at(line))?;
                    if let Some((index, extra)) = self
                        .lines
                        .find(|(_, l)| !l.trim().is_empty() && !l.trim().starts_with('#'))
                    {
                        return Err(self.error(index + 1, format!("unexpected {extra:?} after done")));
                    }
                    return Ok(program);
                }
                _ => return Err(self.error(line, format!("unrecognized line {text:?}"))),
            }
        }
        Err(self.error(self.line_count, "script ends without done"))
    }

    fn initial_block(&mut self, start: usize) -> Result<()> {
        let mut files: Vec<(String, String)> = Vec::new();
        loop {
            let Some((index, raw)) = self.lines.next() else {
                return Err(self.error(start, "initial block is not closed with end"));
            };
            let line = index + 1;
            let text = raw.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            if text == "end" {
                break;
            }
            let (keyword, rest) = split_word(text);
            if keyword != "file" {
                return Err(self.error(line, format!("expected file or end, found {text:?}")));
            }
            let (name, body) = split_word(rest);
            if name.is_empty() {
                return Err(self.error(line, "file needs a name"));
            }
            let contents = if let Some(tag) = body.strip_prefix("<<") {
                self.heredoc(line, tag.trim())?
            } else {
                let (contents, trailing) = take_string(body).map_err(|m| self.error(line, m))?;
                if !trailing.trim().is_empty() {
                    return Err(self.error(line, format!("unexpected {trailing:?}")));
                }
                contents
            };
            debug!(file = name, bytes = contents.len(), "seeded file");
            files.push((name.to_string(), contents));
        }
        self.scenario.initial(files).map_err(self.at(start))
    }

    fn heredoc(&mut self, start: usize, tag: &str) -> Result<String> {
        if tag.is_empty() {
            return Err(self.error(start, "heredoc needs a terminator"));
        }
        let mut contents = String::new();
        for (_, raw) in self.lines.by_ref() {
            if raw == tag {
                return Ok(contents);
            }
            contents.push_str(raw);
            contents.push('\n');
        }
        Err(self.error(start, format!("heredoc is not closed with {tag}")))
    }

    fn sub(&mut self, line: usize, rest: &str) -> Result<()> {
        let (file, rest) = split_word(rest);
        let (number, rest) = split_word(rest);
        let target: usize = number
            .parse()
            .map_err(|_| self.error(line, format!("invalid line number {number:?}")))?;
        let (find, rest) = take_string(rest).map_err(|m| self.error(line, m))?;
        let (replace, rest) = take_string(rest).map_err(|m| self.error(line, m))?;
        if !rest.trim().is_empty() {
            return Err(self.error(line, format!("unexpected {rest:?}")));
        }
        self.scenario
            .sub(file, target, &find, &replace)
            .map_err(self.at(line))
    }
}

/// Parses `source` and returns the rendered C program.
///
/// `name` is the script path printed in assertion results.
///
/// # Errors
///
/// Returns [`ScenarioError::Script`] naming the offending line.
pub fn render_script(name: &str, source: &str) -> Result<String> {
    Parser {
        name,
        lines: source.lines().enumerate(),
        line_count: source.lines().count().max(1),
        scenario: Scenario::new(),
    }
    .run()
}

/// `path` with `.` and `name/..` pairs removed, `/`-separated.
fn location_name(path: &Path) -> String {
    let mut prefix = String::new();
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(drive) => prefix = drive.as_os_str().to_string_lossy().into_owned(),
            Component::RootDir => prefix.push('/'),
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(last) if last.as_str() != ".." => {
                    parts.pop();
                }
                // `..` at the root is the root.
                _ if prefix.ends_with('/') => {}
                _ => parts.push("..".to_string()),
            },
            Component::Normal(name) => parts.push(name.to_string_lossy().into_owned()),
        }
    }
    if prefix.is_empty() && parts.is_empty() {
        return ".".to_string();
    }
    prefix + &parts.join("/")
}

/// Reads the script at `script` and writes its program to `output`.
///
/// Nothing is written when the script is invalid.
pub fn compile_script(script: &Path, output: &Path) -> Result<()> {
    let source = std::fs::read_to_string(script).map_err(|source| ScenarioError::Read {
        path: script.to_path_buf(),
        source,
    })?;
    let name = location_name(script);
    let program = render_script(&name, &source)?;
    std::fs::write(output, &program).map_err(|source| ScenarioError::Write {
        path: output.to_path_buf(),
        source,
    })?;
    info!(script = %name, output = %output.display(), "wrote update test harness");
    Ok(())
}
