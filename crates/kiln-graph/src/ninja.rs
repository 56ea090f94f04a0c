//! Ninja manifest rendering.
//!
//! Literal command text is quoted for the host shell first and then escaped
//! for Ninja, so a `$` in a tool path cannot turn into a variable reference.
//! Paths in `build` lines escape `$`, space and `:`.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::path::Path;

use kiln_model::{CommandLine, Fragment, Platform, Word};

use crate::error::{GraphError, Result};
use crate::graph::{BuildGraph, BuildNode, DiscoveredDeps, GraphPath, Rule, RuleKind};

/// Quoting convention of the shell that runs rule commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellStyle {
    /// `/bin/sh -c`, single-quote literals.
    Posix,
    /// `CreateProcess` command line, double-quote literals.
    Windows,
}

impl ShellStyle {
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Windows => ShellStyle::Windows,
            Platform::Linux => ShellStyle::Posix,
        }
    }
}

fn is_posix_safe(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || "-_./=:,+@%^".contains(ch)
}

fn quote_text(text: &str, shell: ShellStyle) -> Cow<'_, str> {
    match shell {
        ShellStyle::Posix => {
            if !text.is_empty() && text.chars().all(is_posix_safe) {
                Cow::Borrowed(text)
            } else {
                Cow::Owned(format!("'{}'", text.replace('\'', r"'\''")))
            }
        }
        ShellStyle::Windows => {
            if !text.is_empty() && !text.contains([' ', '\t', '"']) {
                Cow::Borrowed(text)
            } else {
                Cow::Owned(format!("\"{}\"", text.replace('"', "\\\"")))
            }
        }
    }
}

/// Escapes text that Ninja would otherwise read as a variable reference.
fn escape_value(text: &str) -> String {
    text.replace('$', "$$")
}

fn escape_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for ch in path.chars() {
        match ch {
            '$' => escaped.push_str("$$"),
            ' ' => escaped.push_str("$ "),
            ':' => escaped.push_str("$:"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn render_path(path: &GraphPath) -> String {
    match path {
        GraphPath::Built(path) => escape_path(path),
        GraphPath::Source(path) => format!("$root/{}", escape_path(path)),
    }
}

fn render_word(word: &Word, shell: ShellStyle) -> String {
    let mut out = String::new();
    for fragment in word.fragments() {
        match fragment {
            Fragment::Text(text) => out.push_str(&escape_value(&quote_text(text, shell))),
            Fragment::Var(placeholder) => {
                out.push('$');
                out.push_str(placeholder.name());
            }
        }
    }
    if out.is_empty() {
        out.push_str(match shell {
            ShellStyle::Posix => "''",
            ShellStyle::Windows => "\"\"",
        });
    }
    out
}

pub(crate) fn render_command(command: &CommandLine, shell: ShellStyle) -> String {
    let mut out = render_word(&command.program, shell);
    for arg in &command.args {
        out.push(' ');
        out.push_str(&render_word(arg, shell));
    }
    if let Some(target) = &command.stdout {
        out.push_str(" > ");
        out.push_str(&render_word(target, shell));
    }
    out
}

fn render_rule(out: &mut String, rule: &Rule, shell: ShellStyle) {
    let _ = writeln!(out, "rule {}", rule.kind.rule_name());
    let _ = writeln!(out, "  command = {}", render_command(&rule.command, shell));
    if let Some(description) = &rule.description {
        let _ = writeln!(out, "  description = {description}");
    }
    match &rule.deps {
        Some(DiscoveredDeps::Gcc { depfile }) => {
            out.push_str("  deps = gcc\n");
            let _ = writeln!(out, "  depfile = {}", render_word(depfile, shell));
        }
        Some(DiscoveredDeps::Msvc) => out.push_str("  deps = msvc\n"),
        None => {}
    }
    if rule.generator {
        out.push_str("  generator = 1\n");
    }
    out.push('\n');
}

fn join_paths(paths: &[GraphPath]) -> String {
    paths.iter().map(render_path).collect::<Vec<_>>().join(" ")
}

pub(crate) fn render_node(out: &mut String, node: &BuildNode) {
    let _ = write!(
        out,
        "build {}: {}",
        join_paths(&node.outputs),
        node.rule.rule_name()
    );
    if !node.inputs.is_empty() {
        let _ = write!(out, " {}", join_paths(&node.inputs));
    }
    if !node.implicit_inputs.is_empty() {
        let _ = write!(out, " | {}", join_paths(&node.implicit_inputs));
    }
    if !node.order_only.is_empty() {
        let _ = write!(out, " || {}", join_paths(&node.order_only));
    }
    out.push('\n');
    for (name, value) in &node.variables {
        let _ = writeln!(out, "  {name} = {}", escape_value(value));
    }
}

/// Renders the whole graph as a Ninja manifest.
pub fn render_ninja(graph: &BuildGraph, shell: ShellStyle) -> String {
    let mut out = String::new();
    for (name, value) in &graph.variables {
        let _ = writeln!(out, "{name} = {value}");
    }
    if !graph.variables.is_empty() {
        out.push('\n');
    }

    for rule in graph.rules.iter().filter(|r| r.kind != RuleKind::Phony) {
        render_rule(&mut out, rule, shell);
    }

    for node in &graph.nodes {
        render_node(&mut out, node);
    }

    if !graph.defaults.is_empty() {
        let _ = writeln!(out, "\ndefault {}", join_paths(&graph.defaults));
    }
    out
}

/// Renders `graph` and writes it to `path` with `\n` line endings.
///
/// # Errors
///
/// Returns [`GraphError::Io`] if the file cannot be written.
pub fn write_ninja(path: &Path, graph: &BuildGraph, shell: ShellStyle) -> Result<()> {
    std::fs::write(path, render_ninja(graph, shell)).map_err(|source| GraphError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_model::Placeholder;

    #[test]
    fn posix_quotes_only_unsafe_literals() {
        let command = CommandLine::new("/opt/my tools/run")
            .text_arg("-I")
            .arg(Word(vec![
                Fragment::Text("it's".to_string()),
                Fragment::Var(Placeholder::Output),
            ]))
            .var_arg(Placeholder::Inputs);
        insta::assert_snapshot!(
            render_command(&command, ShellStyle::Posix),
            @r"'/opt/my tools/run' -I 'it'\''s'$out $in"
        );
    }

    #[test]
    fn windows_quotes_spaces_and_quotes() {
        let command = CommandLine::new(r"C:\Program Files\kiln\kiln-testrun.exe")
            .text_arg(r#"say "hi""#)
            .var_arg(Placeholder::Data);
        assert_eq!(
            render_command(&command, ShellStyle::Windows),
            r#""C:\Program Files\kiln\kiln-testrun.exe" "say \"hi\"" $data"#
        );
    }

    #[test]
    fn literal_dollars_are_escaped_in_commands() {
        let command = CommandLine::new("/home/$user/bin/tool");
        assert_eq!(
            render_command(&command, ShellStyle::Posix),
            "'/home/$$user/bin/tool'"
        );
    }

    #[test]
    fn stdout_redirection_is_rendered() {
        let command = CommandLine::parse("tool $in > $out").unwrap();
        assert_eq!(render_command(&command, ShellStyle::Posix), "tool $in > $out");
    }

    #[test]
    fn paths_escape_spaces_colons_and_dollars() {
        assert_eq!(escape_path("C:/a b/$x"), "C$:/a$ b/$$x");
        assert_eq!(render_path(&GraphPath::source("../test/a b.c")), "$root/../test/a$ b.c");
    }

    #[test]
    fn node_lists_every_input_class() {
        let node = BuildNode::new(RuleKind::CompileTestHarness, GraphPath::built("t.runner"))
            .input(GraphPath::built("t.runner.c"))
            .input(GraphPath::built("libdyibicc.o"))
            .implicit(GraphPath::source("dyibicc.h"))
            .order_only(GraphPath::built("embed/libdyibicc.h"))
            .variable("data", "ab");
        let mut out = String::new();
        render_node(&mut out, &node);
        assert_eq!(
            out,
            "build t.runner: harness_cc t.runner.c libdyibicc.o | $root/dyibicc.h || embed/libdyibicc.h\n  data = ab\n"
        );
    }

    #[test]
    fn gcc_rules_carry_depfile() {
        let rule = Rule::new(RuleKind::Compile, CommandLine::parse("clang -c $in -o $out").unwrap())
            .with_description("CC $out")
            .with_deps(DiscoveredDeps::Gcc {
                depfile: Word(vec![
                    Fragment::Var(Placeholder::Output),
                    Fragment::Text(".d".to_string()),
                ]),
            });
        let mut out = String::new();
        render_rule(&mut out, &rule, ShellStyle::Posix);
        assert_eq!(
            out,
            "rule cc\n  command = clang -c $in -o $out\n  description = CC $out\n  deps = gcc\n  depfile = $out.d\n\n"
        );
    }
}
