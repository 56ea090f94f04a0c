//! Structured command descriptors.
//!
//! Command templates are tokenized once into a program word, argument words
//! and an optional stdout redirection. Each word is a sequence of literal text
//! and structural placeholders, so a backend can quote literals for its shell
//! and spell placeholders in its own variable syntax without reparsing flags.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::{ModelError, Result};

/// Structural values substituted by the build executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Placeholder {
    /// Space-separated explicit inputs of the node.
    Inputs,
    /// Space-separated outputs of the node.
    Output,
    /// Relative path from the output directory to the compiler sources.
    Root,
    /// Per-node payload token.
    Data,
}

impl Placeholder {
    pub fn name(self) -> &'static str {
        match self {
            Placeholder::Inputs => "in",
            Placeholder::Output => "out",
            Placeholder::Root => "root",
            Placeholder::Data => "data",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "in" => Some(Placeholder::Inputs),
            "out" => Some(Placeholder::Output),
            "root" => Some(Placeholder::Root),
            "data" => Some(Placeholder::Data),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    Var(Placeholder),
}

/// One shell word made of literal text and placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Word(pub Vec<Fragment>);

impl Word {
    pub fn text(text: impl Into<String>) -> Self {
        Self(vec![Fragment::Text(text.into())])
    }

    pub fn var(placeholder: Placeholder) -> Self {
        Self(vec![Fragment::Var(placeholder)])
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.0
    }

    /// Whether the word is exactly one placeholder and nothing else.
    pub fn as_placeholder(&self) -> Option<Placeholder> {
        match self.0.as_slice() {
            [Fragment::Var(p)] => Some(*p),
            _ => None,
        }
    }

    fn parse(token: &str, template: &str) -> Result<Self> {
        let mut fragments = Vec::new();
        let mut text = String::new();
        let mut chars = token.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch != '$' {
                text.push(ch);
                continue;
            }
            let mut name = String::new();
            while let Some(&next) = chars.peek() {
                if next.is_ascii_alphanumeric() || next == '_' {
                    name.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            let placeholder =
                Placeholder::from_name(&name).ok_or_else(|| ModelError::UnknownPlaceholder {
                    template: template.to_string(),
                    name: name.clone(),
                })?;
            if !text.is_empty() {
                fragments.push(Fragment::Text(std::mem::take(&mut text)));
            }
            fragments.push(Fragment::Var(placeholder));
        }
        if !text.is_empty() {
            fragments.push(Fragment::Text(text));
        }
        Ok(Self(fragments))
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for fragment in &self.0 {
            match fragment {
                Fragment::Text(text) => f.write_str(text)?,
                Fragment::Var(p) => write!(f, "${}", p.name())?,
            }
        }
        Ok(())
    }
}

/// A program invocation: program, arguments and optional stdout redirection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: Word,
    pub args: Vec<Word>,
    pub stdout: Option<Word>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: Word::text(program),
            args: Vec::new(),
            stdout: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, word: Word) -> Self {
        self.args.push(word);
        self
    }

    #[must_use]
    pub fn text_arg(self, text: impl Into<String>) -> Self {
        self.arg(Word::text(text))
    }

    #[must_use]
    pub fn var_arg(self, placeholder: Placeholder) -> Self {
        self.arg(Word::var(placeholder))
    }

    #[must_use]
    pub fn stdout_to(mut self, word: Word) -> Self {
        self.stdout = Some(word);
        self
    }

    /// Tokenizes a whitespace-separated command template.
    ///
    /// `$in`, `$out`, `$root` and `$data` become placeholders; a standalone
    /// `>` token redirects stdout to the following word.
    ///
    /// # Errors
    ///
    /// Fails on an empty template, an unknown `$name`, or a dangling `>`.
    pub fn parse(template: &str) -> Result<Self> {
        let mut tokens = template.split_whitespace();
        let program = tokens.next().ok_or_else(|| ModelError::EmptyCommand {
            template: template.to_string(),
        })?;
        let mut command = Self {
            program: Word::parse(program, template)?,
            args: Vec::new(),
            stdout: None,
        };
        while let Some(token) = tokens.next() {
            if token == ">" {
                let target = tokens
                    .next()
                    .ok_or_else(|| ModelError::MissingRedirectTarget {
                        template: template.to_string(),
                    })?;
                command.stdout = Some(Word::parse(target, template)?);
            } else {
                command.args.push(Word::parse(token, template)?);
            }
        }
        Ok(command)
    }

    /// Placeholders referenced anywhere in the command.
    pub fn placeholders(&self) -> BTreeSet<Placeholder> {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .chain(self.stdout.iter())
            .flat_map(|word| word.0.iter())
            .filter_map(|fragment| match fragment {
                Fragment::Var(p) => Some(*p),
                Fragment::Text(_) => None,
            })
            .collect()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        if let Some(target) = &self.stdout {
            write!(f, " > {target}")?;
        }
        Ok(())
    }
}
