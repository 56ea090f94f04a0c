//! Backend-agnostic build graph.
//!
//! A graph is a set of rules (how to run a kind of action) and nodes (one
//! action with its inputs and outputs). Nodes have three input classes:
//!
//! - explicit inputs, passed to the command as `$in`
//! - implicit inputs, which trigger a rebuild when they change but are not
//!   passed on the command line
//! - order-only inputs, which must exist before the node runs but never
//!   trigger a rebuild on their own
//!
//! The executor may run any two nodes in parallel unless one reaches the
//! other through these inputs, so every real dependency must be spelled out.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use kiln_model::{CommandLine, Platform, Word};

use crate::error::{GraphError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleKind {
    Compile,
    Link,
    GeneratePlatformCode(Platform),
    BuildBootstrapTool,
    AmalgamateSources,
    RunTest,
    GenerateIncrementalTestSource,
    CompileTestHarness,
    RunGeneratedBinary,
    RegenerateSelf,
    /// Executor built-in alias; never declared as a rule.
    Phony,
}

impl RuleKind {
    pub fn rule_name(self) -> &'static str {
        match self {
            RuleKind::Compile => "cc",
            RuleKind::Link => "link",
            RuleKind::GeneratePlatformCode(Platform::Windows) => "codegen_w",
            RuleKind::GeneratePlatformCode(Platform::Linux) => "codegen_l",
            RuleKind::BuildBootstrapTool => "bootstrap",
            RuleKind::AmalgamateSources => "amalg",
            RuleKind::RunTest => "testrun",
            RuleKind::GenerateIncrementalTestSource => "gen_harness",
            RuleKind::CompileTestHarness => "harness_cc",
            RuleKind::RunGeneratedBinary => "runbin",
            RuleKind::RegenerateSelf => "regen",
            RuleKind::Phony => "phony",
        }
    }
}

/// How a compile rule reports headers it read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveredDeps {
    /// Make-style dependency file written next to the output.
    Gcc { depfile: Word },
    /// `/showIncludes` lines on stdout.
    Msvc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub kind: RuleKind,
    pub command: CommandLine,
    /// Progress line; `$in`/`$out` are expanded by the executor.
    pub description: Option<String>,
    pub deps: Option<DiscoveredDeps>,
    /// Marks the rule that regenerates the build file itself.
    pub generator: bool,
}

impl Rule {
    pub fn new(kind: RuleKind, command: CommandLine) -> Self {
        Self {
            kind,
            command,
            description: None,
            deps: None,
            generator: false,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_deps(mut self, deps: DiscoveredDeps) -> Self {
        self.deps = Some(deps);
        self
    }

    #[must_use]
    pub fn as_generator(mut self) -> Self {
        self.generator = true;
        self
    }
}

/// A path as seen from the build directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GraphPath {
    /// Relative to the build directory, or absolute.
    Built(String),
    /// Relative to the compiler source directory (`$root`).
    Source(String),
}

impl GraphPath {
    pub fn built(path: impl Into<String>) -> Self {
        Self::Built(path.into())
    }

    pub fn source(path: impl Into<String>) -> Self {
        Self::Source(path.into())
    }
}

impl fmt::Display for GraphPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphPath::Built(path) => f.write_str(path),
            GraphPath::Source(path) => write!(f, "$root/{path}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildNode {
    pub rule: RuleKind,
    pub outputs: Vec<GraphPath>,
    pub inputs: Vec<GraphPath>,
    pub implicit_inputs: Vec<GraphPath>,
    pub order_only: Vec<GraphPath>,
    /// Node-scoped variables, e.g. the test payload.
    pub variables: Vec<(String, String)>,
}

impl BuildNode {
    pub fn new(rule: RuleKind, output: GraphPath) -> Self {
        Self {
            rule,
            outputs: vec![output],
            inputs: Vec::new(),
            implicit_inputs: Vec::new(),
            order_only: Vec::new(),
            variables: Vec::new(),
        }
    }

    /// The node id is its primary output.
    pub fn id(&self) -> String {
        self.outputs
            .first()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn output(mut self, path: GraphPath) -> Self {
        self.outputs.push(path);
        self
    }

    #[must_use]
    pub fn input(mut self, path: GraphPath) -> Self {
        self.inputs.push(path);
        self
    }

    #[must_use]
    pub fn inputs(mut self, paths: impl IntoIterator<Item = GraphPath>) -> Self {
        self.inputs.extend(paths);
        self
    }

    #[must_use]
    pub fn implicit(mut self, path: GraphPath) -> Self {
        self.implicit_inputs.push(path);
        self
    }

    #[must_use]
    pub fn order_only(mut self, path: GraphPath) -> Self {
        self.order_only.push(path);
        self
    }

    #[must_use]
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.push((name.into(), value.into()));
        self
    }

    /// Inputs of every class.
    pub fn all_inputs(&self) -> impl Iterator<Item = &GraphPath> {
        self.inputs
            .iter()
            .chain(self.implicit_inputs.iter())
            .chain(self.order_only.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildGraph {
    /// File-scoped variables, in declaration order.
    pub variables: Vec<(String, String)>,
    pub rules: Vec<Rule>,
    pub nodes: Vec<BuildNode>,
    pub defaults: Vec<GraphPath>,
}

impl BuildGraph {
    pub fn rule(&self, kind: RuleKind) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.kind == kind)
    }

    pub fn nodes_of(&self, kind: RuleKind) -> impl Iterator<Item = &BuildNode> {
        self.nodes.iter().filter(move |node| node.rule == kind)
    }

    /// The node producing `path`, if any.
    pub fn producer_of(&self, path: &GraphPath) -> Option<&BuildNode> {
        self.nodes.iter().find(|node| node.outputs.contains(path))
    }

    /// Whether `node` transitively needs `dependency` through any input class.
    pub fn depends_on(&self, node: &BuildNode, dependency: &GraphPath) -> bool {
        let producers = self.producer_index();
        let mut queue: VecDeque<&BuildNode> = VecDeque::from([node]);
        let mut seen = vec![false; self.nodes.len()];
        while let Some(current) = queue.pop_front() {
            for input in current.all_inputs() {
                if input == dependency {
                    return true;
                }
                if let Some(&index) = producers.get(input) {
                    if !seen[index] {
                        seen[index] = true;
                        queue.push_back(&self.nodes[index]);
                    }
                }
            }
        }
        false
    }

    fn producer_index(&self) -> BTreeMap<&GraphPath, usize> {
        let mut index = BTreeMap::new();
        for (position, node) in self.nodes.iter().enumerate() {
            for output in &node.outputs {
                index.entry(output).or_insert(position);
            }
        }
        index
    }

    /// Checks structural soundness: unique outputs, declared rules, no cycles.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<()> {
        let mut producers: BTreeMap<&GraphPath, usize> = BTreeMap::new();
        for (position, node) in self.nodes.iter().enumerate() {
            if node.rule != RuleKind::Phony && self.rule(node.rule).is_none() {
                return Err(GraphError::UndeclaredRule {
                    node: node.id(),
                    rule: node.rule.rule_name(),
                });
            }
            for output in &node.outputs {
                if let Some(&first) = producers.get(output) {
                    return Err(GraphError::DuplicateOutput {
                        output: output.to_string(),
                        first: self.nodes[first].id(),
                        second: node.id(),
                    });
                }
                producers.insert(output, position);
            }
        }
        self.check_acyclic(&producers)
    }

    fn check_acyclic(&self, producers: &BTreeMap<&GraphPath, usize>) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            Active,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        for start in 0..self.nodes.len() {
            if marks[start] != Mark::Unvisited {
                continue;
            }
            // Iterative DFS; each frame is (node, next input position).
            let mut stack = vec![(start, 0usize)];
            marks[start] = Mark::Active;
            while let Some(frame) = stack.last_mut() {
                let (current, cursor) = *frame;
                let next = self.nodes[current]
                    .all_inputs()
                    .enumerate()
                    .skip(cursor)
                    .find_map(|(position, input)| {
                        producers.get(input).map(|&producer| (position, producer))
                    });
                match next {
                    Some((position, dependency)) => {
                        frame.1 = position + 1;
                        match marks[dependency] {
                            Mark::Active => {
                                return Err(GraphError::Cycle {
                                    node: self.nodes[dependency].id(),
                                });
                            }
                            Mark::Unvisited => {
                                marks[dependency] = Mark::Active;
                                stack.push((dependency, 0));
                            }
                            Mark::Done => {}
                        }
                    }
                    None => {
                        marks[current] = Mark::Done;
                        stack.pop();
                    }
                }
            }
        }
        Ok(())
    }
}
