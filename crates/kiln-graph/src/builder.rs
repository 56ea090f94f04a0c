//! Assembly of the full build graph for one (platform, build type) cell.

use std::collections::BTreeMap;

use kiln_model::{
    AnnotatedTest, BuildType, CommandLine, Fragment, Placeholder, Platform, SourceUnit, Word,
    core_units,
};
use tracing::{debug, info};

use crate::error::{GraphError, Result};
use crate::graph::{BuildGraph, BuildNode, GraphPath, Rule, RuleKind};
use crate::matrix::{ConfigMatrix, PlatformSettings};

/// Value of `$root`: the compiler sources seen from `out/<cell>/`.
pub const ROOT_FROM_BUILD_DIR: &str = "../../src";

const COMPILER: &str = "dyibicc";
const BOOTSTRAP_TOOL: &str = "minilua";
const CODEGEN_INPUT: &str = "codegen.in.c";
const EMBED_SOURCE: &str = "embed/libdyibicc.c";
const EMBED_HEADER: &str = "embed/libdyibicc.h";
const EMBED_LICENSE: &str = "embed/LICENSE";
const EMBED_OBJECT_STEM: &str = "libdyibicc";
const TEST_SUPPORT: &str = "../test/common.c";
const BUILD_FILE: &str = "build.ninja";

/// Headers bundled into the amalgamation besides the core units.
const AMALGAMATION_HEADERS: &[&str] = &[
    "dyibicc.h",
    "../include/all/reflect.h",
    "khash.h",
    "dynasm/dasm_proto.h",
    "dynasm/dasm_x86.h",
];

/// Locations of the kiln executables invoked by the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub test_runner: String,
    pub scenario_compiler: String,
    pub generator: String,
}

/// Build directory of a cell relative to the project root, e.g. `out/lr`.
pub fn out_dir_name(platform: Platform, build_type: BuildType) -> String {
    format!("out/{}{}", platform.code(), build_type.code())
}

fn generated_unit(platform: Platform) -> SourceUnit {
    SourceUnit::generated(format!("codegen.{}.c", platform.code()))
}

/// Harness files are named after the script file, extension included.
fn scenario_basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

pub struct GraphBuilder<'a> {
    platform: Platform,
    build_type: BuildType,
    settings: &'static PlatformSettings,
    tools: &'a ToolPaths,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(platform: Platform, build_type: BuildType, tools: &'a ToolPaths) -> Self {
        Self {
            platform,
            build_type,
            settings: ConfigMatrix::settings(platform),
            tools,
        }
    }

    fn executable(&self, stem: &str) -> GraphPath {
        GraphPath::built(self.settings.executable(stem))
    }

    fn object(&self, stem: &str) -> GraphPath {
        GraphPath::built(self.settings.object(stem))
    }

    pub fn compiler_executable(&self) -> GraphPath {
        self.executable(COMPILER)
    }

    pub fn bootstrap_executable(&self) -> GraphPath {
        self.executable(BOOTSTRAP_TOOL)
    }

    pub fn generated_source(&self, platform: Platform) -> GraphPath {
        GraphPath::built(generated_unit(platform).path)
    }

    /// Object of the generated unit linked into this host's compiler.
    pub fn host_generated_object(&self) -> GraphPath {
        self.object(generated_unit(self.platform).stem())
    }

    pub fn embed_object(&self) -> GraphPath {
        self.object(EMBED_OBJECT_STEM)
    }

    /// Builds the graph for this cell.
    ///
    /// Disabled tests are skipped. `scenarios` are project-relative paths of
    /// incremental-update scripts.
    ///
    /// # Errors
    ///
    /// Fails if a command template is malformed, a payload cannot be encoded,
    /// or the assembled graph does not validate.
    pub fn build(
        &self,
        tests: &BTreeMap<String, AnnotatedTest>,
        scenarios: &[String],
    ) -> Result<BuildGraph> {
        let mut graph = BuildGraph {
            variables: vec![("root".to_string(), ROOT_FROM_BUILD_DIR.to_string())],
            rules: self.rules()?,
            ..BuildGraph::default()
        };

        self.add_compiler_nodes(&mut graph);

        let mut aliases = Vec::new();
        for (path, record) in tests {
            if !record.enabled {
                debug!(test = %path, "skipping disabled test");
                continue;
            }
            graph.nodes.push(self.test_node(record)?);
            aliases.push(GraphPath::built(path.clone()));
        }
        for script in scenarios {
            self.add_scenario_nodes(&mut graph, script);
            aliases.push(GraphPath::built(script.clone()));
        }
        graph
            .nodes
            .push(BuildNode::new(RuleKind::Phony, GraphPath::built("test")).inputs(aliases));

        graph.defaults.push(self.compiler_executable());
        graph.nodes.push(
            BuildNode::new(RuleKind::RegenerateSelf, GraphPath::built(BUILD_FILE))
                .implicit(GraphPath::built(self.tools.generator.clone())),
        );

        graph.validate()?;
        info!(
            platform = %self.platform,
            build_type = %self.build_type,
            node_count = graph.nodes.len(),
            test_count = graph.nodes_of(RuleKind::RunTest).count(),
            scenario_count = graph.nodes_of(RuleKind::RunGeneratedBinary).count(),
            "assembled build graph"
        );
        Ok(graph)
    }

    fn rules(&self) -> Result<Vec<Rule>> {
        let commands = ConfigMatrix::resolve(self.platform, self.build_type)?;
        let bootstrap_tool = format!("./{}", self.settings.executable(BOOTSTRAP_TOOL));
        let codegen = |target: Platform| -> Result<Rule> {
            let define = ConfigMatrix::settings(target).codegen_define;
            let command = CommandLine::parse(&format!(
                "{bootstrap_tool} $root/dynasm/dynasm.lua -D {define} -o $out $in"
            ))?;
            Ok(Rule::new(RuleKind::GeneratePlatformCode(target), command)
                .with_description("DYNASM $out"))
        };

        let out_dir = out_dir_name(self.platform, self.build_type);
        let test_runner = CommandLine::new(self.tools.test_runner.clone())
            .arg(Word(vec![
                Fragment::Var(Placeholder::Root),
                Fragment::Text("/..".to_string()),
            ]))
            .text_arg(format!("{out_dir}/{}", self.settings.executable(COMPILER)))
            .var_arg(Placeholder::Data);

        Ok(vec![
            Rule::new(RuleKind::Compile, commands.compile)
                .with_description("CC $out")
                .with_deps(self.settings.discovered_deps()),
            Rule::new(RuleKind::Link, commands.link).with_description("LINK $out"),
            Rule::new(RuleKind::BuildBootstrapTool, commands.bootstrap)
                .with_description("CC $out"),
            codegen(Platform::Windows)?,
            codegen(Platform::Linux)?,
            Rule::new(
                RuleKind::AmalgamateSources,
                CommandLine::parse(self.settings.amalgamate)?,
            )
            .with_description("AMALG $out"),
            Rule::new(RuleKind::RunTest, test_runner).with_description("TEST $in"),
            Rule::new(
                RuleKind::GenerateIncrementalTestSource,
                CommandLine::new(self.tools.scenario_compiler.clone())
                    .var_arg(Placeholder::Inputs)
                    .var_arg(Placeholder::Output),
            )
            .with_description("GEN_UPDATE_TEST_RUNNER $in"),
            Rule::new(RuleKind::CompileTestHarness, commands.harness_compile)
                .with_description("UPDATE_RUNNER_CC $out"),
            Rule::new(
                RuleKind::RunGeneratedBinary,
                CommandLine::parse("./$in")?,
            )
            .with_description("RUN_UPDATE_TEST_BINARY $in"),
            Rule::new(
                RuleKind::RegenerateSelf,
                CommandLine::new(self.tools.generator.clone()),
            )
            .with_description(format!("GEN {BUILD_FILE}"))
            .as_generator(),
        ])
    }

    fn add_compiler_nodes(&self, graph: &mut BuildGraph) {
        let bootstrap = self.bootstrap_executable();

        // Both variants are generated on every host: the amalgamation bundles
        // them so the embeddable library is portable.
        for target in Platform::ALL {
            graph.nodes.push(
                BuildNode::new(
                    RuleKind::GeneratePlatformCode(target),
                    self.generated_source(target),
                )
                .input(GraphPath::source(CODEGEN_INPUT))
                .implicit(bootstrap.clone()),
            );
        }

        // The generated unit leads the link order for its static tables.
        let host_unit = generated_unit(self.platform);
        let mut link_inputs = vec![self.host_generated_object()];
        graph.nodes.push(
            BuildNode::new(RuleKind::Compile, self.host_generated_object())
                .input(GraphPath::built(host_unit.path.clone())),
        );

        let units = core_units();
        for unit in &units {
            let object = self.object(unit.stem());
            graph.nodes.push(
                BuildNode::new(RuleKind::Compile, object.clone())
                    .input(GraphPath::source(unit.path.clone())),
            );
            link_inputs.push(object);
        }

        let mut amalgamation = BuildNode::new(
            RuleKind::AmalgamateSources,
            GraphPath::built(EMBED_SOURCE),
        )
        .output(GraphPath::built(EMBED_HEADER))
        .output(GraphPath::built(EMBED_LICENSE))
        .inputs(AMALGAMATION_HEADERS.iter().map(|h| GraphPath::source(*h)))
        .inputs(
            units
                .iter()
                .filter(|unit| unit.bundled)
                .map(|unit| GraphPath::source(unit.path.clone())),
        );
        for target in Platform::ALL {
            amalgamation = amalgamation.implicit(self.generated_source(target));
        }
        graph
            .nodes
            .push(amalgamation.implicit(GraphPath::source("build_amalg.py")));

        graph.nodes.push(
            BuildNode::new(RuleKind::Compile, self.embed_object())
                .input(GraphPath::built(EMBED_SOURCE)),
        );

        graph.nodes.push(
            BuildNode::new(RuleKind::Link, self.compiler_executable()).inputs(link_inputs),
        );

        graph.nodes.push(
            BuildNode::new(RuleKind::BuildBootstrapTool, bootstrap)
                .input(GraphPath::source("dynasm/minilua.c")),
        );
    }

    fn test_node(&self, record: &AnnotatedTest) -> Result<BuildNode> {
        let token = kiln_payload::encode(record).map_err(|source| GraphError::Payload {
            test: record.path.clone(),
            source,
        })?;
        Ok(
            BuildNode::new(RuleKind::RunTest, GraphPath::built(record.path.clone()))
                .input(GraphPath::source(format!("../{}", record.path)))
                .implicit(self.compiler_executable())
                .implicit(GraphPath::source(TEST_SUPPORT))
                .implicit(GraphPath::built(self.tools.test_runner.clone()))
                .variable("data", token),
        )
    }

    fn add_scenario_nodes(&self, graph: &mut BuildGraph, script: &str) {
        let base = scenario_basename(script);
        let harness_source = GraphPath::built(format!("{base}.runner.c"));
        let harness = self.executable(&format!("{base}.runner"));

        graph.nodes.push(
            BuildNode::new(RuleKind::GenerateIncrementalTestSource, harness_source.clone())
                .input(GraphPath::source(format!("../{script}")))
                .implicit(GraphPath::built(self.tools.scenario_compiler.clone())),
        );
        // The amalgamated header is produced with the library source, so the
        // library object already carries rebuilds; the header only has to exist.
        graph.nodes.push(
            BuildNode::new(RuleKind::CompileTestHarness, harness.clone())
                .input(harness_source)
                .input(self.embed_object())
                .order_only(GraphPath::built(EMBED_HEADER)),
        );
        graph.nodes.push(
            BuildNode::new(RuleKind::RunGeneratedBinary, GraphPath::built(script))
                .input(harness),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tools() -> ToolPaths {
        ToolPaths {
            test_runner: "/opt/kiln/kiln-testrun".to_string(),
            scenario_compiler: "/opt/kiln/kiln-scenario".to_string(),
            generator: "/opt/kiln/kiln-gen".to_string(),
        }
    }

    #[test]
    fn out_dirs_combine_codes() {
        assert_eq!(out_dir_name(Platform::Linux, BuildType::Release), "out/lr");
        assert_eq!(out_dir_name(Platform::Windows, BuildType::Sanitized), "out/wa");
    }

    #[test]
    fn scenario_harness_names_use_script_basename() {
        assert_eq!(scenario_basename("test/update_simple.scenario"), "update_simple.scenario");
    }

    #[test]
    fn host_generated_object_matches_platform() {
        let tools = tools();
        let windows = GraphBuilder::new(Platform::Windows, BuildType::Debug, &tools);
        assert_eq!(windows.host_generated_object(), GraphPath::built("codegen.w.obj"));
        let linux = GraphBuilder::new(Platform::Linux, BuildType::Debug, &tools);
        assert_eq!(linux.host_generated_object(), GraphPath::built("codegen.l.o"));
    }

    #[test]
    fn empty_inventory_still_builds_compiler() {
        let tools = tools();
        let builder = GraphBuilder::new(Platform::Linux, BuildType::Release, &tools);
        let graph = builder.build(&BTreeMap::new(), &[]).unwrap();
        assert_eq!(graph.defaults, vec![GraphPath::built("dyibicc")]);
        assert_eq!(graph.nodes_of(RuleKind::RunTest).count(), 0);
        let phony = graph.producer_of(&GraphPath::built("test")).unwrap();
        assert!(phony.inputs.is_empty());
    }
}
