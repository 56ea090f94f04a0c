//! End-to-end checks on assembled graphs.

use std::collections::BTreeMap;

use kiln_graph::{
    BuildGraph, GraphBuilder, GraphPath, RuleKind, ShellStyle, ToolPaths, render_ninja,
    write_ninja,
};
use kiln_model::{AnnotatedTest, BuildType, CORE_SOURCES, Platform};

fn tools() -> ToolPaths {
    ToolPaths {
        test_runner: "/opt/kiln/kiln-testrun".to_string(),
        scenario_compiler: "/opt/kiln/kiln-scenario".to_string(),
        generator: "/opt/kiln/kiln-gen".to_string(),
    }
}

fn inventory() -> BTreeMap<String, AnnotatedTest> {
    let mut arith = AnnotatedTest::new("test/arith.c");
    arith.run_args = vec!["-Itest".into(), "test/common.c".into(), "test/arith.c".into()];
    let mut printing = AnnotatedTest::new("test/printf.c");
    printing.run_args = arith.run_args.clone();
    printing.expected_text = "hello\n".to_string();
    let mut broken = AnnotatedTest::new("test/broken.c");
    broken.enabled = false;
    [arith, printing, broken]
        .into_iter()
        .map(|record| (record.path.clone(), record))
        .collect()
}

fn scenarios() -> Vec<String> {
    vec!["test/update_simple.scenario".to_string()]
}

fn build(platform: Platform) -> BuildGraph {
    let tools = tools();
    GraphBuilder::new(platform, BuildType::Debug, &tools)
        .build(&inventory(), &scenarios())
        .unwrap()
}

#[test]
fn link_contains_host_generated_object_and_every_core_object() {
    for (platform, obj) in [(Platform::Linux, ".o"), (Platform::Windows, ".obj")] {
        let graph = build(platform);
        let link: Vec<_> = graph.nodes_of(RuleKind::Link).collect();
        assert_eq!(link.len(), 1);
        let mut expected = vec![GraphPath::built(format!("codegen.{}{obj}", platform.code()))];
        expected.extend(CORE_SOURCES.iter().map(|src| {
            GraphPath::built(format!("{}{obj}", src.trim_end_matches(".c")))
        }));
        assert_eq!(link[0].inputs, expected, "{platform}");
    }
}

#[test]
fn only_host_variant_is_compiled_but_both_are_generated() {
    let graph = build(Platform::Linux);
    assert!(graph.producer_of(&GraphPath::built("codegen.l.o")).is_some());
    assert!(graph.producer_of(&GraphPath::built("codegen.w.o")).is_none());
    assert!(graph.producer_of(&GraphPath::built("codegen.w.c")).is_some());
    assert!(graph.producer_of(&GraphPath::built("codegen.l.c")).is_some());
}

#[test]
fn bootstrap_precedes_code_generation_which_precedes_amalgamation() {
    let graph = build(Platform::Windows);
    let minilua = GraphPath::built("minilua.exe");
    for generated in ["codegen.w.c", "codegen.l.c"] {
        let node = graph.producer_of(&GraphPath::built(generated)).unwrap();
        assert!(graph.depends_on(node, &minilua), "{generated}");
    }
    let amalgamation = graph
        .producer_of(&GraphPath::built("embed/libdyibicc.c"))
        .unwrap();
    assert!(graph.depends_on(amalgamation, &GraphPath::built("codegen.w.c")));
    assert!(graph.depends_on(amalgamation, &GraphPath::built("codegen.l.c")));
    assert!(
        amalgamation
            .outputs
            .contains(&GraphPath::built("embed/libdyibicc.h"))
    );
}

#[test]
fn amalgamation_skips_the_entry_unit() {
    let graph = build(Platform::Linux);
    let amalgamation = graph
        .producer_of(&GraphPath::built("embed/libdyibicc.c"))
        .unwrap();
    assert!(!amalgamation.inputs.contains(&GraphPath::source("entry.c")));
    assert!(amalgamation.inputs.contains(&GraphPath::source("parse.c")));
}

#[test]
fn disabled_tests_produce_no_node() {
    let graph = build(Platform::Linux);
    let tests: Vec<String> = graph.nodes_of(RuleKind::RunTest).map(|n| n.id()).collect();
    assert_eq!(tests, vec!["test/arith.c", "test/printf.c"]);
    let alias = graph.producer_of(&GraphPath::built("test")).unwrap();
    assert!(!alias.inputs.contains(&GraphPath::built("test/broken.c")));
}

#[test]
fn test_nodes_need_compiler_support_file_and_runner() {
    let graph = build(Platform::Linux);
    let node = graph
        .producer_of(&GraphPath::built("test/printf.c"))
        .unwrap();
    assert!(graph.depends_on(node, &GraphPath::built("dyibicc")));
    assert!(graph.depends_on(node, &GraphPath::source("../test/common.c")));
    assert!(graph.depends_on(node, &GraphPath::built("/opt/kiln/kiln-testrun")));

    let (name, token) = &node.variables[0];
    assert_eq!(name, "data");
    let decoded = kiln_payload::decode(token).unwrap();
    assert_eq!(decoded, inventory()["test/printf.c"]);
}

#[test]
fn harness_waits_for_library_and_header() {
    let graph = build(Platform::Linux);
    let harness = graph
        .producer_of(&GraphPath::built("update_simple.scenario.runner"))
        .unwrap();
    assert!(graph.depends_on(harness, &GraphPath::built("libdyibicc.o")));
    assert!(graph.depends_on(harness, &GraphPath::built("embed/libdyibicc.h")));
    assert!(graph.depends_on(harness, &GraphPath::built("codegen.w.c")));

    let run = graph
        .producer_of(&GraphPath::built("test/update_simple.scenario"))
        .unwrap();
    assert_eq!(run.rule, RuleKind::RunGeneratedBinary);
    assert!(graph.depends_on(run, &GraphPath::built("/opt/kiln/kiln-scenario")));
}

#[test]
fn rendered_manifest_has_expected_lines() {
    let graph = build(Platform::Linux);
    let text = render_ninja(&graph, ShellStyle::Posix);
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "root = ../../src");
    for expected in [
        "  command = ./minilua $root/dynasm/dynasm.lua -D WIN -o $out $in",
        "  command = /opt/kiln/kiln-testrun $root/.. out/ld/dyibicc $data",
        "  command = /opt/kiln/kiln-scenario $in $out",
        "  command = ./$in",
        "  deps = gcc",
        "  depfile = $out.d",
        "  generator = 1",
        "build codegen.l.c: codegen_l $root/codegen.in.c | minilua",
        "build test/arith.c: testrun $root/../test/arith.c | dyibicc $root/../test/common.c /opt/kiln/kiln-testrun",
        "build update_simple.scenario.runner: harness_cc update_simple.scenario.runner.c libdyibicc.o || embed/libdyibicc.h",
        "build test/update_simple.scenario: runbin update_simple.scenario.runner",
        "build test: phony test/arith.c test/printf.c test/update_simple.scenario",
        "build build.ninja: regen | /opt/kiln/kiln-gen",
        "default dyibicc",
    ] {
        assert!(lines.contains(&expected), "missing line {expected:?}\n{text}");
    }
    assert!(!text.contains("broken"));
}

#[test]
fn windows_manifest_uses_msvc_dependency_discovery() {
    let graph = build(Platform::Windows);
    let text = render_ninja(&graph, ShellStyle::Windows);
    assert!(text.contains("  deps = msvc\n"));
    assert!(!text.contains("depfile"));
    assert!(text.contains("build dyibicc.exe: link codegen.w.obj type.obj alloc.obj"));
}

#[test]
fn manifest_is_written_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("build.ninja");
    let graph = build(Platform::Linux);
    write_ninja(&path, &graph, ShellStyle::Posix).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, render_ninja(&graph, ShellStyle::Posix));
}
