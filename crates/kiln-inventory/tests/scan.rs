//! Tests for scanning an annotated test tree.

use std::fs;
use std::path::Path;

use kiln_inventory::scan_tests;
use tempfile::TempDir;

fn temp_dir() -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    fs::create_dir_all(dir.path().join("test")).expect("create test dir");
    dir
}

fn write_test(root: &Path, name: &str, contents: &[u8]) {
    fs::write(root.join("test").join(name), contents).expect("write test");
}

#[test]
fn scans_every_test_with_its_expectations() {
    let dir = temp_dir();
    let root = dir.path();
    write_test(
        root,
        "hello.c",
        b"// TXT: hello\n// TXT: world\n#include <stdio.h>\nint main() { puts(\"hello\\nworld\"); }\n",
    );
    write_test(root, "exit.c", b"// RUN: {self}\n// RET: 2\nint main() { return 2; }\n");
    write_test(
        root,
        "skip.c",
        b"// RUN: {self}\n// RET: 9\n// TXT: never\n// DISABLED\n",
    );

    let tests = scan_tests(root).expect("scan tests");

    let paths: Vec<&str> = tests.keys().map(String::as_str).collect();
    assert_eq!(paths, vec!["test/exit.c", "test/hello.c", "test/skip.c"]);

    let hello = &tests["test/hello.c"];
    assert_eq!(hello.expected_text, "hello\nworld\n");
    assert_eq!(hello.run_args, vec!["-Itest", "test/common.c", "test/hello.c"]);
    assert!(hello.enabled);

    let exit = &tests["test/exit.c"];
    assert_eq!(exit.run_args, vec!["test/exit.c"]);
    assert_eq!(exit.expected_return_code, 2);
    assert!(exit.expected_text.is_empty());

    assert!(!tests["test/skip.c"].enabled);
}

#[test]
fn invalid_utf8_does_not_hide_directives() {
    let dir = temp_dir();
    let root = dir.path();
    write_test(root, "bytes.c", b"// RET: 7\nchar s[] = \"\xff\xfe\";\n");

    let tests = scan_tests(root).expect("scan tests");
    assert_eq!(tests["test/bytes.c"].expected_return_code, 7);
}
