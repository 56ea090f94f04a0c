//! Runner behaviour against stand-in compilers.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use kiln_cli::testrun::{execute, run};
use kiln_model::AnnotatedTest;

fn fake_compiler(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fakecc");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn token(record: &AnnotatedTest) -> String {
    kiln_payload::encode(record).unwrap()
}

#[test]
fn matching_output_and_code_pass() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = fake_compiler(dir.path(), "printf 'hello\\n'\nexit 3");
    let mut record = AnnotatedTest::new("test/hello.c");
    record.expected_text = "hello\n".to_string();
    record.expected_return_code = 3;
    assert_eq!(run(dir.path(), &compiler, &token(&record)).unwrap(), 0);
}

#[test]
fn mismatches_map_to_distinct_statuses() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = fake_compiler(dir.path(), "printf 'other\\n'\nexit 2");

    let mut text = AnnotatedTest::new("test/a.c");
    text.expected_text = "hello\n".to_string();
    text.expected_return_code = 2;
    assert_eq!(run(dir.path(), &compiler, &token(&text)).unwrap(), 1);

    let mut code = AnnotatedTest::new("test/b.c");
    code.expected_return_code = 0;
    assert_eq!(run(dir.path(), &compiler, &token(&code)).unwrap(), 2);

    code.expected_return_code = 2;
    assert_eq!(run(dir.path(), &compiler, &token(&code)).unwrap(), 0);
}

#[test]
fn arguments_and_working_directory_come_from_the_record() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "").unwrap();
    let compiler = fake_compiler(dir.path(), "test -f marker.txt || exit 9\necho \"$@\"");
    let mut record = AnnotatedTest::new("test/args.c");
    record.run_args = vec!["-Itest".into(), "test/common.c".into(), "test/args.c".into()];
    record.expected_text = "-Itest test/common.c test/args.c\n".to_string();
    let observed = execute(dir.path(), Path::new("fakecc"), &record).unwrap();
    assert_eq!(observed.return_code, 0);
    assert_eq!(observed.stdout.as_deref(), Some("-Itest test/common.c test/args.c\n"));
}

#[test]
fn signals_are_negative_return_codes() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = fake_compiler(dir.path(), "kill -SEGV $$");
    let record = AnnotatedTest::new("test/crash.c");
    let observed = execute(dir.path(), &compiler, &record).unwrap();
    assert_eq!(observed.return_code, -11);
}

#[test]
fn bad_tokens_and_missing_compilers_are_errors() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = fake_compiler(dir.path(), "exit 0");
    assert!(run(dir.path(), &compiler, "not hex").is_err());
    let record = AnnotatedTest::new("test/a.c");
    assert!(run(dir.path(), &dir.path().join("missing"), &token(&record)).is_err());
}

#[test]
fn relative_root_is_resolved_from_the_build_directory() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("proj");
    std::fs::create_dir_all(project.join("src")).unwrap();
    let build_dir = project.join("out/lr");
    std::fs::create_dir_all(&build_dir).unwrap();
    std::fs::write(project.join("marker.txt"), "").unwrap();
    let compiler = build_dir.join("dyibicc");
    std::fs::write(&compiler, "#!/bin/sh\ntest -f marker.txt || exit 9\nexit 0\n").unwrap();
    std::fs::set_permissions(&compiler, std::fs::Permissions::from_mode(0o755)).unwrap();

    // Ninja runs the runner from out/<cell> with `$root/..` as the root.
    std::env::set_current_dir(&build_dir).unwrap();
    let record = AnnotatedTest::new("test/a.c");
    let status = run(
        Path::new("../../src/.."),
        Path::new("out/lr/dyibicc"),
        &token(&record),
    )
    .unwrap();
    assert_eq!(status, 0);
}
