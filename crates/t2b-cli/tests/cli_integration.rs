//! Integration tests for the `t2b` binary.

use std::path::Path;
use std::process::{Command, Output};
use t2b_classfile::classfile::annotations_mut_or_insert;
use t2b_classfile::{access, Annotation, ClassFile, Visibility};

fn t2b(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_t2b"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to run t2b")
}

fn write_test_class(root: &Path) {
    let mut class = ClassFile::new("com/acme/CalcTest", "java/lang/Object").unwrap();
    class.access_flags = access::PUBLIC | access::SUPER;
    class.add_method(access::PUBLIC, "<init>", "()V").unwrap();
    let position = class.add_method(access::PUBLIC, "testAdd", "()V").unwrap();
    class.add_method(access::PUBLIC, "helper", "()V").unwrap();

    let annotation = Annotation {
        type_index: class.constant_pool.add_utf8("Lorg/junit/Test;").unwrap(),
        elements: Vec::new(),
    };
    let method = &mut class.methods[position];
    annotations_mut_or_insert(&mut method.attributes, Visibility::Visible, &mut class.constant_pool)
        .unwrap()
        .add(annotation);

    let path = root.join("classes/com/acme/CalcTest.class");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, class.encode()).unwrap();
}

#[test]
fn test_transform_json_report() {
    let dir = tempfile::tempdir().unwrap();
    write_test_class(dir.path());

    let output = t2b(
        dir.path(),
        &["transform", "--classes", "classes", "--out", "out", "--json", "-D", "t2b.session.id=s1"],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["unit"], "com.acme.CalcTest");
    assert_eq!(reports[0]["output"], "com.acme.CalcTestBenchmarkByT2B");
    assert_eq!(reports[0]["benchmarks"][0], "com.acme.CalcTestBenchmarkByT2B.testAdd()V");
    assert!(dir.path().join("out/com/acme/CalcTestBenchmarkByT2B.class").is_file());
}

#[test]
fn test_transform_custom_suffix() {
    let dir = tempfile::tempdir().unwrap();
    write_test_class(dir.path());

    let output = t2b(
        dir.path(),
        &["transform", "--classes", "classes", "--out", "out", "--suffix", "Bench"],
    );
    assert!(output.status.success());
    assert!(dir.path().join("out/com/acme/CalcTestBench.class").is_file());
    assert!(String::from_utf8_lossy(&output.stdout).contains("1 class(es), 1 benchmark(s)"));
}

#[test]
fn test_resolve_templates() {
    let dir = tempfile::tempdir().unwrap();
    let output = t2b(
        dir.path(),
        &[
            "resolve",
            "-D",
            "run.id=42",
            "${sys#run.id}",
            "${env#T2B_CLI_TEST_UNSET_VARIABLE}:default-tag}",
            "${class.name}",
        ],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().collect::<Vec<_>>(), ["42", "default-tag", "-"]);
}

#[test]
fn test_resolve_configured_entries() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("meta.properties"), "method.owner=${sys#user}\n").unwrap();

    let output = t2b(
        dir.path(),
        &["resolve", "--config", "meta.properties", "-D", "user=dev", "-D", "t2b.session.id=s9"],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.lines().any(|l| l == "owner=dev"));
    assert!(stdout.lines().any(|l| l == "session=s9"));
    assert!(stdout.lines().any(|l| l == "wrappedApiMethodName=-"));
}

#[test]
fn test_invalid_property_assignment() {
    let dir = tempfile::tempdir().unwrap();
    let output = t2b(dir.path(), &["resolve", "-D", "=oops", "x"]);
    assert!(!output.status.success());
}
