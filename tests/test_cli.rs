
use fixtures::*;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn innorebuild() -> Command {
    Command::new(assert_cmd::cargo_bin!("innorebuild"))
}

#[test]
fn test_inspect_prints_json_lines() {
    let output = innorebuild()
        .args(["inspect", sample_manifest().to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let lines: Vec<Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(lines[0]["metadata"]["AppName"], "Sample Tool");
    assert!(lines[0]["metadata"].get("AppComments").is_none());

    let entries: Vec<&Value> = lines.iter().filter(|l| l.get("entry").is_some()).collect();
    assert_eq!(entries.len(), 7);
    assert_eq!(entries[1]["entry"]["check"], "InstallARM64");

    let variants: Vec<(String, String)> = lines
        .iter()
        .filter_map(|l| l.get("variant"))
        .map(|v| {
            (
                v["token"].as_str().unwrap().to_owned(),
                v["category"].as_str().unwrap().to_owned(),
            )
        })
        .collect();
    assert_eq!(
        variants,
        vec![
            ("1".to_owned(), "x64".to_owned()),
            ("2".to_owned(), "ARM64".to_owned()),
            ("3".to_owned(), "Other".to_owned()),
        ]
    );
    assert!(lines.iter().all(|l| l.get("conflict").is_none()));
}

#[test]
fn test_inspect_with_extra_check_rule() {
    let d = tempdir().unwrap();
    let script = d.path().join("install_script.iss");
    fs::write(
        &script,
        "[Files]\nSource: \"{app}\\a,4.dll\"; DestDir: \"{app}\"; DestName: \"a.dll\"; Check: \"InstallX86\";\n",
    )
    .unwrap();

    innorebuild()
        .args(["inspect", "--check", "InstallX86=x86", script.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"{"variant":{"token":"4","category":"x86"}}"#,
        ));
}

#[test]
fn test_inspect_missing_manifest_fails() {
    let d = tempdir().unwrap();
    let missing = d.path().join("install_script.iss");

    innorebuild()
        .args(["inspect", missing.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("failed to load manifest"));
}

#[test]
fn test_invalid_check_rule_is_rejected() {
    innorebuild()
        .args([
            "inspect",
            "--check",
            "InstallX86",
            sample_manifest().to_str().unwrap(),
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("expected CHECK=CATEGORY"));
}

#[test]
fn test_split_creates_output_directories() {
    let d = tempdir().unwrap();
    let extracted = d.path().join("setup_extracted");
    write_sample_extraction(&extracted);
    let out = d.path().join("out");

    innorebuild()
        .args([
            "split",
            extracted.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "--no-log-file",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("App Name: Sample Tool"))
        .stdout(predicate::str::contains("App Comments: N/A"))
        .stdout(predicate::str::contains("Variant 2 -> ARM64"))
        .stdout(predicate::str::contains(
            "Skipped 1 declared file(s) missing from the extraction",
        ));

    for category in ["x64", "ARM64", "Other", "Unknown"] {
        assert!(out.join(format!("Output_{category}")).is_dir(), "{category}");
    }
    assert_eq!(
        fs::read(out.join("Output_ARM64").join("app").join("tool.exe")).unwrap(),
        b"tool arm64"
    );
}

#[test]
fn test_split_writes_log_file() {
    let d = tempdir().unwrap();
    let extracted = d.path().join("setup_extracted");
    write_sample_extraction(&extracted);
    let log = d.path().join("run.log");

    innorebuild()
        .args([
            "split",
            extracted.to_str().unwrap(),
            "--output-prefix",
            "Build_",
            "--log-file",
            log.to_str().unwrap(),
        ])
        .assert()
        .success();

    // Defaults to the parent of the extracted directory.
    assert!(d.path().join("Build_x64").is_dir());
    let contents = fs::read_to_string(&log).unwrap();
    assert!(contents.contains("fan-out finished"), "{contents}");
}

#[test]
fn test_split_requires_a_directory() {
    let d = tempdir().unwrap();

    innorebuild()
        .args(["split", d.path().join("nope").to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("is not a directory"));
}

#[test]
fn test_unpack_missing_installer_fails() {
    let d = tempdir().unwrap();

    innorebuild()
        .args([
            "unpack",
            d.path().join("setup.exe").to_str().unwrap(),
            "-o",
            d.path().to_str().unwrap(),
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_unpack_reports_failing_stage() {
    let d = tempdir().unwrap();
    let installer = d.path().join("setup.exe");
    fs::write(&installer, b"MZ").unwrap();
    let tool = d.path().join("bin").join("innounp.exe");

    innorebuild()
        .args([
            "unpack",
            installer.to_str().unwrap(),
            "--innounp",
            tool.to_str().unwrap(),
            "-o",
            d.path().to_str().unwrap(),
            "--no-log-file",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("extraction stage failed"));
}
