//! End-to-end tests of the `xml-sentinel` binary against the dumps under
//! `tests/fixtures`.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Runs from an empty directory so no stray `sentinel.json` is picked up.
fn sentinel(workdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("xml-sentinel").unwrap();
    cmd.current_dir(workdir.path()).env("RUST_LOG", "warn");
    cmd
}

fn scan_json(workdir: &TempDir, fixture_name: &str, extra: &[&str]) -> Value {
    let output = sentinel(workdir)
        .arg("scan")
        .arg(fixture(fixture_name))
        .args(["--format", "json"])
        .args(extra)
        .output()
        .unwrap();
    assert!(output.status.success(), "scan failed: {:?}", output);
    serde_json::from_slice(&output.stdout).unwrap()
}

fn rule_ids(report: &Value) -> Vec<String> {
    report["findings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["detector_id"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_list_shows_every_rule() {
    let dir = TempDir::new().unwrap();
    sentinel(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("CA3075"))
        .stdout(predicate::str::contains("CA3076"))
        .stdout(predicate::str::contains("CA3077"))
        .stdout(predicate::str::contains("CWE-611"));
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();
    sentinel(&dir)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_insecure_dump_reports_each_rule() {
    let dir = TempDir::new().unwrap();
    let report = scan_json(&dir, "insecure", &[]);

    let mut ids = rule_ids(&report);
    ids.sort();
    assert_eq!(ids, vec!["CA3075", "CA3076", "CA3077"]);
    assert_eq!(report["metadata"]["files_analyzed"], 1);
    assert_eq!(report["summary"]["high"], 2);
    assert_eq!(report["summary"]["medium"], 1);

    let dtd = report["findings"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["detector_id"] == "CA3075")
        .unwrap();
    assert_eq!(dtd["file_path"], "Loader.cs");
    assert_eq!(dtd["line"], 5);
}

#[test]
fn test_secure_dump_is_clean() {
    let dir = TempDir::new().unwrap();
    let report = scan_json(&dir, "secure", &[]);
    assert_eq!(report["summary"]["total"], 0);
    assert_eq!(report["metadata"]["files_analyzed"], 1);
}

#[test]
fn test_rule_selection() {
    let dir = TempDir::new().unwrap();

    let only = scan_json(&dir, "insecure", &["--only", "CA3075"]);
    assert_eq!(rule_ids(&only), vec!["CA3075"]);

    let excluded = scan_json(&dir, "insecure", &["--exclude", "CA3075,CA3076"]);
    assert_eq!(rule_ids(&excluded), vec!["CA3077"]);

    let high = scan_json(&dir, "insecure", &["--severity", "high"]);
    assert!(!rule_ids(&high).contains(&"CA3077".to_string()));
}

#[test]
fn test_target_framework_override() {
    let dir = TempDir::new().unwrap();
    // Only the XSLT settings stay insecure on a framework with safe parser defaults.
    let report = scan_json(&dir, "insecure", &["--target-framework", "net48"]);
    assert_eq!(rule_ids(&report), vec!["CA3076"]);
}

#[test]
fn test_skip_types() {
    let dir = TempDir::new().unwrap();
    let report = scan_json(&dir, "insecure", &["--skip-types", "Legacy.Unsafe*"]);
    let ids = rule_ids(&report);
    assert_eq!(ids.len(), 2);
    assert!(!ids.contains(&"CA3077".to_string()));
}

#[test]
fn test_config_file_disables_rule() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("custom.json");
    std::fs::write(&config, r#"{ "rules": { "CA3076": { "enabled": false } } }"#).unwrap();

    let report = scan_json(&dir, "insecure", &["--config", config.to_str().unwrap()]);
    let mut ids = rule_ids(&report);
    ids.sort();
    assert_eq!(ids, vec!["CA3075", "CA3077"]);
}

#[test]
fn test_fail_on_exit_status() {
    let dir = TempDir::new().unwrap();

    sentinel(&dir)
        .arg("scan")
        .arg(fixture("insecure"))
        .args(["--format", "json", "--fail-on", "high"])
        .assert()
        .code(1);

    sentinel(&dir)
        .arg("scan")
        .arg(fixture("secure"))
        .args(["--format", "json", "--fail-on", "low"])
        .assert()
        .success();

    sentinel(&dir)
        .arg("scan")
        .arg(fixture("secure"))
        .args(["--format", "json", "--fail-on", "severe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --fail-on severity"));
}

#[test]
fn test_sarif_output() {
    let dir = TempDir::new().unwrap();
    let output = sentinel(&dir)
        .arg("scan")
        .arg(fixture("insecure"))
        .args(["--format", "sarif"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let sarif: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(sarif["version"], "2.1.0");
    assert_eq!(sarif["runs"][0]["results"].as_array().unwrap().len(), 3);
    assert_eq!(sarif["runs"][0]["tool"]["driver"]["rules"].as_array().unwrap().len(), 3);
}

#[test]
fn test_github_annotations() {
    let dir = TempDir::new().unwrap();
    sentinel(&dir)
        .arg("scan")
        .arg(fixture("insecure"))
        .args(["--format", "github"])
        .assert()
        .success()
        .stdout(predicate::str::contains("::error file=Loader.cs,line=5,"))
        .stdout(predicate::str::contains("::warning file=UnsafeDoc.cs,line=5,"));
}

#[test]
fn test_report_written_to_output_dir() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("reports");

    sentinel(&dir)
        .arg("scan")
        .arg(fixture("insecure"))
        .args(["--format", "markdown", "--output"])
        .arg(&out)
        .assert()
        .success();

    let markdown = std::fs::read_to_string(out.join("security_report.md")).unwrap();
    assert!(markdown.starts_with("# XML-Sentinel Security Report"));
    assert!(markdown.contains("[CA3076]"));
}

#[test]
fn test_malformed_dump_is_skipped() {
    let dir = TempDir::new().unwrap();
    let report = scan_json(&dir, "mixed", &[]);
    assert_eq!(report["metadata"]["files_analyzed"], 1);
    assert_eq!(rule_ids(&report), vec!["CA3077"]);
}

#[test]
fn test_missing_path_fails() {
    let dir = TempDir::new().unwrap();
    sentinel(&dir)
        .args(["scan", "does-not-exist", "--format", "json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("path does not exist"));
}

#[test]
fn test_init_writes_config_and_workflow() {
    let dir = TempDir::new().unwrap();
    sentinel(&dir)
        .args(["init", ".", "--workflow"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote configuration"));

    let config: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("sentinel.json")).unwrap())
            .unwrap();
    for id in ["CA3075", "CA3076", "CA3077"] {
        assert_eq!(config["rules"][id]["enabled"], true, "{} missing", id);
    }
    assert!(dir
        .path()
        .join(".github/workflows/xml-sentinel.yml")
        .exists());

    // A second run keeps the existing file.
    sentinel(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_diff_reports_fixed_issues() {
    let dir = TempDir::new().unwrap();
    sentinel(&dir)
        .arg("diff")
        .arg(fixture("insecure"))
        .arg(fixture("secure"))
        .assert()
        .success()
        .stdout(predicate::str::contains("[ISSUES FIXED]"))
        .stdout(predicate::str::contains("CA3077"))
        .stdout(predicate::str::contains("NEW RISKS").not());
}
