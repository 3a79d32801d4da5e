use std::{
    path::{Path, PathBuf},
    process::{Command, Output},
};

use serde_json::Value;

fn codecover_bin() -> PathBuf {
    if let Ok(bin) = std::env::var("CARGO_BIN_EXE_codecover") {
        return PathBuf::from(bin);
    }

    let mut path = std::env::current_exe().unwrap();
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.push("codecover");

    if cfg!(windows) {
        path.set_extension("exe");
    }

    path
}

fn run(data_dir: &Path, args: &[&str]) -> Output {
    Command::new(codecover_bin())
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--quiet")
        .args(args)
        .env_remove("CODECOVER_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn json(output: &Output) -> Value {
    serde_json::from_str(&stdout(output)).unwrap()
}

fn seed(data_dir: &Path) {
    stdout(&run(
        data_dir,
        &["add", "Doc 1", "--date", "2024-01-01", "--codes", "A, B"],
    ));
    stdout(&run(
        data_dir,
        &["add", "Doc 2", "--date", "2023-01-01", "--codes", "C"],
    ));
    stdout(&run(
        data_dir,
        &["add", "Doc 3", "--date", "2022-01-01", "--codes", "A B C"],
    ));
}

#[test]
fn cover_picks_single_document_covering_everything() {
    let tmp = tempfile::tempdir().unwrap();
    seed(tmp.path());

    let result = json(&run(tmp.path(), &["cover", "a;b, c", "--json"]));
    let selections = result["selections"].as_array().unwrap();
    assert_eq!(selections.len(), 1);
    assert_eq!(selections[0]["document"]["name"], "Doc 3");
    assert_eq!(
        selections[0]["codesCovered"],
        serde_json::json!(["A", "B", "C"])
    );
    assert_eq!(result["uncovered"], serde_json::json!([]));
}

#[test]
fn cover_reports_missing_codes_in_text_mode() {
    let tmp = tempfile::tempdir().unwrap();
    seed(tmp.path());

    let text = stdout(&run(tmp.path(), &["cover", "a zz"]));
    assert!(text.contains("Doc 1"), "{text}");
    assert!(text.contains("Not found: ZZ"), "{text}");
}

#[test]
fn cover_rejects_empty_request() {
    let tmp = tempfile::tempdir().unwrap();
    let output = run(tmp.path(), &["cover", " ,; "]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no codes given"), "{stderr}");
}

#[test]
fn prefix_and_search() {
    let tmp = tempfile::tempdir().unwrap();
    seed(tmp.path());
    stdout(&run(tmp.path(), &["add", "Doc 4", "--codes", "AB-1 AB-2"]));

    let codes = json(&run(tmp.path(), &["prefix", "ab", "--json"]));
    assert_eq!(codes, serde_json::json!(["AB-1", "AB-2"]));

    let codes =
        json(&run(tmp.path(), &["prefix", "ab", "-n", "1", "--json"]));
    assert_eq!(codes, serde_json::json!(["AB-1"]));

    let docs = json(&run(
        tmp.path(),
        &["search", "a", "--mode", "exact", "--json"],
    ));
    let names: Vec<_> = docs
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["Doc 1", "Doc 3"]);

    let docs = json(&run(
        tmp.path(),
        &["search", "c,", "--mode", "exact", "--json"],
    ));
    assert_eq!(docs.as_array().unwrap().len(), 2);
}

#[test]
fn edit_sets_and_clears_date() {
    let tmp = tempfile::tempdir().unwrap();
    stdout(&run(tmp.path(), &["add", "Manual", "--codes", "m1"]));

    stdout(&run(tmp.path(), &["edit", "1", "--date", "2023-09-09"]));
    let doc = json(&run(tmp.path(), &["get", "1", "--json"]));
    assert_eq!(doc["date"], "2023-09-09");

    stdout(&run(tmp.path(), &["edit", "1", "--clear-date"]));
    let doc = json(&run(tmp.path(), &["get", "1", "--json"]));
    assert!(doc["date"].is_null());
    assert_eq!(doc["codes"], serde_json::json!(["M1"]));

    let output = run(tmp.path(), &["edit", "1"]);
    assert!(!output.status.success());
}

#[test]
fn config_prefix_limit_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    stdout(&run(tmp.path(), &["config", "set", "prefix-limit", "5"]));

    let settings = json(&run(tmp.path(), &["config", "show", "--json"]));
    assert_eq!(settings["prefix_limit"], 5);

    let output = run(tmp.path(), &["config", "set", "prefix-limit", "0"]);
    assert!(!output.status.success());
}

#[test]
fn import_then_list_and_remove() {
    let tmp = tempfile::tempdir().unwrap();
    let file = tmp.path().join("docs.json");
    std::fs::write(
        &file,
        r#"[
            {"name": "Old", "date": "2020-05-01", "codes": ["x1, x2"]},
            {"name": "New", "date": "2024-05-01", "path": "new.pdf", "codes": ["x3"]}
        ]"#,
    )
    .unwrap();

    stdout(&run(tmp.path(), &["import", file.to_str().unwrap()]));

    let docs = json(&run(tmp.path(), &["list", "--json"]));
    assert_eq!(docs.as_array().unwrap().len(), 2);

    let status = json(&run(tmp.path(), &["status", "--json"]));
    assert_eq!(status["documents"], 2);
    assert_eq!(status["codes"], 3);

    stdout(&run(tmp.path(), &["remove", "#1"]));
    let output = run(tmp.path(), &["get", "1"]);
    assert!(!output.status.success());
}
