use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};

const PORTFILE_PATCH: &str = "\
--- Portfile.orig
+++ Portfile
@@ -2,7 +2,7 @@
 PortSystem          1.0
 name                foo

-version             1.3.0
+version             1.4.0
 categories          net
 maintainers         nomaintainer
 description         A network monitoring daemon.
@@ -13,9 +14,8 @@

 homepage            http://example.org/software/${name}

 master_sites        ${homepage}/files/
-checksums           rmd160 f0953b21cdb5eb327e40d4b215110b71
+checksums           rmd160 01532e67a596bfff6a54aa36face26ae
 extract.suffix      .tgz
 platforms           darwin
";

fn devrank(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("devrank").unwrap();
    cmd.current_dir(dir).env_remove("DEVRANK_CONFIG").env_remove("RUST_LOG");
    cmd
}

fn write(dir: &Path, name: &str, contents: &str) -> String {
    std::fs::write(dir.join(name), contents).unwrap();
    name.to_string()
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn hunks_lists_old_intervals() {
    let dir = tempfile::tempdir().unwrap();
    let patch = write(dir.path(), "portfile.diff", PORTFILE_PATCH);
    let value = stdout_json(devrank(dir.path()).args(["hunks", &patch]));
    assert_eq!(
        value,
        json!([{"start": 2, "end": 8}, {"start": 13, "end": 21}])
    );
}

#[test]
fn hunks_reads_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let value = stdout_json(
        devrank(dir.path())
            .args(["hunks", "--full", "-"])
            .write_stdin("@@ -13,9 +14,8 @@\n"),
    );
    assert_eq!(
        value,
        json!([{"old_start": 13, "old_len": 9, "new_start": 14, "new_len": 8}])
    );
}

#[test]
fn parse_then_invert_patch() {
    let dir = tempfile::tempdir().unwrap();
    let patch = write(dir.path(), "portfile.diff", PORTFILE_PATCH);

    let parsed = stdout_json(devrank(dir.path()).args(["parse", &patch]));
    assert_eq!(parsed["deletions"], json!([{"start": 5, "end": 5}, {"start": 17, "end": 17}]));

    let inverse = stdout_json(devrank(dir.path()).args(["invert", "--patch", &patch]));
    assert_eq!(
        inverse["additions"],
        json!([{"position": 4, "length": 1}, {"position": 16, "length": 1}])
    );
    assert_eq!(
        inverse["deletions"],
        json!([{"start": 5, "end": 5}, {"start": 17, "end": 17}])
    );
}

#[test]
fn invert_json_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let diff = json!({
        "additions": [
            {"position": 7, "length": 31}, {"position": 27, "length": 3},
            {"position": 44, "length": 1}, {"position": 50, "length": 2},
            {"position": 70, "length": 1}, {"position": 77, "length": 2},
            {"position": 99, "length": 2}
        ],
        "deletions": [{"start": 32, "end": 44}, {"start": 56, "end": 70}]
    });
    let input = write(dir.path(), "diff.json", &diff.to_string());
    let inverse = stdout_json(devrank(dir.path()).args(["invert", &input]));
    assert_eq!(
        inverse["additions"],
        json!([{"position": 65, "length": 13}, {"position": 79, "length": 15}])
    );
    assert_eq!(inverse["deletions"].as_array().unwrap().len(), 7);
    assert_eq!(inverse["deletions"][6], json!({"start": 112, "end": 113}));
}

#[test]
fn invert_rejects_overlapping_deletions() {
    let dir = tempfile::tempdir().unwrap();
    let diff = json!({"additions": [], "deletions": [{"start": 1, "end": 5}, {"start": 5, "end": 8}]});
    let input = write(dir.path(), "bad.json", &diff.to_string());
    devrank(dir.path())
        .args(["invert", &input])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("overlaps the previous one"));
}

#[test]
fn attribute_straddling_deletion() {
    let dir = tempfile::tempdir().unwrap();
    let patch = write(
        dir.path(),
        "f.diff",
        "@@ -4,4 +4,1 @@\n-d\n-e\n-f\n g\n",
    );
    let functions = write(
        dir.path(),
        "functions.json",
        &json!([
            {"name": "a", "range": {"start": 1, "end": 5}},
            {"name": "b", "range": {"start": 6, "end": 9}}
        ])
        .to_string(),
    );
    let churn = stdout_json(devrank(dir.path()).args(["attribute", &patch, "--functions", &functions]));
    assert_eq!(churn, json!({"a": 2, "b": 1}));

    let stats = stdout_json(
        devrank(dir.path()).args(["attribute", &patch, "--functions", &functions, "--stats"]),
    );
    assert_eq!(stats["a"], json!({"adds": 0, "dels": 2}));
}

#[test]
fn missing_input_exits_3() {
    let dir = tempfile::tempdir().unwrap();
    devrank(dir.path())
        .args(["parse", "nope.diff"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Cannot read nope.diff"));
}

#[test]
fn malformed_graph_exits_4() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("configs")).unwrap();
    write(dir.path(), "configs/graph.json", "{\"nodes\": [");
    devrank(dir.path())
        .args(["analyze", "configs/graph.json"])
        .assert()
        .code(4);
    devrank(dir.path())
        .args(["analyze", "configs/missing.json"])
        .assert()
        .code(3);
}

#[test]
fn bad_config_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), ".devrank.toml", "[centrality]\nalpha = 3.0\n");
    let history = write(dir.path(), "history.json", "[]");
    devrank(dir.path())
        .args(["replay", &history])
        .assert()
        .code(2);
}

#[test]
fn replay_then_analyze() {
    let dir = tempfile::tempdir().unwrap();
    let history = json!([
        {
            "info": {"hexsha": "c1", "author_name": "koala", "author_email": "koala@example.org", "message": "init"},
            "changes": [{
                "old_path": null,
                "new_path": "src/main.c",
                "patch": "@@ -0,0 +1,6 @@\n+int main() {\n+  helper();\n+}\n+void helper() {\n+  work();\n+}\n",
                "new_functions": [
                    {"name": "main", "range": {"start": 1, "end": 3}},
                    {"name": "helper", "range": {"start": 4, "end": 6}}
                ],
                "calls": [{"caller": "main", "callee": "helper"}]
            }]
        },
        {
            "info": {"hexsha": "c2", "author_name": "beaver", "author_email": "beaver@example.org", "message": "tweak"},
            "seeking_mode": "normal_forward",
            "changes": [{
                "old_path": "src/main.c",
                "new_path": "src/main.c",
                "patch": "@@ -5,1 +5,2 @@\n-  work();\n+  work();\n+  more();\n",
                "functions": [
                    {"name": "main", "range": {"start": 1, "end": 3}},
                    {"name": "helper", "range": {"start": 4, "end": 6}}
                ]
            }]
        }
    ]);
    let history = write(dir.path(), "history.json", &history.to_string());

    devrank(dir.path())
        .args(["replay", &history, "--output", "graph.json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Replayed 2 commits"));

    let graph: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("graph.json")).unwrap())
            .unwrap();
    assert_eq!(graph["nodes"].as_array().unwrap().len(), 2);
    assert_eq!(graph["edges"][0]["added_by"], json!("c1"));

    let report = stdout_json(devrank(dir.path()).args(["analyze", "graph.json"]));
    assert_eq!(report["nodes"], json!(2));
    assert_eq!(report["history_mode"], json!("lines"));
    assert_eq!(report["complexity"], json!(9.0));
    let total: f64 = report["developer_devranks"]
        .as_object()
        .unwrap()
        .values()
        .map(|v| v.as_f64().unwrap())
        .sum();
    assert!((total - 1.0).abs() < 1e-9);

    devrank(dir.path())
        .args(["analyze", "graph.json", "--format", "text", "--top", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Complexity: 9.00"))
        .stdout(predicate::str::contains("Developer DevRank:"));
}
