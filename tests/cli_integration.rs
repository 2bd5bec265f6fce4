//! Integration tests for the command-line interface: apply, check and plan

use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

const INDEX_HTML: &str = "<script>
    const quizRegistry = {
        q1: { title: 'Signs' }
    };
    let sectionScores = {
        q1: 0
    };
    function getContentForSection(id) {
        return quizRegistry[id];
    }
    loadFromServer();
</script>
";

/// Helper to create a workspace holding an index.html
fn setup_test_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("index.html"), INDEX_HTML).unwrap();
    dir
}

fn stripper(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_legacy-stripper"))
        .args(args)
        .env_remove("LEGACY_STRIP_TARGET")
        .env("NO_COLOR", "1")
        .output()
        .unwrap()
}

#[test]
fn test_apply_help() {
    let output = stripper(&["apply", "--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Remove the planned blocks and overwrite the file"));
}

#[test]
fn test_apply_basic() {
    let workspace = setup_test_workspace();
    let file = workspace.path().join("index.html");

    let output = stripper(&["apply", "--file", file.to_str().unwrap()]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("Original file:"));
    assert!(stdout.contains("Found quizRegistry: lines ~2 to ~5"));
    assert!(stdout.contains("Found sectionScores: lines ~5 to ~8"));
    assert!(stdout.contains("Found getContentForSection: lines ~8 to ~11"));
    assert!(stdout.contains("Successfully removed 3 legacy block(s)"));

    let content = fs::read_to_string(&file).unwrap();
    assert!(content.starts_with("<script>\n        // Legacy quizRegistry removed"));
    assert!(content.ends_with("showDatabaseContent\n\n    loadFromServer();\n</script>\n"));
}

#[test]
fn test_apply_twice_fails_and_leaves_file() {
    let workspace = setup_test_workspace();
    let file = workspace.path().join("index.html");
    let file_arg = file.to_str().unwrap();

    assert!(stripper(&["apply", "--file", file_arg]).status.success());
    let after_first = fs::read_to_string(&file).unwrap();

    let output = stripper(&["apply", "--file", file_arg]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("quizRegistry not found"));
    assert!(stderr.contains("no changes written"));

    assert_eq!(fs::read_to_string(&file).unwrap(), after_first);
}

#[test]
fn test_apply_dry_run() {
    let workspace = setup_test_workspace();
    let file = workspace.path().join("index.html");

    let output = stripper(&["apply", "--dry-run", "--diff", "--file", file.to_str().unwrap()]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DRY RUN"));
    assert!(stdout.contains("-    const quizRegistry = {"));
    assert_eq!(fs::read_to_string(&file).unwrap(), INDEX_HTML);
}

#[test]
fn test_check_does_not_modify() {
    let workspace = setup_test_workspace();
    let file = workspace.path().join("index.html");

    let output = stripper(&["check", "--file", file.to_str().unwrap()]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("all 3 anchor(s) located"));
    assert_eq!(fs::read_to_string(&file).unwrap(), INDEX_HTML);
}

#[test]
fn test_check_missing_anchor_fails() {
    let workspace = setup_test_workspace();
    let file = workspace.path().join("index.html");
    let broken = INDEX_HTML.replace("let sectionScores", "let scores");
    fs::write(&file, &broken).unwrap();

    let output = stripper(&["check", "--file", file.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("sectionScores not found"));
    assert!(stderr.contains("CONFLICT"));
}

#[test]
fn test_target_from_environment() {
    let workspace = setup_test_workspace();
    let file = workspace.path().join("index.html");

    let output = Command::new(env!("CARGO_BIN_EXE_legacy-stripper"))
        .args(["check"])
        .env("LEGACY_STRIP_TARGET", &file)
        .env("NO_COLOR", "1")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&format!("File: {}", file.display())));
}

#[test]
fn test_apply_with_plan_file() {
    let workspace = setup_test_workspace();
    let plan = workspace.path().join("plan.toml");
    fs::write(
        &plan,
        r#"
[meta]
name = "scores-only"

[target]
file = "index.html"

[template]
indent = "    "
blank_line_after = false
lines = ["// scores moved to the database"]

[[anchors]]
name = "sectionScores"
kind = "object-literal"

[anchors.locate]
type = "literal"
text = "let sectionScores = {"
"#,
    )
    .unwrap();

    let output = stripper(&["apply", "--plan", plan.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let content = fs::read_to_string(workspace.path().join("index.html")).unwrap();
    assert!(content.contains("    };\n        // scores moved to the database\n    function"));
    assert!(content.contains("const quizRegistry = {"));
}

#[test]
fn test_plan_lists_builtin_anchors() {
    let output = stripper(&["plan"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("legacy-cleanup"));
    assert!(stdout.contains("1. quizRegistry [object literal]"));
    assert!(stdout.contains("3. getContentForSection [function declaration] pattern /"));
    assert!(stdout.contains("Legacy sectionScores removed"));
}

#[test]
fn test_apply_warns_on_undecodable_bytes() {
    let workspace = setup_test_workspace();
    let file = workspace.path().join("index.html");
    let mut bytes = b"<!-- caf\xe9 -->\n".to_vec();
    bytes.extend_from_slice(INDEX_HTML.as_bytes());
    fs::write(&file, &bytes).unwrap();

    let output = stripper(&["apply", "--file", file.to_str().unwrap()]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Note: ignored 1 undecodable byte(s)"));

    let content = fs::read_to_string(&file).unwrap();
    assert!(content.starts_with("<!-- caf -->\n<script>\n"));
    assert!(!content.contains("const quizRegistry = {"));
}

fn write_index_with_gap(workspace: &TempDir) -> std::path::PathBuf {
    let file = workspace.path().join("index.html");
    let with_gap = INDEX_HTML.replace(
        "    let sectionScores",
        "    keep();\n    let sectionScores",
    );
    fs::write(&file, with_gap).unwrap();
    file
}

#[test]
fn test_apply_discard_gaps_warns_and_drops_text() {
    let workspace = setup_test_workspace();
    let file = write_index_with_gap(&workspace);

    let output = stripper(&["apply", "--gaps", "discard", "--file", file.to_str().unwrap()]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Warning: discarding"));

    let content = fs::read_to_string(&file).unwrap();
    assert!(!content.contains("keep();"));
    assert!(content.ends_with("showDatabaseContent\n\n    loadFromServer();\n</script>\n"));
}

#[test]
fn test_apply_preserve_gaps_keeps_text() {
    let workspace = setup_test_workspace();
    let file = write_index_with_gap(&workspace);

    let output = stripper(&["apply", "--gaps", "preserve", "--file", file.to_str().unwrap()]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("Warning: discarding"));

    let content = fs::read_to_string(&file).unwrap();
    assert!(content.contains("showDatabaseContent\n\n        keep();\n    loadFromServer();"));
}
