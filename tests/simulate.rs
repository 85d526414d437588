use std::process::{Command, Output};

use serde_json::Value;

fn prbot(dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_prbot"));
    cmd.current_dir(dir)
        .env_remove("GITHUB_ACCESS_TOKEN")
        .env_remove("OPENAI_API_KEY")
        .env_remove("TEST_MODE")
        .env_remove("PRBOT_MODEL")
        .env_remove("PRBOT_GITHUB_API_URL")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn response(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not a JSON response ({e}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn write_review(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("review.json");
    std::fs::write(
        &path,
        r#"{"pullRequestDescription":"Adds a.py","feedback":"Looks fine."}"#,
    )
    .unwrap();
    path
}

#[test]
fn simulate_with_canned_review_succeeds_without_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let review = write_review(dir.path());

    let output = prbot(dir.path())
        .arg("simulate")
        .arg("--review")
        .arg(&review)
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "prbot simulate failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json = response(&output);
    assert_eq!(json["statusCode"], 200);
    assert_eq!(json["body"], "\"GitHub PR webhook processed: opened\"");
}

#[test]
fn simulate_logs_the_comment_it_would_post() {
    let dir = tempfile::tempdir().unwrap();
    let review = write_review(dir.path());
    let changeset = dir.path().join("changes.txt");
    std::fs::write(&changeset, "File: a.py\nChanges:\n+pass\n").unwrap();

    let output = prbot(dir.path())
        .args(["simulate", "--changeset"])
        .arg(&changeset)
        .arg("--review")
        .arg(&review)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("review content:\nAdds a.py\nLooks fine."), "{stderr}");
    assert!(!stderr.contains("EXPERIMENTAL: Automated Code Review"), "{stderr}");
}

#[test]
fn simulate_verbose_logs_rendered_payload() {
    let dir = tempfile::tempdir().unwrap();
    let review = write_review(dir.path());

    let output = prbot(dir.path())
        .args(["simulate", "--verbose", "--review"])
        .arg(&review)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("**EXPERIMENTAL: Automated Code Review**\n\nAdds a.py\nLooks fine."),
        "{stderr}"
    );
}

#[test]
fn simulate_without_review_needs_model_key() {
    let dir = tempfile::tempdir().unwrap();

    let output = prbot(dir.path()).arg("simulate").output().unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("OPENAI_API_KEY"));
}

#[test]
fn simulate_rejects_malformed_review_file() {
    let dir = tempfile::tempdir().unwrap();
    let review = dir.path().join("review.json");
    std::fs::write(&review, r#"{"feedback":"only half"}"#).unwrap();

    let output = prbot(dir.path())
        .arg("simulate")
        .arg("--review")
        .arg(&review)
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}
