use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Command running against the stub provider with state kept in `dir`
fn stub_cmd(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("idea-validator");
    cmd.current_dir(dir.path())
        .env("IDEA_VALIDATOR__PROVIDER__DEFAULT", "stub")
        .env(
            "IDEA_VALIDATOR__GENERAL__DATABASE_PATH",
            dir.path().join("ideas.sqlite"),
        )
        .env(
            "IDEA_VALIDATOR__GENERAL__OUTBOX_PATH",
            dir.path().join("outbox.jsonl"),
        );
    cmd
}

fn analyze_json(dir: &TempDir, extra: &[&str]) -> Value {
    let output = stub_cmd(dir)
        .args(["analyze", "--idea", "A marketplace for freelance chefs", "--json"])
        .args(extra)
        .output()
        .expect("run analyze");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

fn write_json(path: &Path, value: Value) {
    fs::write(path, serde_json::to_string(&value).expect("json")).expect("write json");
}

#[test]
fn config_init_writes_example_file() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("config.toml");

    let mut cmd = cargo_bin_cmd!("idea-validator");
    cmd.args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .success();

    let content = fs::read_to_string(&config_path).expect("read config");
    assert!(content.contains("[provider]"));
    assert!(content.contains("starting_credits = 3"));

    let mut again = cargo_bin_cmd!("idea-validator");
    again
        .args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn analyze_outputs_full_report_json() {
    let dir = TempDir::new().expect("temp dir");
    let report = analyze_json(&dir, &[]);

    assert_eq!(report["originalIdea"], "A marketplace for freelance chefs");
    assert_eq!(report["summaryVerdict"], "NeedsRefinement");
    assert_eq!(report["viabilityScore"], 55);
    for field in [
        "id",
        "createdAt",
        "oneLineTakeaway",
        "marketReality",
        "pros",
        "cons",
        "competitors",
        "monetizationStrategies",
        "whyPeoplePay",
        "nextSteps",
    ] {
        assert!(report.get(field).is_some(), "missing {}", field);
    }
}

#[test]
fn analyze_requires_input() {
    let dir = TempDir::new().expect("temp dir");

    stub_cmd(&dir)
        .arg("analyze")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--idea"));
}

#[test]
fn analyze_rejects_pdf_for_openai_before_network() {
    let dir = TempDir::new().expect("temp dir");
    let deck = dir.path().join("deck.pdf");
    fs::write(&deck, b"%PDF-1.4").expect("write pdf");

    let mut cmd = cargo_bin_cmd!("idea-validator");
    cmd.current_dir(dir.path())
        .env("IDEA_VALIDATOR_TEST_OPENAI_KEY", "sk-test")
        .args([
            "analyze",
            "--idea",
            "Chef marketplace",
            "--provider",
            "openai",
            "--api-key-env",
            "IDEA_VALIDATOR_TEST_OPENAI_KEY",
            "--attach",
        ])
        .arg(&deck)
        .assert()
        .failure()
        .stderr(predicate::str::contains("OpenAI does not support pdf attachments"));
}

#[test]
fn chat_answers_about_saved_report() {
    let dir = TempDir::new().expect("temp dir");
    let report = analyze_json(&dir, &[]);
    let report_path = dir.path().join("report.json");
    write_json(&report_path, report);

    stub_cmd(&dir)
        .args(["chat", "--message", "Where should I launch first?", "--report"])
        .arg(&report_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Stub reply"));
}

#[test]
fn account_flow_charges_credits_and_queues_email() {
    let dir = TempDir::new().expect("temp dir");

    let profile = dir.path().join("profile.json");
    write_json(
        &profile,
        serde_json::json!({
            "subjectId": "oauth-123",
            "email": "ada@example.com",
            "name": "Ada",
            "pictureUrl": null
        }),
    );

    stub_cmd(&dir)
        .args(["account", "sign-in", "--profile"])
        .arg(&profile)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 credits"));

    analyze_json(&dir, &["--user", "ada@example.com", "--notify"]);

    let output = stub_cmd(&dir)
        .args(["account", "show", "--email", "ada@example.com", "--json"])
        .output()
        .expect("run account show");
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["user"]["credits"], 2);
    assert_eq!(value["reports"].as_array().map(Vec::len), Some(1));

    let outbox = fs::read_to_string(dir.path().join("outbox.jsonl")).expect("read outbox");
    assert!(outbox.contains("ada@example.com"));

    let event = dir.path().join("event.json");
    write_json(
        &event,
        serde_json::json!({
            "customerEmail": "ada@example.com",
            "planType": "credits_5",
            "paymentStatus": "paid"
        }),
    );

    stub_cmd(&dir)
        .args(["account", "apply-payment", "--event"])
        .arg(&event)
        .assert()
        .success()
        .stdout(predicate::str::contains("7 credits"));
}

#[test]
fn analyze_for_unknown_user_fails() {
    let dir = TempDir::new().expect("temp dir");

    stub_cmd(&dir)
        .args([
            "analyze",
            "--idea",
            "Chef marketplace",
            "--user",
            "nobody@example.com",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No account found"));
}

#[test]
fn doctor_reports_ok_with_stub_provider() {
    let dir = TempDir::new().expect("temp dir");

    let output = stub_cmd(&dir)
        .args(["doctor", "--json"])
        .output()
        .expect("run doctor");
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["provider"]["status"], "ok");
    assert_eq!(value["overall"], "ok");
}

#[test]
fn waitlist_join_dedupes_and_queues_one_confirmation() {
    let dir = TempDir::new().expect("temp dir");

    let output = stub_cmd(&dir)
        .args([
            "waitlist",
            "join",
            "--email",
            "Ada@Example.com",
            "--name",
            "Ada",
            "--json",
        ])
        .output()
        .expect("run waitlist join");
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["entry"]["email"], "ada@example.com");
    assert_eq!(value["newlyJoined"], true);
    assert_eq!(value["confirmationSent"], true);

    stub_cmd(&dir)
        .args(["waitlist", "join", "--email", "ada@example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already on the waitlist"));

    stub_cmd(&dir)
        .args(["waitlist", "count"])
        .assert()
        .success()
        .stdout("1\n");

    let outbox = fs::read_to_string(dir.path().join("outbox.jsonl")).expect("read outbox");
    assert_eq!(outbox.lines().count(), 1);
    assert!(outbox.contains("waitlist"));
}

#[test]
fn waitlist_rejects_invalid_email() {
    let dir = TempDir::new().expect("temp dir");

    stub_cmd(&dir)
        .args(["waitlist", "join", "--email", "not-an-email"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid email address"));
}
