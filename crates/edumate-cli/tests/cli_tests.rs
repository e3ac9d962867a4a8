//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Run in `dir` with a private HOME and no API keys, so nothing outside the
/// temp directory is read and generation stays offline.
fn edumate(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("edumate").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("GEMINI_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("EDUMATE_GEMINI_KEY")
        .env_remove("EDUMATE_OPENAI_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn initialized() -> TempDir {
    let dir = TempDir::new().unwrap();
    edumate(dir.path()).arg("init").assert().success();
    dir
}

fn add_user(dir: &Path, name: &str, role: &str) {
    edumate(dir)
        .args(["user", "add", "--name", name, "--role", role, "--email"])
        .arg(format!("{}@example.com", name.to_lowercase()))
        .assert()
        .success();
}

/// The last UUID-looking token printed on stdout.
fn last_id(output: &[u8]) -> String {
    let text = String::from_utf8_lossy(output);
    text.split(|c: char| c.is_whitespace() || c == '(' || c == ')')
        .filter(|word| uuid::Uuid::parse_str(word).is_ok())
        .last()
        .unwrap()
        .to_string()
}

#[test]
fn help_output() {
    let dir = TempDir::new().unwrap();
    edumate(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("points and rewards"));
}

#[test]
fn version_output() {
    let dir = TempDir::new().unwrap();
    edumate(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("edumate"));
}

#[test]
fn init_creates_config_and_seeds_data() {
    let dir = TempDir::new().unwrap();

    edumate(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created edumate.toml"))
        .stdout(predicate::str::contains("Seeded 5 point rules, 3 subjects and 7 topics"));

    assert!(dir.path().join("edumate.toml").exists());
    assert!(dir.path().join("edumate-data.json").exists());
}

#[test]
fn init_skips_existing() {
    let dir = initialized();

    edumate(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"))
        .stdout(predicate::str::contains("Seeded 0 point rules, 0 subjects and 0 topics"));
}

#[test]
fn explicit_config_path_is_used() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("school").join("edumate.toml");

    edumate(dir.path())
        .arg("init")
        .arg("--no-sample")
        .arg("--config")
        .arg(&config)
        .assert()
        .success();
    assert!(dir.path().join("school").join("edumate-data.json").exists());

    edumate(dir.path())
        .args(["curriculum", "list", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("No subjects yet"));
}

#[test]
fn missing_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    edumate(dir.path())
        .args(["user", "list", "--config", "nope.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: config file not found"));
}

#[test]
fn points_calc_previews_default_rules() {
    let dir = initialized();

    edumate(dir.path())
        .args(["points", "calc", "--category", "practice_test", "--score", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("35 points"))
        .stdout(predicate::str::contains("Perfect score bonus: +15"));

    edumate(dir.path())
        .args(["points", "calc", "--category", "karaoke", "--score", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 points"));
}

#[test]
fn points_rules_lists_every_seeded_rule() {
    let dir = initialized();
    edumate(dir.path())
        .args(["points", "rules"])
        .assert()
        .success()
        .stdout(predicate::str::contains("practice_test"))
        .stdout(predicate::str::contains("mock_test"))
        .stdout(predicate::str::contains("reading"));
}

#[test]
fn import_reports_rejected_rows() {
    let dir = initialized();
    let csv = dir.path().join("questions.csv");
    std::fs::write(
        &csv,
        "subject,topic,question,a,b,c,d,correct\n\
         Mathematics,Fractions,What is 1/2 of 10?,2,5,8,10,B\n\
         History,Romans,Who built Hadrian's Wall?,Romans,Vikings,Normans,Saxons,A\n",
    )
    .unwrap();

    edumate(dir.path())
        .args(["import", "--csv"])
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 question(s), 1 failed"))
        .stdout(predicate::str::contains("Row 3: subject 'History' not found"));

    edumate(dir.path())
        .args(["import", "--csv"])
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 0 question(s), 2 failed"));

    edumate(dir.path())
        .args(["curriculum", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fractions [Easy] - 1 question(s)"));
}

#[test]
fn import_missing_file_fails() {
    let dir = initialized();
    edumate(dir.path())
        .args(["import", "--csv", "missing.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn award_and_ledger() {
    let dir = initialized();
    add_user(dir.path(), "Kim", "student");

    edumate(dir.path())
        .args(["points", "award", "--student", "kim@example.com"])
        .args(["--category", "practice_test", "--score", "85", "--reason", "Fractions quiz"])
        .assert()
        .success()
        .stdout(predicate::str::contains("+20 coins"))
        .stdout(predicate::str::contains("balance 20"));

    edumate(dir.path())
        .args(["points", "manual", "--student", "Kim", "--amount", "-5", "--reason", "Late"])
        .assert()
        .success()
        .stdout(predicate::str::contains("balance 15"));

    edumate(dir.path())
        .args(["points", "ledger", "--student", "kim"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fractions quiz"))
        .stdout(predicate::str::contains("Balance: 15 coins"));
}

#[test]
fn awarding_a_parent_is_refused() {
    let dir = initialized();
    add_user(dir.path(), "Pat", "parent");

    edumate(dir.path())
        .args(["points", "award", "--student", "pat@example.com", "--category", "bonus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected a student"));
}

#[test]
fn reward_request_and_approval() {
    let dir = initialized();
    add_user(dir.path(), "Pat", "parent");
    add_user(dir.path(), "Kim", "student");
    edumate(dir.path())
        .args(["points", "manual", "--student", "Kim", "--amount", "50", "--reason", "Start"])
        .assert()
        .success();

    let created = edumate(dir.path())
        .args(["reward", "create", "--parent", "Pat", "--name", "Movie night", "--cost", "30"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let reward_id = last_id(&created);

    let requested = edumate(dir.path())
        .args(["reward", "request", "--student", "Kim", "--reward", &reward_id])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let request_id = last_id(&requested);

    edumate(dir.path())
        .args(["reward", "list", "--pending"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Movie night"))
        .stdout(predicate::str::contains("pending"));

    edumate(dir.path())
        .args(["reward", "approve", "--request", &request_id, "--by", "Pat"])
        .assert()
        .success()
        .stdout(predicate::str::contains("30 coins deducted, balance 20"));

    edumate(dir.path())
        .args(["reward", "approve", "--request", &request_id, "--by", "Pat"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already resolved"));
}

#[test]
fn links_show_up_on_the_parent_dashboard() {
    let dir = initialized();
    add_user(dir.path(), "Pat", "parent");
    add_user(dir.path(), "Kim", "student");
    add_user(dir.path(), "Lee", "student");

    edumate(dir.path())
        .args(["link", "--user", "Pat", "--to", "Kim,Lee"])
        .assert()
        .success()
        .stdout(predicate::str::contains("linked to 2 user(s): 2 added"));

    let output = edumate(dir.path())
        .args(["dashboard", "--user", "Pat", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let dashboard: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(dashboard["role"], "parent");
    assert_eq!(dashboard["children"].as_array().unwrap().len(), 2);

    edumate(dir.path())
        .args(["dashboard", "--user", "kim@example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Coins:"));
}

#[test]
fn linking_two_students_is_refused() {
    let dir = initialized();
    add_user(dir.path(), "Kim", "student");
    add_user(dir.path(), "Lee", "student");

    edumate(dir.path())
        .args(["link", "--user", "Kim", "--to", "Lee"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot link"));
}

#[test]
fn duplicate_email_is_refused() {
    let dir = initialized();
    add_user(dir.path(), "Kim", "student");
    edumate(dir.path())
        .args(["user", "add", "--name", "Kim Two", "--email", "KIM@example.com", "--role", "student"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn offline_generation_uses_sample_content() {
    let dir = initialized();

    edumate(dir.path())
        .args(["generate", "quiz", "--subject", "Mathematics", "--topic", "Fractions"])
        .args(["--count", "2", "--save"])
        .assert()
        .success()
        .stdout(predicate::str::contains("AI unavailable"))
        .stdout(predicate::str::contains("[Sample] Question 2 about Fractions?"))
        .stdout(predicate::str::contains("Sample content is not saved."));

    edumate(dir.path())
        .args(["generate", "topics", "--subject", "Science", "--count", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[Sample] Science Topic 3"));
}

#[test]
fn mastery_starts_ready_then_locked() {
    let dir = initialized();
    add_user(dir.path(), "Kim", "student");

    edumate(dir.path())
        .args(["mastery", "--student", "Kim"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fractions"))
        .stdout(predicate::str::contains("ready"))
        .stdout(predicate::str::contains("locked"));
}

#[test]
fn curriculum_additions() {
    let dir = TempDir::new().unwrap();
    edumate(dir.path()).args(["init", "--no-sample"]).assert().success();

    edumate(dir.path())
        .args(["curriculum", "add-subject", "--name", "History", "--difficulty", "hard"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added subject History"));
    edumate(dir.path())
        .args(["curriculum", "add-topic", "--subject", "history", "--name", "Romans"])
        .assert()
        .success();
    edumate(dir.path())
        .args(["curriculum", "add-topic", "--subject", "History", "--name", "romans"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    edumate(dir.path())
        .args(["curriculum", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("History [Hard]"))
        .stdout(predicate::str::contains("1. Romans [Medium] - 0 question(s)"));
}
