//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn uniquery() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("uniquery").unwrap()
}

/// A command that cannot see the user's config or API key.
fn isolated(dir: &TempDir) -> Command {
    let mut cmd = uniquery();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env_remove("UNIQUERY_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

const QUIZ_RESPONSE: &str = r#"Sure! Here's your quiz:
[
  {"question": "2+2?", "options": ["3", "4", "5", "6"], "answer": "4", "explanation": "Basic addition."},
  {"question": "Capital of France?", "options": ["Paris", "Rome", "Oslo", "Bern"], "answer": "Paris"},
  {"question": "Largest planet?", "options": ["Mars", "Venus", "Jupiter", "Earth"], "answer": "Jupiter"}
]
Good luck!"#;

const MATERIAL: &str = "# Photosynthesis\n\n## Inputs\n- Light\n- Water and CO₂\n\n1. Light reactions\n2. Calvin cycle\n\nPlants are **green** because of chlorophyll.\n";

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Config whose default provider is an offline mock.
fn mock_config(dir: &TempDir, response: &str, quiz_response: &str) -> PathBuf {
    write_file(
        dir,
        "mock.toml",
        &format!(
            r#"default_provider = "mock"
default_model = "mock-model"
footer = "Test Footer"

[providers.mock]
type = "mock"
response = '''
{response}'''

[providers.mock.responses]
"multiple-choice questions" = '''
{quiz_response}'''
"#
        ),
    )
}

fn read(path: &Path) -> String {
    String::from_utf8_lossy(&std::fs::read(path).unwrap()).into_owned()
}

#[test]
fn help_output() {
    uniquery()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("learning assistant"));
}

#[test]
fn version_output() {
    uniquery()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("uniquery"));
}

#[test]
fn init_creates_config() {
    let dir = TempDir::new().unwrap();

    isolated(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created uniquery.toml"));

    let config = read(&dir.path().join("uniquery.toml"));
    assert!(config.contains("[providers.groq]"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    isolated(&dir).arg("init").assert().success();

    isolated(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn extract_strict_success() {
    let dir = TempDir::new().unwrap();
    let input = write_file(
        &dir,
        "raw.txt",
        r#"Sure! [{"question":"2+2?","options":["3","4","5","6"],"answer":"4"}]"#,
    );

    isolated(&dir)
        .arg("extract")
        .arg("--input")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""answer": "4""#))
        .stderr(predicate::str::contains("Extracted 1 question(s) in strict mode"));
}

#[test]
fn extract_strict_rejects_answer_outside_options() {
    let dir = TempDir::new().unwrap();
    let input = write_file(
        &dir,
        "raw.txt",
        r#"[{"question":"2+2?","options":["3","4","6","7"],"answer":"5"}]"#,
    );

    isolated(&dir)
        .arg("extract")
        .arg("--input")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("strict extraction failed"))
        .stderr(predicate::str::contains("not one of the options"))
        .stderr(predicate::str::contains("Raw response:"));
}

#[test]
fn extract_lenient_drops_invalid() {
    let dir = TempDir::new().unwrap();
    let input = write_file(
        &dir,
        "raw.txt",
        r#"[
  {"question":"2+2?","options":["3","4","6","7"],"answer":"5"},
  {"question":"3+3?","options":["5","6","7","8"],"answer":"6"}
]"#,
    );

    isolated(&dir)
        .args(["extract", "--mode", "lenient", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("3+3?"))
        .stdout(predicate::str::contains("2+2?").not())
        .stderr(predicate::str::contains("Extracted 1 question(s) in lenient mode"));
}

#[test]
fn extract_lenient_with_nothing_left_fails() {
    let dir = TempDir::new().unwrap();

    isolated(&dir)
        .args(["extract", "--mode", "lenient", "--input", "-"])
        .write_stdin(r#"[{"question":"2+2?","options":["3","4","6","7"],"answer":"5"}]"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no valid questions"));
}

#[test]
fn extract_without_json_fails() {
    let dir = TempDir::new().unwrap();

    isolated(&dir)
        .args(["extract", "--input", "-"])
        .write_stdin("I cannot help with that.")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no JSON question array"))
        .stderr(predicate::str::contains("I cannot help with that."));
}

#[test]
fn render_text_to_stdout() {
    let dir = TempDir::new().unwrap();
    let input = write_file(
        &dir,
        "notes.md",
        "## Key Concepts\nThis is **important** now\nπ ≈ 3.14\n",
    );

    isolated(&dir)
        .args(["render", "--title", "Notes", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Notes\n## Key Concepts\n"))
        .stdout(predicate::str::contains("This is **important** now"))
        .stdout(predicate::str::contains("pi ~= 3.14"))
        .stdout(predicate::str::contains("Generated with Uniquery AI | Page 1 of 1"));
}

#[test]
fn render_html_file() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "notes.md", MATERIAL);
    let output = dir.path().join("notes.html");

    isolated(&dir)
        .args(["render", "--format", "html", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("page(s)"));

    let html = read(&output);
    assert!(html.contains("<h2>Inputs</h2>"));
    assert!(html.contains("<li>Water and CO2</li>"));
    assert!(html.contains("<strong>green</strong>"));
    assert!(html.contains("<footer>Generated with Uniquery AI | Page 1 of 1</footer>"));
}

#[test]
fn render_json_uses_config_page_budget() {
    let dir = TempDir::new().unwrap();
    write_file(
        &dir,
        "uniquery.toml",
        "footer = \"Custom\"\n[page]\nheight_budget = 20.0\n",
    );
    let input = write_file(&dir, "notes.md", "one\ntwo\nthree\n");

    let out = isolated(&dir)
        .args(["render", "--format", "json", "--input"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(out.status.success());

    let doc: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(doc["footer"], "Custom");
    assert_eq!(doc["pages"].as_array().unwrap().len(), 2);
    assert_eq!(doc["pages"][0]["blocks"][0]["kind"], "paragraph");
}

#[test]
fn render_rejects_unknown_format() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "notes.md", "x");

    isolated(&dir)
        .args(["render", "--format", "pdf", "--input"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown output format"));
}

#[test]
fn quiz_from_saved_questions() {
    let dir = TempDir::new().unwrap();
    let questions = write_file(&dir, "quiz.txt", QUIZ_RESPONSE);
    let export = dir.path().join("exports");
    std::fs::create_dir(&export).unwrap();

    isolated(&dir)
        .args(["quiz", "--topic", "General", "--answers", "0=4,1=Rome,2=3", "--questions"])
        .arg(&questions)
        .arg("--export")
        .arg(&export)
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 2/3 (66.67%)"))
        .stdout(predicate::str::contains("Good effort!"))
        .stdout(predicate::str::contains("WRONG"))
        .stdout(predicate::str::contains("No explanation provided"));

    let files: Vec<_> = std::fs::read_dir(&export).unwrap().collect();
    assert_eq!(files.len(), 1);
    let path = files[0].as_ref().unwrap().path();
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("quiz_results_") && name.ends_with(".json"));

    let snapshot: serde_json::Value = serde_json::from_str(&read(&path)).unwrap();
    assert_eq!(snapshot["score"], 2);
    assert_eq!(snapshot["completed"], true);
    assert_eq!(snapshot["topicLabel"], "General");
    assert_eq!(snapshot["answers"]["2"], "Jupiter");
    assert!(snapshot["startedAt"].is_string());
    assert!(snapshot["elapsedSeconds"].is_number());
    assert_eq!(snapshot["questions"][0]["answer"], "4");
}

#[test]
fn quiz_interactive_answers() {
    let dir = TempDir::new().unwrap();
    let questions = write_file(&dir, "quiz.txt", QUIZ_RESPONSE);

    isolated(&dir)
        .args(["quiz", "--questions"])
        .arg(&questions)
        .write_stdin("2\nParis\n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Question 1 of 3: 2+2?"))
        .stdout(predicate::str::contains("Quiz: quiz"))
        .stdout(predicate::str::contains("Score: 2/3"))
        .stdout(predicate::str::contains("(no answer)"));
}

#[test]
fn quiz_with_mock_provider() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(&dir, QUIZ_RESPONSE, "[]");

    isolated(&dir)
        .args(["quiz", "--topic", "Trivia", "--count", "3", "--recommend"])
        .args(["--answers", "0=4,1=Paris,2=Jupiter", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 3/3 (100.00%)"))
        .stdout(predicate::str::contains("Excellent performance!"))
        .stdout(predicate::str::contains("No recommendations needed"));
}

#[test]
fn quiz_rejects_unusable_generation() {
    let dir = TempDir::new().unwrap();
    let bad = r#"[{"question":"2+2?","options":["3","4","6","7"],"answer":"5"}]"#;
    let config = mock_config(&dir, bad, "[]");

    isolated(&dir)
        .args(["quiz", "--topic", "Math", "--answers", "0=4", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not be used"));
}

#[test]
fn quiz_requires_topic_or_questions() {
    let dir = TempDir::new().unwrap();

    isolated(&dir)
        .args(["quiz", "--answers", "0=4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--topic is required"));
}

#[test]
fn quiz_without_provider_fails() {
    let dir = TempDir::new().unwrap();

    isolated(&dir)
        .args(["quiz", "--topic", "Math"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("provider 'groq' is not configured"));
}

#[test]
fn study_writes_material_and_pages() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(&dir, MATERIAL, QUIZ_RESPONSE);
    let output = dir.path().join("out");

    isolated(&dir)
        .args(["study", "--topic", "Photosynthesis", "--kind", "key concepts", "--quiz"])
        .arg("--output")
        .arg(&output)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stderr(predicate::str::contains("Practice quiz 'Photosynthesis (from study material)' (3 questions)"));

    let markdown = read(&output.join("Photosynthesis_Key_Concepts.md"));
    assert!(markdown.contains("CO₂"));

    let text = read(&output.join("Photosynthesis_Key_Concepts.txt"));
    assert!(text.starts_with("# Key Concepts: Photosynthesis\n"));
    assert!(text.contains("- Water and CO2\n"));
    assert!(text.contains("Test Footer | Page 1 of 1"));

    assert!(output.join("Photosynthesis_Key_Concepts.html").exists());
    assert!(output.join("Photosynthesis_Key_Concepts.json").exists());

    let quiz = read(&output.join("Photosynthesis_Key_Concepts_quiz.json"));
    let questions: serde_json::Value = serde_json::from_str(&quiz).unwrap();
    assert_eq!(questions.as_array().unwrap().len(), 3);
}

#[test]
fn study_single_format() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(&dir, MATERIAL, "[]");
    let output = dir.path().join("out");

    isolated(&dir)
        .args(["study", "--topic", "Photosynthesis", "--format", "html"])
        .arg("--output")
        .arg(&output)
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    assert!(output.join("Photosynthesis_Study_Guide.md").exists());
    assert!(output.join("Photosynthesis_Study_Guide.html").exists());
    assert!(!output.join("Photosynthesis_Study_Guide.txt").exists());
}

#[test]
fn list_models_table() {
    let dir = TempDir::new().unwrap();
    let config = write_file(
        &dir,
        "models.toml",
        r#"default_provider = "groq"
default_model = "mixtral-8x7b-32768"

[providers.groq]
type = "openai"
api_key = "gsk-test"

[providers.mock]
type = "mock"
"#,
    );

    isolated(&dir)
        .args(["list-models", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("llama3-8b-8192"))
        .stdout(predicate::str::contains("mixtral-8x7b-32768"))
        .stdout(predicate::str::contains("gemma-7b-it"))
        .stdout(predicate::str::contains("mock-model"));

    isolated(&dir)
        .args(["list-models", "--provider", "mock", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("mock-model"))
        .stdout(predicate::str::contains("llama3").not());
}

#[test]
fn list_models_without_providers() {
    let dir = TempDir::new().unwrap();

    isolated(&dir)
        .arg("list-models")
        .assert()
        .success()
        .stdout(predicate::str::contains("No providers configured"));
}

fn chat_config(dir: &TempDir) -> PathBuf {
    write_file(
        dir,
        "chat.toml",
        r#"default_provider = "mock"
default_model = "mock-model"

[providers.mock]
type = "mock"
response = "Borrowing lends access without moving ownership."

[providers.mock.responses]
"Summarize this conversation" = "You asked about borrowing."
"#,
    )
}

#[test]
fn chat_scripted_turns_export_history() {
    let dir = TempDir::new().unwrap();
    let config = chat_config(&dir);
    let export = dir.path().join("chats");
    std::fs::create_dir(&export).unwrap();

    isolated(&dir)
        .args(["chat", "-m", "What is borrowing?", "-m", "Is it free?", "--summarize"])
        .arg("--config")
        .arg(&config)
        .arg("--export")
        .arg(&export)
        .assert()
        .success()
        .stdout(predicate::str::contains("Borrowing lends access"))
        .stdout(predicate::str::contains("**Conversation Summary**:\nYou asked about borrowing."))
        .stderr(predicate::str::contains("(5 messages)"));

    let files: Vec<_> = std::fs::read_dir(&export).unwrap().collect();
    assert_eq!(files.len(), 1);
    let path = files[0].as_ref().unwrap().path();
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("uniquery_chat_") && name.ends_with(".json"));

    let history: serde_json::Value = serde_json::from_str(&read(&path)).unwrap();
    let messages = history["messages"].as_array().unwrap();
    let roles: Vec<_> = messages.iter().map(|m| m["role"].as_str().unwrap()).collect();
    assert_eq!(roles, ["user", "assistant", "user", "assistant", "assistant"]);
    assert_eq!(messages[2]["content"], "Is it free?");
    assert!(messages[0]["timestamp"].is_string());
}

#[test]
fn chat_continues_saved_history() {
    let dir = TempDir::new().unwrap();
    let config = chat_config(&dir);
    let saved = dir.path().join("chat.json");

    isolated(&dir)
        .args(["chat", "-m", "First question"])
        .arg("--config")
        .arg(&config)
        .arg("--export")
        .arg(&saved)
        .assert()
        .success();

    isolated(&dir)
        .args(["chat", "-m", "Second question"])
        .arg("--config")
        .arg(&config)
        .arg("--history")
        .arg(&saved)
        .arg("--export")
        .arg(&saved)
        .assert()
        .success()
        .stderr(predicate::str::contains("(4 messages)"));

    let history: serde_json::Value = serde_json::from_str(&read(&saved)).unwrap();
    assert_eq!(history["messages"][0]["content"], "First question");
    assert_eq!(history["messages"][2]["content"], "Second question");
}

#[test]
fn chat_interactive_from_stdin() {
    let dir = TempDir::new().unwrap();
    let config = chat_config(&dir);
    let saved = dir.path().join("chat.json");

    isolated(&dir)
        .arg("chat")
        .arg("--config")
        .arg(&config)
        .arg("--export")
        .arg(&saved)
        .write_stdin("Hello\n/clear\nWhat is borrowing?\n/quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Conversation cleared."))
        .stdout(predicate::str::contains("Borrowing lends access"));

    let history: serde_json::Value = serde_json::from_str(&read(&saved)).unwrap();
    assert_eq!(history["messages"].as_array().unwrap().len(), 2);
    assert_eq!(history["messages"][0]["content"], "What is borrowing?");
}

#[test]
fn chat_summary_of_nothing_fails() {
    let dir = TempDir::new().unwrap();
    let config = chat_config(&dir);

    isolated(&dir)
        .args(["chat", "--summarize", "--config"])
        .arg(&config)
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to summarize"));
}
