#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const CONFIG: &str = r#"
log_filter = "warn"

[[grants]]
principal = "bot"
capability = "*"

[[grants]]
principal = "ta"
capability = "section:add"
course = 1
"#;

fn setup() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("coursesync.toml"), CONFIG).unwrap();
    temp
}

fn coursesync(data: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("coursesync"));
    cmd.env_remove("RUST_LOG")
        .env_remove("COURSESYNC_DATA_DIR")
        .env_remove("COURSESYNC_LOG_FILTER")
        .env("NO_COLOR", "1")
        .arg("--data-dir")
        .arg(data.path());
    cmd
}

#[test]
fn test_course_section_link_and_move_workflow() {
    let data = setup();

    // 1. Create a course (id 1, general section id 1)
    coursesync(&data)
        .args(["course", "create", "Linear", "Algebra"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Linear Algebra"));

    // 2. Add a section at ordinal 1 (section id 2)
    coursesync(&data)
        .args([
            "call",
            "add_section",
            "course_id=1",
            "section_name=Week 1",
            "section_ordinal=1",
            "--as",
            "bot",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"ok":{"status":"success"}}"#));

    // 3. Add a link to the general section
    coursesync(&data)
        .args([
            "call",
            "add_link_element",
            "course_id=1",
            "section_ordinal=0",
            "display_name=Docs",
            "url=https://docs.rs/",
            "visible=1",
            "--as",
            "bot",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""element_id":"1""#));

    // 4. Move it into Week 1
    coursesync(&data)
        .args([
            "call",
            "move_element",
            "element_id=1",
            "destination_section_id=2",
            "--as",
            "bot",
        ])
        .assert()
        .success();

    coursesync(&data)
        .args(["course", "show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Week 1").and(predicate::str::contains("Docs")));

    coursesync(&data)
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("No inconsistencies found."));
}

#[test]
fn test_time_gated_link_shows_its_condition() {
    let data = setup();
    coursesync(&data)
        .args(["course", "create", "Physics"])
        .assert()
        .success();

    coursesync(&data)
        .args([
            "call",
            "add_link_element",
            "course_id=1",
            "section_ordinal=0",
            "display_name=Exam",
            "url=https://example.org/exam",
            "time=1650000000",
            "visible=0",
            "--as",
            "bot",
        ])
        .assert()
        .success();

    coursesync(&data)
        .args(["course", "show", "1"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Exam")
                .and(predicate::str::contains("availability"))
                .and(predicate::str::contains(r#""t":1650000000"#))
                .and(predicate::str::contains(r#""showc":[false]"#)),
        );
}

#[test]
fn test_denied_call_fails_before_validation() {
    let data = setup();
    coursesync(&data)
        .args(["course", "create", "Physics"])
        .assert()
        .success();

    // "ta" may only add sections in course 1.
    coursesync(&data)
        .args([
            "call",
            "move_element",
            "element_id=not-a-number",
            "--as",
            "ta",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Access denied"));

    coursesync(&data)
        .args([
            "call",
            "add_section",
            "course_id=1",
            "section_name=Lab",
            "section_ordinal=1",
            "--as",
            "ta",
        ])
        .assert()
        .success();
}

#[test]
fn test_draft_upload_and_folder() {
    let data = setup();
    let upload = data.path().join("handout.txt");
    fs::write(&upload, "read me").unwrap();

    coursesync(&data)
        .args(["course", "create", "Physics"])
        .assert()
        .success();
    coursesync(&data)
        .args(["draft", "add", "9"])
        .arg(&upload)
        .assert()
        .success()
        .stdout(predicate::str::contains("/handout.txt"));

    coursesync(&data)
        .args([
            "call",
            "add_folder_element",
            "course_id=1",
            "section_ordinal=0",
            "upload_ref=9",
            "display_name=Handouts",
            "--as",
            "bot",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""element_id":"1""#));

    assert!(data
        .path()
        .join("areas/folder/1/handout.txt")
        .exists());
}

#[test]
fn test_serve_answers_each_line() {
    let data = setup();
    coursesync(&data)
        .args(["course", "create", "Physics"])
        .assert()
        .success();

    let input = [
        r#"{"function":"add_section","params":{"course_id":1,"section_name":"Week 1","section_ordinal":1}}"#,
        r#"{"function":"add_section","principal":"nobody","params":{"course_id":1}}"#,
        r#"{"function":"move_element","params":{"element_id":42,"destination_section_id":1}}"#,
        "not json",
    ]
    .join("\n");

    coursesync(&data)
        .args(["serve", "--as", "bot"])
        .write_stdin(input)
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#"{"ok":{"status":"success"}}"#)
                .and(predicate::str::contains(r#""kind":"authorization""#))
                .and(predicate::str::contains(r#""kind":"not_found""#))
                .and(predicate::str::contains(r#""kind":"validation""#)),
        );
}

#[test]
fn test_functions_lists_registry() {
    let data = setup();
    coursesync(&data)
        .arg("functions")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("append_files_to_folder")
                .and(predicate::str::contains("element:move")),
        );
}
