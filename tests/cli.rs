use std::path::Path;
use std::process::{Command, Output};

fn run_in(data_dir: &Path, command_line: &str) -> Output {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "--quiet", "--"])
        .arg("--data-dir")
        .arg(data_dir)
        .arg("exec")
        .arg(command_line);
    cmd.output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_cli_no_subcommand_shows_help() {
    let output = Command::new(env!("CARGO"))
        .args(["run", "--quiet", "--"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = stderr(&output);
    assert!(
        stderr.contains("Usage") || stderr.contains("rosterbook"),
        "Expected usage info, got: {stderr}"
    );
}

#[test]
fn test_cli_add_then_list() {
    let dir = tempfile::tempdir().unwrap();
    let added = run_in(
        dir.path(),
        "add i/A0217529M n/Alice Pauline p/94351253 e/alice@u.nus.edu g/alice-p",
    );
    assert!(added.status.success(), "stderr: {}", stderr(&added));
    assert!(stdout(&added).contains("New student added: Alice Pauline (A0217529M)"));

    let listed = run_in(dir.path(), "list");
    assert!(listed.status.success());
    assert!(stdout(&listed).contains("Listed 1 student(s)"));
    assert!(stdout(&listed).contains("1. Alice Pauline (A0217529M)"));
}

#[test]
fn test_cli_state_persists_across_invocations() {
    let dir = tempfile::tempdir().unwrap();
    run_in(
        dir.path(),
        "add i/A0000001X n/Alice p/94351253 e/alice@u.nus.edu g/alice",
    );
    let deleted = run_in(dir.path(), "delete 1");
    assert!(deleted.status.success());
    assert!(stdout(&deleted).contains("Deleted 1 student(s): Alice"));
    let listed = run_in(dir.path(), "list");
    assert!(stdout(&listed).contains("Listed 0 student(s)"));
}

#[test]
fn test_cli_parse_error_exits_nonzero_with_usage() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), "delete zero");
    assert!(!output.status.success());
    let stderr = stderr(&output);
    assert!(stderr.contains("Student index:"), "got: {stderr}");
    assert!(stderr.contains("Usage: delete"), "got: {stderr}");
}

#[test]
fn test_cli_unknown_command() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), "frobnicate 1");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Unknown command"));
}

#[test]
fn test_cli_out_of_bounds_delete_cites_range() {
    let dir = tempfile::tempdir().unwrap();
    run_in(
        dir.path(),
        "add i/A0000001X n/Alice p/94351253 e/alice@u.nus.edu g/alice",
    );
    let output = run_in(dir.path(), "delete 8");
    assert!(!output.status.success());
    let stderr = stderr(&output);
    assert!(stderr.contains("index 8"), "got: {stderr}");
    assert!(stderr.contains("[1, 1]"), "got: {stderr}");
}

#[test]
fn test_cli_timeslot_flow() {
    let dir = tempfile::tempdir().unwrap();
    let blocked = run_in(
        dir.path(),
        "block-timeslot ts/2024-03-04T10:00 te/2024-03-04T11:00",
    );
    assert!(blocked.status.success(), "stderr: {}", stderr(&blocked));

    // Adjacent block merges in the report but is a legal insert.
    let adjacent = run_in(
        dir.path(),
        "block-timeslot ts/4 Mar 2024, 11:00 te/4 Mar 2024, 12:00",
    );
    assert!(adjacent.status.success(), "stderr: {}", stderr(&adjacent));

    let overlapping = run_in(
        dir.path(),
        "block-timeslot ts/2024-03-04T10:30 te/2024-03-04T11:30",
    );
    assert!(!overlapping.status.success());
    assert!(stderr(&overlapping).contains("conflicts"));

    let report = run_in(dir.path(), "get-timeslots");
    let text = stdout(&report);
    assert!(text.contains("You have 1 booked period(s)"), "got: {text}");
    assert!(text.contains("4 Mar 2024, 10:00 - 4 Mar 2024, 12:00"), "got: {text}");
}

#[test]
fn test_cli_unblock_splits_stored_interval() {
    let dir = tempfile::tempdir().unwrap();
    run_in(
        dir.path(),
        "block-timeslot ts/2024-03-04T10:00 te/2024-03-04T13:00",
    );
    let unblocked = run_in(
        dir.path(),
        "unblock-timeslot ts/2024-03-04T11:00 te/2024-03-04T12:00",
    );
    assert!(unblocked.status.success(), "stderr: {}", stderr(&unblocked));

    let report = run_in(dir.path(), "get-timeslots");
    let text = stdout(&report);
    assert!(text.contains("You have 2 booked period(s)"), "got: {text}");
    assert!(text.contains("10:00 - 4 Mar 2024, 11:00"), "got: {text}");
    assert!(text.contains("12:00 - 4 Mar 2024, 13:00"), "got: {text}");
}

#[test]
fn test_cli_consultation_duplicate_vs_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let first = run_in(
        dir.path(),
        "add-consultation ts/2024-03-04T10:00 te/2024-03-04T11:00 n/Alice",
    );
    assert!(first.status.success(), "stderr: {}", stderr(&first));

    let duplicate = run_in(
        dir.path(),
        "add-consultation ts/2024-03-04T10:00 te/2024-03-04T11:00 n/Alice",
    );
    assert!(!duplicate.status.success());
    assert!(stderr(&duplicate).contains("already been booked"));

    let other_student = run_in(
        dir.path(),
        "add-consultation ts/2024-03-04T10:00 te/2024-03-04T11:00 n/Bob",
    );
    assert!(!other_student.status.success());
    assert!(stderr(&other_student).contains("conflicts"));

    let report = run_in(dir.path(), "get-consultations");
    assert!(stdout(&report).contains("You have 1 consultation(s)"));
    assert!(stdout(&report).contains("consultation with Alice"));
}

#[test]
fn test_cli_grade_batch_and_undo() {
    let dir = tempfile::tempdir().unwrap();
    for (id, name) in [("A0000001X", "Alice"), ("A0000002X", "Bob")] {
        run_in(
            dir.path(),
            &format!("add i/{id} n/{name} p/94351253 e/{name}@u.nus.edu g/{name}"),
        );
    }
    let graded = run_in(dir.path(), "grade 1:2 en/midterm s/y");
    assert!(graded.status.success(), "stderr: {}", stderr(&graded));
    assert!(stdout(&graded).contains("Alice, Bob"));

    let undone = run_in(dir.path(), "undo");
    assert!(!undone.status.success());
    // Undo history is per session; a fresh process has nothing to undo.
    assert!(stderr(&undone).contains("no earlier state"));
}

#[test]
fn test_cli_filter_and_sort() {
    let dir = tempfile::tempdir().unwrap();
    for (id, name, github) in [
        ("A0000001X", "Carol", "zzz"),
        ("A0000002X", "Alice", "mmm"),
        ("A0000003X", "Bob", "aaa"),
    ] {
        run_in(
            dir.path(),
            &format!("add i/{id} n/{name} p/94351253 e/{name}@u.nus.edu g/{github}"),
        );
    }
    let filtered = run_in(dir.path(), "filter n/ali");
    assert!(stdout(&filtered).contains("1 student(s) listed"));

    let sorted = run_in(dir.path(), "sort c/name");
    assert!(sorted.status.success());
    let listed = stdout(&run_in(dir.path(), "list"));
    let alice = listed.find("Alice").unwrap();
    let bob = listed.find("Bob").unwrap();
    let carol = listed.find("Carol").unwrap();
    assert!(alice < bob && bob < carol, "got: {listed}");
}
