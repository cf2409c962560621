use std::io::Write;

use assert_cmd::Command;
use predicates::boolean::PredicateBooleanExt;
use predicates::str::contains;
use tempfile::NamedTempFile;

fn network_available() -> bool {
    let config = ureq::Agent::config_builder()
        .timeout_connect(Some(std::time::Duration::from_secs(2)))
        .timeout_global(Some(std::time::Duration::from_secs(5)))
        .build();
    let agent = ureq::Agent::new_with_config(config);
    agent
        .get("https://openlibrary.org/")
        .call()
        .map(|res| !res.status().is_server_error())
        .unwrap_or(false)
}

fn library_file(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("tmp file");
    file.write_all(json.as_bytes()).expect("write library");
    file
}

const LIBRARY: &str = r#"[
    {"id": "1", "isbn": "9780552124751", "title": "The Colour of Magic", "author": "Terry Pratchett"},
    {"id": "2", "isbn": "", "title": "Cien Años de Soledad", "author": "Gabriel García Márquez"}
]"#;

#[test]
fn lookup_rejects_invalid_isbn_without_network() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("shelf")?;
    cmd.env("NO_COLOR", "1");
    cmd.arg("lookup")
        .arg("not-an-isbn")
        .assert()
        .failure()
        .stderr(contains("invalid ISBN"));
    Ok(())
}

#[test]
fn search_rejects_short_query_without_network() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("shelf")?;
    cmd.env("NO_COLOR", "1");
    cmd.arg("search")
        .arg("a")
        .assert()
        .failure()
        .stderr(contains("too short"));
    Ok(())
}

#[test]
fn check_reports_isbn_duplicate() -> Result<(), Box<dyn std::error::Error>> {
    let library = library_file(LIBRARY);
    let mut cmd = Command::cargo_bin("shelf")?;
    cmd.env("NO_COLOR", "1");
    cmd.arg("check")
        .arg(library.path())
        .arg("--isbn")
        .arg("9780552124751")
        .arg("--title")
        .arg("Completely Different")
        .assert()
        .success()
        .stdout(contains("duplicate (isbn match)").and(contains("The Colour of Magic")));
    Ok(())
}

#[test]
fn check_matches_title_author_across_diacritics() -> Result<(), Box<dyn std::error::Error>> {
    let library = library_file(LIBRARY);
    let mut cmd = Command::cargo_bin("shelf")?;
    cmd.env("NO_COLOR", "1");
    cmd.arg("check")
        .arg(library.path())
        .arg("--title")
        .arg("cien anos de soledad")
        .arg("--author")
        .arg("gabriel garcia marquez")
        .assert()
        .success()
        .stdout(contains("duplicate (title-author match)"));
    Ok(())
}

#[test]
fn check_reports_no_duplicate() -> Result<(), Box<dyn std::error::Error>> {
    let library = library_file(LIBRARY);
    let mut cmd = Command::cargo_bin("shelf")?;
    cmd.env("NO_COLOR", "1");
    cmd.arg("check")
        .arg(library.path())
        .arg("--title")
        .arg("Mort")
        .arg("--author")
        .arg("Terry Pratchett")
        .assert()
        .success()
        .stdout(contains("no duplicate found"));
    Ok(())
}

#[test]
fn fix_skips_records_without_isbn_offline() -> Result<(), Box<dyn std::error::Error>> {
    // No record carries an ISBN, so the batch completes without touching the
    // network.
    let library = library_file(r#"[{"id": "1", "title": "No Identifier"}]"#);
    let mut cmd = Command::cargo_bin("shelf")?;
    cmd.env("NO_COLOR", "1");
    let output = cmd
        .arg("fix")
        .arg(library.path())
        .arg("--delay-ms")
        .arg("0")
        .output()?;
    assert!(output.status.success());
    let stderr = String::from_utf8(strip_ansi_escapes::strip(output.stderr))?;
    assert!(
        stderr.contains("No ISBN") && stderr.contains("✓ 0") && stderr.contains("✗ 1"),
        "stderr mismatch. stderr=\n{}",
        stderr
    );

    // The file is rewritten and still a parseable record list.
    let rewritten = std::fs::read_to_string(library.path())?;
    let records: serde_json::Value = serde_json::from_str(&rewritten)?;
    assert_eq!(records.as_array().map(|a| a.len()), Some(1));
    Ok(())
}

#[test]
fn lookup_known_isbn() -> Result<(), Box<dyn std::error::Error>> {
    if !network_available() {
        eprintln!("skipping lookup_known_isbn: network unavailable");
        return Ok(());
    }
    let mut cmd = Command::cargo_bin("shelf")?;
    cmd.env("NO_COLOR", "1");

    // Known, stable ISBN: Fantastic Mr Fox (Puffin)
    let output = cmd.arg("lookup").arg("9780140328721").output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    let stderr = String::from_utf8(strip_ansi_escapes::strip(output.stderr))?;
    assert!(
        stdout.contains("9780140328721"),
        "stdout did not contain the ISBN. stdout=\n{}",
        stdout
    );
    assert!(
        stderr.contains("✓ 1") && stderr.contains("✗ 0"),
        "stderr summary mismatch. stderr=\n{}",
        stderr
    );
    Ok(())
}

#[test]
fn lookup_unassigned_isbn_is_not_found() -> Result<(), Box<dyn std::error::Error>> {
    if !network_available() {
        eprintln!("skipping lookup_unassigned_isbn_is_not_found: network unavailable");
        return Ok(());
    }
    let mut cmd = Command::cargo_bin("shelf")?;
    cmd.env("NO_COLOR", "1");

    // Syntactically valid but unassigned ISBN-13.
    let output = cmd.arg("lookup").arg("9799999999990").output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    let stderr = String::from_utf8(strip_ansi_escapes::strip(output.stderr))?;
    assert!(
        stdout.is_empty(),
        "stdout should be empty for an unassigned ISBN, got=\n{}",
        stdout
    );
    assert!(
        stderr.contains("✓ 0") && stderr.contains("✗ 1"),
        "stderr summary mismatch. stderr=\n{}",
        stderr
    );
    Ok(())
}
