use assert_cmd::cargo;
use assert_cmd::prelude::*;
use plcopen_test::shared_resource_path;
use predicates::prelude::*;
use std::{fs, process::Command};
use tempfile::NamedTempFile;

#[test]
fn check_when_not_a_file_then_err() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo::cargo_bin!("plcopen"));

    cmd.arg("check").arg("test/file/doesnt/exist");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("error"));

    Ok(())
}

#[test]
fn check_when_trace_log_and_not_a_file_then_err() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo::cargo_bin!("plcopen"));

    cmd.arg("-v")
        .arg("-v")
        .arg("-v")
        .arg("-v")
        .arg("check")
        .arg("test/file/doesnt/exist");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("error"));

    Ok(())
}

#[test]
fn check_when_too_verbose_then_err() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo::cargo_bin!("plcopen"));

    cmd.arg("-vvvvv")
        .arg("check")
        .arg(shared_resource_path("array_2d.xml"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("verbose"));

    Ok(())
}

#[test]
fn check_when_valid_file_then_ok() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo::cargo_bin!("plcopen"));

    cmd.arg("check").arg(shared_resource_path("full_project.xml"));
    cmd.assert().success().stdout(predicate::str::contains("OK"));

    Ok(())
}

#[test]
fn check_when_dangling_reference_then_err() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo::cargo_bin!("plcopen"));

    cmd.arg("check")
        .arg(shared_resource_path("dangling_reference.xml"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("error[P0005]"))
        .stderr(predicate::str::contains("99"))
        .stderr(predicate::str::contains("Number of errors: 1"));

    Ok(())
}

#[test]
fn check_when_log_file_then_writes_log() -> Result<(), Box<dyn std::error::Error>> {
    let log = NamedTempFile::new()?;
    let mut cmd = Command::new(cargo::cargo_bin!("plcopen"));

    cmd.arg("-vvv")
        .arg("--log-file")
        .arg(log.path())
        .arg("check")
        .arg(shared_resource_path("array_2d.xml"));
    cmd.assert().success();

    let contents = fs::read_to_string(log.path())?;
    assert!(contents.contains("Read project 'Matrix'"));

    Ok(())
}

#[test]
fn xml2json_when_valid_then_writes_json() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo::cargo_bin!("plcopen"));

    cmd.arg("xml2json")
        .arg(shared_resource_path("array_2d.xml"));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"T_ARRAY_2D\""))
        .stdout(predicate::str::contains("\"REAL\""));

    Ok(())
}

#[test]
fn xml2json_when_output_then_json2xml_reads_it() -> Result<(), Box<dyn std::error::Error>> {
    let json = NamedTempFile::with_suffix(".json")?;
    let mut cmd = Command::new(cargo::cargo_bin!("plcopen"));
    cmd.arg("xml2json")
        .arg(shared_resource_path("sfc_inline_condition.xml"))
        .arg("-o")
        .arg(json.path())
        .arg("--pretty");
    cmd.assert().success().stdout(predicate::str::is_empty());

    let mut cmd = Command::new(cargo::cargo_bin!("plcopen"));
    cmd.arg("json2xml").arg(json.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("<?xml"))
        .stdout(predicate::str::contains("counter &gt; 0"));

    Ok(())
}

#[test]
fn json2xml_when_malformed_then_err() -> Result<(), Box<dyn std::error::Error>> {
    let json = NamedTempFile::with_suffix(".json")?;
    fs::write(json.path(), "{ \"fileHeader\": ")?;

    let mut cmd = Command::new(cargo::cargo_bin!("plcopen"));
    cmd.arg("json2xml").arg(json.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("error[P0001]"));

    Ok(())
}
