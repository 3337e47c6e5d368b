use std::fs;

use assert_cmd::Command; // Bring Command into scope
use predicates::prelude::*; // Bring predicate traits into scope
use tempfile::tempdir;

fn bloom() -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("bloom")?;
    // Keep the host environment out of the project under test
    cmd.env_remove("APP_DEBUG").env_remove("APP_PUBLIC_DIR").env_remove("USE_GLOBAL_ENV");
    Ok(cmd)
}

#[test]
fn test_ping_command() -> Result<(), Box<dyn std::error::Error>> {
    bloom()?
        .arg("--ping")
        .assert()
        .success()
        .stdout(predicate::str::contains("pong"));
    Ok(())
}

#[test]
fn test_no_args_prints_version() -> Result<(), Box<dyn std::error::Error>> {
    bloom()?
        .assert()
        .success()
        .stdout(predicate::str::contains("Bloom v1.0.0"))
        .stdout(predicate::str::contains("pong").not());
    Ok(())
}

#[test]
fn test_paths_command() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join(".env"), "APP_PUBLIC_DIR=web\nAPP_ENV=testing\n")?;

    bloom()?
        .args(["paths", "--base"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("environment: testing"))
        .stdout(predicate::str::is_match(r"public: .*web\n")?);
    Ok(())
}

#[test]
fn test_config_get_reads_config_directory() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::create_dir(dir.path().join("config"))?;
    fs::write(dir.path().join("config").join("app.json"), r#"{ "locale": "fr" }"#)?;

    bloom()?
        .args(["config", "get", "app.locale", "--base"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout("fr\n");
    Ok(())
}

#[test]
fn test_config_get_missing_key_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    bloom()?
        .args(["config", "get", "nope.nothing", "--base"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No configuration value at 'nope.nothing'"));
    Ok(())
}

#[test]
fn test_serve_once_emits_sapi_response() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    bloom()?
        .args(["serve-once", "--base"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Status: 200 OK\r\n"))
        .stdout(predicate::str::contains("Welcome to Bloom v1.0.0"));
    Ok(())
}

#[test]
fn test_serve_once_unknown_path_is_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    bloom()?
        .args(["serve-once", "--path", "/missing", "--base"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Status: 404 Not Found\r\n"));
    Ok(())
}

#[test]
fn test_serve_once_wrong_method_lists_allowed() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    bloom()?
        .args(["serve-once", "--method", "post", "--path", "/health", "--base"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Status: 405 Method Not Allowed\r\n"))
        .stdout(predicate::str::contains("allow: GET"));
    Ok(())
}
