// Command line tests for Classy

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/minidjango")
}

fn classy(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("classy").unwrap();
    cmd.current_dir(dir.path()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_version_command() {
    let dir = TempDir::new().unwrap();
    classy(&dir)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("classy "));
}

#[test]
fn test_import_then_build() {
    let dir = TempDir::new().unwrap();
    let catalog = dir.path().join("catalog.json");
    let site = dir.path().join("site");

    classy(&dir)
        .arg("import")
        .arg(fixture_root())
        .args(["--project", "Django", "--version", "4.2"])
        .arg("--catalog")
        .arg(&catalog)
        .assert()
        .success()
        .stdout(predicate::str::contains("16 classes"));
    assert!(catalog.exists());

    classy(&dir)
        .arg("build")
        .arg("--catalog")
        .arg(&catalog)
        .arg("--output")
        .arg(&site)
        .arg("--no-diagrams")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 diagrams"));

    assert!(site.join("index.html").exists());
    assert!(site
        .join("projects/Django/4.2/django.views.generic.edit/UpdateView/index.html")
        .exists());
    assert!(!site
        .join("projects/Django/4.2/django.views.generic.edit/UpdateView/diagram.mmd")
        .exists());
}

#[test]
fn test_import_missing_source() {
    let dir = TempDir::new().unwrap();
    classy(&dir)
        .args(["import", "does/not/exist", "--version", "1.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Path not found"));
}

#[test]
fn test_build_without_catalog_fails() {
    let dir = TempDir::new().unwrap();
    classy(&dir)
        .args(["build", "--catalog", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.json"));
}

#[test]
fn test_config_file_in_working_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("classy.toml"),
        "[catalog]\npath = \"from-config.json\"\n",
    )
    .unwrap();

    classy(&dir)
        .arg("import")
        .arg(fixture_root())
        .args(["--version", "4.2"])
        .assert()
        .success();
    assert!(dir.path().join("from-config.json").exists());
}

#[test]
fn test_invalid_config_rejected() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bad.toml");
    std::fs::write(&config, "[project]\nname = \"\"\n").unwrap();

    classy(&dir)
        .args(["build", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("project name"));
}
