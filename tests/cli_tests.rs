//! CLI integration tests running the real lambda-bundle binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{self, File};
use std::path::Path;

#[allow(deprecated)]
fn bundle_cmd() -> Command {
    let mut cmd = Command::cargo_bin("lambda-bundle").unwrap();
    cmd.env_remove("LAMBDA_BUNDLE_PYTHON")
        .env_remove("LAMBDA_BUNDLE_SITE_PACKAGES");
    cmd
}

fn write_project(root: &Path, bundle_table: &str) {
    fs::create_dir_all(root.join("lambdas")).unwrap();
    let handler = "def handler(event, context):\n    return {}\n";
    fs::write(root.join("lambdas/uploads.py"), handler).unwrap();
    fs::write(root.join("lambdas/uploaders.py"), handler).unwrap();

    let site = root.join("site-packages");
    for package in ["shortuuid", "sqlalchemy", "psycopg2"] {
        fs::create_dir_all(site.join(package)).unwrap();
        fs::write(site.join(package).join("__init__.py"), "").unwrap();
    }

    fs::write(
        root.join("pyproject.toml"),
        format!(
            "[project]\nname = \"uploads\"\nversion = \"0.4.0\"\n\n\
             [tool.lambda-bundle]\n{bundle_table}"
        ),
    )
    .unwrap();
}

fn archive_names(path: &Path) -> Vec<String> {
    let archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

#[test]
fn test_missing_output_prints_usage_and_exits_1() {
    bundle_cmd()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage: lambda-bundle"));
}

#[test]
fn test_empty_output_prints_usage_and_exits_1() {
    bundle_cmd()
        .arg("")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage: lambda-bundle"));
}

#[test]
fn test_help_output() {
    bundle_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("OUTPUT"))
        .stdout(predicate::str::contains("--no-install"))
        .stdout(predicate::str::contains("--site-packages"));
}

#[test]
fn test_missing_manifest_fails() {
    let temp = tempfile::tempdir().unwrap();
    bundle_cmd()
        .current_dir(temp.path())
        .arg("out.zip")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Manifest not found"));
}

#[test]
fn test_relative_output_is_resolved_against_cwd() {
    let temp = tempfile::tempdir().unwrap();
    write_project(
        temp.path(),
        "source-dir = \"lambdas\"\n\
         sources = [\"uploads.py\", \"uploaders.py\"]\n\
         dependencies = [\n\
             \"shortuuid\",\n\
             \"SQLAlchemy\",\n\
             { name = \"psycopg2-binary\", dir = \"psycopg2\" },\n\
         ]\n",
    );

    let work = temp.path().join("work");
    fs::create_dir_all(&work).unwrap();

    bundle_cmd()
        .current_dir(&work)
        .args(["--no-install", "--path", "..", "--site-packages"])
        .arg(temp.path().join("site-packages"))
        .arg("../dist/./lambda.zip")
        .assert()
        .success();

    let archive = temp.path().join("dist/lambda.zip");
    assert!(archive.is_file());
    assert!(!work.join("dist").exists());
    assert_eq!(
        archive_names(&archive),
        vec![
            "psycopg2/",
            "psycopg2/__init__.py",
            "shortuuid/",
            "shortuuid/__init__.py",
            "sqlalchemy/",
            "sqlalchemy/__init__.py",
            "uploaders.py",
            "uploads.py",
        ]
    );
}

#[test]
fn test_directory_output_uses_manifest_filename() {
    let temp = tempfile::tempdir().unwrap();
    write_project(temp.path(), "source-dir = \"lambdas\"\ndependencies = [\"shortuuid\"]\n");
    fs::create_dir_all(temp.path().join("dist")).unwrap();

    bundle_cmd()
        .current_dir(temp.path())
        .env("LAMBDA_BUNDLE_SITE_PACKAGES", temp.path().join("site-packages"))
        .arg("dist")
        .assert()
        .success();

    let archive = temp.path().join("dist/uploads-0.4.0.zip");
    assert_eq!(
        archive_names(&archive),
        vec!["shortuuid/", "shortuuid/__init__.py", "uploaders.py", "uploads.py"]
    );
}

#[test]
fn test_rerun_replaces_previous_archive() {
    let temp = tempfile::tempdir().unwrap();
    write_project(temp.path(), "source-dir = \"lambdas\"\n");
    let archive = temp.path().join("lambda.zip");

    for _ in 0..2 {
        bundle_cmd()
            .current_dir(temp.path())
            .arg("lambda.zip")
            .assert()
            .success();
    }

    assert_eq!(archive_names(&archive), vec!["uploaders.py", "uploads.py"]);
}

#[test]
fn test_missing_dependency_reports_error() {
    let temp = tempfile::tempdir().unwrap();
    write_project(temp.path(), "source-dir = \"lambdas\"\ndependencies = [\"redis\"]\n");

    bundle_cmd()
        .current_dir(temp.path())
        .args(["--site-packages", "site-packages", "lambda.zip"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Dependency 'redis' not found"));

    assert!(!temp.path().join("lambda.zip").exists());
}

#[test]
fn test_trailing_dot_output_is_a_directory() {
    let temp = tempfile::tempdir().unwrap();
    write_project(temp.path(), "source-dir = \"lambdas\"\n");

    bundle_cmd()
        .current_dir(temp.path())
        .arg("dist/.")
        .assert()
        .success();

    let archive = temp.path().join("dist/uploads-0.4.0.zip");
    assert_eq!(archive_names(&archive), vec!["uploaders.py", "uploads.py"]);
}
