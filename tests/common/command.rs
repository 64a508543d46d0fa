use crate::common::file::{FileSpec, write_file};
use assert_cmd::Command;
use assert_fs::TempDir;
use bitcore::areas::repository::Repository;
use bitcore::artifacts::objects::commit::{Commit, Identity};
use bitcore::artifacts::objects::object_id::ObjectId;
use chrono::DateTime;
use rstest::fixture;
use std::path::Path;

/// Empty repository laid out the way `git init` leaves it, with an unborn `master`
#[fixture]
pub fn repository_dir() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let git_dir = dir.path().join(".git");

    std::fs::create_dir_all(git_dir.join("objects")).expect("Failed to create objects dir");
    std::fs::create_dir_all(git_dir.join("refs").join("heads")).expect("Failed to create refs dir");
    std::fs::create_dir_all(git_dir.join("refs").join("tags")).expect("Failed to create tags dir");
    std::fs::write(git_dir.join("HEAD"), "ref: refs/heads/master\n").expect("Failed to write HEAD");

    dir
}

/// Repository with `1.txt`, `a/2.txt` and `a/b/3.txt` staged and committed on `master`
#[fixture]
pub fn committed_repository_dir(repository_dir: TempDir) -> TempDir {
    write_file(FileSpec::new(repository_dir.path().join("1.txt"), "one"));
    write_file(FileSpec::new(repository_dir.path().join("a").join("2.txt"), "two"));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("b").join("3.txt"),
        "three",
    ));

    run_bit_command(repository_dir.path(), &["add", "."])
        .assert()
        .success();

    commit_index(repository_dir.path(), "Initial commit");

    repository_dir
}

pub fn run_bit_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("bit").expect("Failed to find bit binary");
    cmd.current_dir(dir).args(args).env_remove("GIT_DIR");
    cmd.env_remove("GIT_INDEX_FILE")
        .env_remove("GIT_OBJECT_DIRECTORY")
        .env("NO_COLOR", "1");
    cmd
}

pub fn bit_stdout(dir: &Path, args: &[&str]) -> String {
    let output = run_bit_command(dir, args).assert().success();
    String::from_utf8(output.get_output().stdout.clone()).expect("stdout is not UTF-8")
}

/// Store the current index as a commit on top of HEAD and advance the branch
pub fn commit_index(dir: &Path, message: &str) -> ObjectId {
    let mut repository = Repository::open(dir).expect("Failed to open repository");
    let tree = repository.write_tree().expect("Failed to write tree");
    let parents = repository
        .head()
        .expect("Failed to read HEAD")
        .oid
        .into_iter()
        .collect::<Vec<_>>();

    let timestamp = DateTime::parse_from_rfc3339("2026-01-01T12:00:00+02:00").expect("timestamp");
    let identity = Identity::new("Jo Doe", "jo@example.com", timestamp);
    let commit = Commit::new(tree, parents, identity.clone(), identity, format!("{message}\n"));

    let oid = repository.database().store(&commit).expect("Failed to store commit");
    repository
        .refs()
        .update_ref("HEAD", oid)
        .expect("Failed to update HEAD");

    oid
}
