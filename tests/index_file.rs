use crate::common::command::{bit_stdout, committed_repository_dir, repository_dir, run_bit_command};
use crate::common::file::{FileSpec, bump_mtime, write_file, write_generated_files};
use assert_fs::TempDir;
use bitcore::Error;
use bitcore::areas::index::{Index, IndexState};
use bitcore::areas::repository::Repository;
use bitcore::artifacts::index::extension::Extension;
use bitcore::artifacts::index::index_entry::ExtendedFlags;
use bitcore::config::{ChecksumPolicy, RepositoryLayout};
use bytes::Bytes;
use pretty_assertions::assert_eq;
use rstest::rstest;
use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod common;

fn index_path(dir: &Path) -> PathBuf {
    dir.join(".git").join("index")
}

fn open_index(dir: &Path, policy: ChecksumPolicy) -> Index {
    Index::with_policy(index_path(dir).into_boxed_path(), policy)
}

/// Index files written by git 2.39 for a small committed tree
fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

fn listing(index: &Index) -> Vec<(u32, String, String)> {
    index
        .entries()
        .map(|entry| (entry.metadata.mode.as_u32(), entry.oid.to_string(), entry.name.clone()))
        .collect()
}

#[rstest]
fn missing_index_file_loads_empty(repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let mut index = open_index(repository_dir.path(), ChecksumPolicy::Strict);

    index.load()?;

    assert!(index.is_empty());
    assert_eq!(index.parse_count(), 0);
    assert_eq!(index.state(), IndexState::Loaded { stamp: None });
    assert_eq!(bit_stdout(repository_dir.path(), &["ls-files"]), "");

    Ok(())
}

#[rstest]
fn unchanged_index_file_is_parsed_once(
    committed_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut index = open_index(committed_repository_dir.path(), ChecksumPolicy::Strict);

    assert!(index.reread_if_necessary()?);
    assert!(!index.reread_if_necessary()?);
    assert!(!index.reread_if_necessary()?);

    assert_eq!(index.parse_count(), 1);
    assert_eq!(index.len(), 3);

    Ok(())
}

#[rstest]
fn index_rewritten_by_another_writer_is_parsed_again(
    committed_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = committed_repository_dir.path();
    let mut index = open_index(dir, ChecksumPolicy::Strict);
    index.load()?;

    write_file(FileSpec::new(dir.join("4.txt"), "four"));
    run_bit_command(dir, &["add", "4.txt"]).assert().success();
    // a second writer may land within the same timestamp tick
    bump_mtime(&index_path(dir), Duration::from_secs(5));

    assert!(index.reread_if_necessary()?);
    assert_eq!(index.parse_count(), 2);
    assert!(index.entry_by_path("4.txt").is_some());
    assert!(!index.reread_if_necessary()?);

    Ok(())
}

#[rstest]
fn adding_unchanged_files_leaves_the_index_untouched(
    committed_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = committed_repository_dir.path();
    let before = std::fs::read(index_path(dir))?;

    run_bit_command(dir, &["add", "."]).assert().success();
    run_bit_command(dir, &["add", "1.txt", "a"]).assert().success();

    let after = std::fs::read(index_path(dir))?;
    assert_index_eq!(&after, &before);

    Ok(())
}

#[rstest]
fn written_index_reloads_with_its_extensions(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = repository_dir.path();
    write_generated_files(dir, 4);
    run_bit_command(dir, &["add", "."]).assert().success();

    let mut index = open_index(dir, ChecksumPolicy::Strict);
    index.load()?;
    index.add_extension(Extension::new(*b"XTRA", Bytes::from_static(b"opaque payload")));
    index.write()?;

    let mut reloaded = open_index(dir, ChecksumPolicy::Strict);
    reloaded.load()?;

    assert_eq!(reloaded.entries().collect::<Vec<_>>(), index.entries().collect::<Vec<_>>());
    assert_eq!(reloaded.extensions(), index.extensions());
    assert_eq!(reloaded.to_bytes(), Bytes::from(std::fs::read(index_path(dir))?));

    Ok(())
}

#[rstest]
fn staging_drops_cached_tree_but_keeps_unknown_extensions(
    committed_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = committed_repository_dir.path();
    let mut index = open_index(dir, ChecksumPolicy::Strict);
    index.load()?;
    index.add_extension(Extension::new(*b"TREE", Bytes::from_static(b"stale")));
    index.add_extension(Extension::new(*b"XTRA", Bytes::from_static(b"kept")));
    index.write()?;

    write_file(FileSpec::new(dir.join("1.txt"), "uno"));
    run_bit_command(dir, &["add", "1.txt"]).assert().success();

    let mut reloaded = open_index(dir, ChecksumPolicy::Strict);
    reloaded.load()?;
    let names = reloaded.extensions().iter().map(Extension::name).collect::<Vec<_>>();
    assert_eq!(names, vec!["XTRA".to_string()]);

    Ok(())
}

#[rstest]
fn corrupt_checksum_is_fatal_unless_recovering(
    committed_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = committed_repository_dir.path();
    let mut data = std::fs::read(index_path(dir))?;
    let last = data.len() - 1;
    data[last] ^= 0xff;
    std::fs::write(index_path(dir), &data)?;

    let mut strict = open_index(dir, ChecksumPolicy::Strict);
    assert!(matches!(strict.load(), Err(Error::IndexChecksumMismatch { .. })));

    let mut recovering = open_index(dir, ChecksumPolicy::Recover);
    recovering.load()?;
    assert_eq!(recovering.len(), 3);
    assert!(!recovering.is_stat_trusted());

    run_bit_command(dir, &["status"]).assert().failure();

    Ok(())
}

#[rstest]
fn recovered_index_rehashes_files_with_unchanged_stat(
    committed_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = committed_repository_dir.path();
    let metadata = std::fs::metadata(dir.join("1.txt"))?;
    let mtime = filetime::FileTime::from_last_modification_time(&metadata);

    // same size, same mtime: only the content gives the edit away
    write_file(FileSpec::new(dir.join("1.txt"), "uno"));
    filetime::set_file_mtime(dir.join("1.txt"), mtime)?;

    let mut data = std::fs::read(index_path(dir))?;
    let last = data.len() - 1;
    data[last] ^= 0xff;
    std::fs::write(index_path(dir), &data)?;

    let layout = RepositoryLayout::from_work_tree(dir.canonicalize()?);
    let mut repository = Repository::open_with(layout, ChecksumPolicy::Recover)?;
    let diff = repository.status()?;

    assert_eq!(diff.modified().into_iter().collect::<Vec<_>>(), vec!["1.txt"]);
    assert!(repository.index()?.is_stat_trusted());

    Ok(())
}

#[rstest]
fn entries_are_listed_in_path_byte_order(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = repository_dir.path();
    let paths = [
        "Makefile",
        "README",
        "a-b",
        "a/b",
        "a0",
        "builtin/add.c",
        "compat/mingw.c",
        "contrib/completion/git-completion.bash",
        "git.c",
        "t/t0000-basic.sh",
        ".gitignore",
    ];
    for path in paths {
        write_file(FileSpec::new(dir.join(path), format!("contents of {path}\n")));
    }

    run_bit_command(dir, &["add", "."]).assert().success();

    let mut expected = paths.to_vec();
    expected.sort_by(|a, b| a.as_bytes().cmp(b.as_bytes()));
    let listed = bit_stdout(dir, &["ls-files"]);
    assert_eq!(listed.lines().collect::<Vec<_>>(), expected);
    assert_eq!(expected.first(), Some(&".gitignore"));
    assert!(listed.find("a-b").unwrap() < listed.find("a/b").unwrap());

    Ok(())
}

#[rstest]
fn index_written_by_git_round_trips_byte_for_byte() -> Result<(), Box<dyn std::error::Error>> {
    let path = fixture_path("git_index_v2");
    let mut index = Index::with_policy(path.clone().into_boxed_path(), ChecksumPolicy::Strict);

    index.load()?;

    assert_eq!(index.version(), 2);
    assert_eq!(
        listing(&index),
        [
            (0o100644, "5626abf0f72e58d7a153368ba57db4c673c0e171", "New Folder/00-01.txt"),
            (0o100644, "f719efd430d52bcfc8566a43b2eb655688d38871", "New Folder/00-02.txt"),
            (0o100644, "d9b401251bb36c51ca5c56c2ffc8a24a78ff20ae", "README"),
            (0o100644, "a2544f7ec3007899167de1fef481a5a0fd63fa41", "a-b"),
            (0o100644, "8b200126cd1e4c330bfcb06ee00171db36e88f1d", "a/b"),
            (0o120000, "100b93820ade4c16225673b4ca62bb3ade63c313", "link"),
            (0o100755, "1a2485251c33a70432394c93fb89330ef214bfc9", "run.sh"),
        ]
        .map(|(mode, oid, name)| (mode, oid.to_string(), name.to_string()))
        .to_vec()
    );

    let names = index.extensions().iter().map(Extension::name).collect::<Vec<_>>();
    assert_eq!(names, vec!["TREE".to_string()]);
    let cached_tree = index.extensions()[0].data();
    // root: empty path, 7 entries, 2 subtrees, then the root tree id
    assert!(cached_tree.starts_with(b"\x007 2\n"));
    assert_eq!(hex::encode(&cached_tree[5..25]), "6fca1b3093b4968acfbe91f7062fbd443f6eec94");

    assert_eq!(index.to_bytes(), Bytes::from(std::fs::read(&path)?));

    Ok(())
}

#[rstest]
fn intent_to_add_entries_from_git_keep_version_three() -> Result<(), Box<dyn std::error::Error>> {
    let path = fixture_path("git_index_v3_intent_to_add");
    let mut index = Index::with_policy(path.clone().into_boxed_path(), ChecksumPolicy::Strict);

    index.load()?;

    assert_eq!(index.version(), 3);
    assert_eq!(index.len(), 8);
    let later = index.entry_by_path("later.txt").ok_or("later.txt is not staged")?;
    assert_eq!(later.extended_flags, ExtendedFlags::INTENT_TO_ADD);
    assert_eq!(later.oid.to_string(), "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
    assert!(index.entry_by_path("README").is_some_and(|entry| entry.extended_flags.is_empty()));

    assert_eq!(index.to_bytes(), Bytes::from(std::fs::read(&path)?));

    Ok(())
}

#[rstest]
#[case(u32::MAX)]
#[case(2)]
fn header_claiming_more_entries_than_the_file_holds_is_malformed(
    repository_dir: TempDir,
    #[case] declared: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut data = b"DIRC\0\0\0\x02".to_vec();
    data.extend_from_slice(&declared.to_be_bytes());
    let trailer = Sha1::digest(&data);
    data.extend_from_slice(&trailer);
    std::fs::write(index_path(repository_dir.path()), &data)?;

    let mut index = open_index(repository_dir.path(), ChecksumPolicy::Recover);

    assert_eq!(data.len(), 32);
    assert!(matches!(index.load(), Err(Error::MalformedIndex(_))));

    Ok(())
}
