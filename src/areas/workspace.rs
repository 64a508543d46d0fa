//! Working directory access
//!
//! Paths handed out by the workspace are relative to the work tree, `/`-separated and valid
//! UTF-8, the same form index entries and flattened trees use.

use crate::artifacts::index::entry_mode::{EntryMode, FileMode};
use crate::artifacts::index::index_entry::EntryMetadata;
use crate::config::GIT_DIR_NAME;
use crate::errors::{Error, Result};
use bytes::Bytes;
use is_executable::IsExecutable;
use std::io::ErrorKind;
use std::os::unix::ffi::OsStrExt;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn absolute_path(&self, relative: &str) -> PathBuf {
        self.path.join(relative)
    }

    /// Path of `file` relative to the work tree
    ///
    /// Relative inputs are taken relative to the work tree. `..` components are resolved
    /// lexically; anything that ends up outside the work tree or inside the git directory is
    /// rejected.
    pub fn relative_path(&self, file: &Path) -> Result<String> {
        let outside = || Error::PathOutsideRepository {
            path: file.to_path_buf(),
            root: self.path.to_path_buf(),
        };

        let absolute = normalize(&self.path.join(file)).ok_or_else(outside)?;
        let root = normalize(&self.path).ok_or_else(outside)?;
        let relative = absolute.strip_prefix(&root).map_err(|_| outside())?;

        let mut components = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(name) if name == GIT_DIR_NAME => return Err(outside()),
                Component::Normal(name) => components.push(
                    name.to_str()
                        .ok_or_else(|| non_utf8_path(&absolute))?,
                ),
                _ => return Err(outside()),
            }
        }

        Ok(components.join("/"))
    }

    /// Every file and symlink below `root` (the whole work tree when `None`), sorted by
    /// path bytes, skipping the git directory
    pub fn list_files(&self, root: Option<&str>) -> Result<Vec<String>> {
        let start = match root {
            Some(root) if !root.is_empty() => self.path.join(root),
            _ => self.path.to_path_buf(),
        };

        let metadata = std::fs::symlink_metadata(&start).map_err(|source| Error::WorkingFileUnreadable {
            path: start.clone(),
            source,
        })?;
        if !metadata.is_dir() {
            return Ok(vec![self.relative_path(&start)?]);
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&start)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.file_name() != GIT_DIR_NAME);

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| start.clone());
                Error::io(path, e.into())
            })?;

            if entry.file_type().is_dir() {
                continue;
            }

            files.push(self.relative_path(entry.path())?);
        }

        files.sort_unstable_by(|a, b| a.as_bytes().cmp(b.as_bytes()));

        Ok(files)
    }

    /// Stat signature of a working file, or `None` when nothing stageable is there
    ///
    /// A directory standing where a file is tracked counts as the file being gone.
    pub fn stat_file(&self, relative: &str) -> Result<Option<EntryMetadata>> {
        let path = self.absolute_path(relative);

        let metadata = match std::fs::symlink_metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                return Ok(None);
            }
            Err(source) => return Err(Error::WorkingFileUnreadable { path, source }),
        };

        let mode = if metadata.file_type().is_symlink() {
            EntryMode::Symlink
        } else if metadata.is_file() {
            match path.is_executable() {
                true => EntryMode::File(FileMode::Executable),
                false => EntryMode::File(FileMode::Regular),
            }
        } else {
            return Ok(None);
        };

        Ok(Some(EntryMetadata::from_fs(&metadata, mode)))
    }

    /// Content that gets hashed for a working file: the bytes of a regular file or the
    /// target of a symlink
    pub fn read_blob(&self, relative: &str, mode: EntryMode) -> Result<Bytes> {
        let path = self.absolute_path(relative);

        let content = match mode {
            EntryMode::Symlink => std::fs::read_link(&path)
                .map(|target| target.as_os_str().as_bytes().to_vec()),
            _ => std::fs::read(&path),
        };

        content
            .map(Bytes::from)
            .map_err(|source| Error::WorkingFileUnreadable { path, source })
    }
}

/// Resolve `.` and `..` without touching the filesystem; `None` if `..` climbs above the root
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() || normalized.as_os_str().is_empty() {
                    return None;
                }
            }
            other => normalized.push(other),
        }
    }

    Some(normalized)
}

fn non_utf8_path(path: &Path) -> Error {
    Error::WorkingFileUnreadable {
        path: path.to_path_buf(),
        source: std::io::Error::new(ErrorKind::InvalidData, "path is not valid UTF-8"),
    }
}
