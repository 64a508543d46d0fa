//! Repository layout and index policy configuration
//!
//! A repository handle needs four locations: the work tree, the git directory, the object
//! directory and the index file. By default they follow the standard `.git` layout, and the
//! git-compatible environment variables below can relocate them:
//!
//! - `GIT_DIR`: the git directory (default `<work-tree>/.git`)
//! - `GIT_OBJECT_DIRECTORY`: the object directory (default `<git-dir>/objects`)
//! - `GIT_INDEX_FILE`: the index file (default `<git-dir>/index`)

use std::path::{Path, PathBuf};

pub const GIT_DIR_ENV: &str = "GIT_DIR";
pub const GIT_OBJECT_DIRECTORY_ENV: &str = "GIT_OBJECT_DIRECTORY";
pub const GIT_INDEX_FILE_ENV: &str = "GIT_INDEX_FILE";

/// Name of the git directory inside the work tree
pub const GIT_DIR_NAME: &str = ".git";

/// Maximum number of symbolic hops followed while resolving a reference
pub const MAX_SYMREF_DEPTH: usize = 5;

/// How a checksum mismatch found while loading the index is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumPolicy {
    /// Fail the load with `IndexChecksumMismatch`
    #[default]
    Strict,
    /// Keep the parsed entries but distrust every cached stat signature, so the next diff
    /// re-hashes each tracked working file instead of relying on stale metadata
    Recover,
}

/// Locations of the areas a repository handle operates on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLayout {
    pub work_tree: PathBuf,
    pub git_dir: PathBuf,
    pub objects_dir: PathBuf,
    pub index_file: PathBuf,
}

impl RepositoryLayout {
    /// Standard layout rooted at `work_tree`, ignoring the environment
    pub fn from_work_tree(work_tree: impl Into<PathBuf>) -> Self {
        let work_tree = work_tree.into();
        let git_dir = work_tree.join(GIT_DIR_NAME);

        RepositoryLayout {
            objects_dir: git_dir.join("objects"),
            index_file: git_dir.join("index"),
            git_dir,
            work_tree,
        }
    }

    /// Layout rooted at `work_tree` with the environment overrides applied
    pub fn discover(work_tree: impl Into<PathBuf>) -> Self {
        Self::from_work_tree(work_tree).with_overrides(|key| std::env::var_os(key).map(PathBuf::from))
    }

    fn with_overrides(self, lookup: impl Fn(&str) -> Option<PathBuf>) -> Self {
        let git_dir = lookup(GIT_DIR_ENV)
            .map(|dir| self.absolutize(dir))
            .unwrap_or(self.git_dir);
        let objects_dir = lookup(GIT_OBJECT_DIRECTORY_ENV)
            .map(|dir| self.work_tree.join(dir))
            .unwrap_or_else(|| git_dir.join("objects"));
        let index_file = lookup(GIT_INDEX_FILE_ENV)
            .map(|file| self.work_tree.join(file))
            .unwrap_or_else(|| git_dir.join("index"));

        RepositoryLayout {
            work_tree: self.work_tree,
            git_dir,
            objects_dir,
            index_file,
        }
    }

    fn absolutize(&self, path: PathBuf) -> PathBuf {
        // Path::join keeps absolute paths as they are
        self.work_tree.join(path)
    }

    /// Nearest directory from `start` upwards holding a git directory, `start` if none does
    pub fn locate_work_tree(start: &Path) -> PathBuf {
        start
            .ancestors()
            .find(|dir| dir.join(GIT_DIR_NAME).is_dir())
            .unwrap_or(start)
            .to_path_buf()
    }

    pub fn refs_dir(&self) -> PathBuf {
        self.git_dir.join("refs")
    }

    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn default_layout_lives_under_dot_git() {
        let layout = RepositoryLayout::from_work_tree("/work");

        assert_eq!(layout.git_dir, PathBuf::from("/work/.git"));
        assert_eq!(layout.objects_dir, PathBuf::from("/work/.git/objects"));
        assert_eq!(layout.index_file, PathBuf::from("/work/.git/index"));
        assert_eq!(layout.refs_dir(), PathBuf::from("/work/.git/refs"));
    }

    #[test]
    fn overrides_relocate_git_dir_and_follow_it() {
        let env = HashMap::from([(GIT_DIR_ENV, "/elsewhere/repo.git")]);
        let layout = RepositoryLayout::from_work_tree("/work")
            .with_overrides(|key| env.get(key).map(PathBuf::from));

        assert_eq!(layout.git_dir, PathBuf::from("/elsewhere/repo.git"));
        assert_eq!(layout.objects_dir, PathBuf::from("/elsewhere/repo.git/objects"));
        assert_eq!(layout.index_file, PathBuf::from("/elsewhere/repo.git/index"));
    }

    #[test]
    fn relative_index_override_is_resolved_against_the_work_tree() {
        let env = HashMap::from([(GIT_INDEX_FILE_ENV, "tmp/alt-index")]);
        let layout = RepositoryLayout::from_work_tree("/work")
            .with_overrides(|key| env.get(key).map(PathBuf::from));

        assert_eq!(layout.index_file, PathBuf::from("/work/tmp/alt-index"));
        assert_eq!(layout.objects_dir, PathBuf::from("/work/.git/objects"));
    }

    #[test]
    fn work_tree_is_found_from_a_subdirectory() {
        let dir = assert_fs::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        std::fs::create_dir_all(dir.path().join("src/nested")).unwrap();

        assert_eq!(
            RepositoryLayout::locate_work_tree(&dir.path().join("src/nested")),
            dir.path()
        );
    }
}
