//! Repository handle
//!
//! Owns every storage area of one repository. The index is held here, not in a global, and
//! is re-read from disk only when the file changed since this handle last saw it.

use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::{Ref, Refs};
use crate::areas::workspace::Workspace;
use crate::artifacts::database::FlatTree;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::status::index_diff::IndexDiff;
use crate::config::{ChecksumPolicy, RepositoryLayout};
use crate::errors::{Error, Result};
use std::path::Path;

#[derive(Debug)]
pub struct Repository {
    layout: RepositoryLayout,
    database: Database,
    refs: Refs,
    workspace: Workspace,
    index: Index,
}

impl Repository {
    /// Open the repository whose work tree is `work_tree`, honoring `GIT_DIR` and friends
    pub fn open(work_tree: impl AsRef<Path>) -> Result<Self> {
        let work_tree = work_tree.as_ref();
        let work_tree = work_tree
            .canonicalize()
            .map_err(|e| Error::io(work_tree, e))?;

        Self::open_with(RepositoryLayout::discover(work_tree), ChecksumPolicy::default())
    }

    pub fn open_with(layout: RepositoryLayout, checksum_policy: ChecksumPolicy) -> Result<Self> {
        if !layout.git_dir.is_dir() {
            return Err(Error::io(
                &layout.git_dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a git repository"),
            ));
        }

        Ok(Repository {
            database: Database::new(layout.objects_dir.clone().into_boxed_path()),
            refs: Refs::new(layout.git_dir.clone().into_boxed_path()),
            workspace: Workspace::new(layout.work_tree.clone().into_boxed_path()),
            index: Index::with_policy(layout.index_file.clone().into_boxed_path(), checksum_policy),
            layout,
        })
    }

    pub fn layout(&self) -> &RepositoryLayout {
        &self.layout
    }

    pub fn path(&self) -> &Path {
        self.layout.work_tree()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// The index, re-read first if the file changed on disk
    pub fn index(&mut self) -> Result<&Index> {
        self.index.reread_if_necessary()?;
        Ok(&self.index)
    }

    pub fn index_mut(&mut self) -> Result<&mut Index> {
        self.index.reread_if_necessary()?;
        Ok(&mut self.index)
    }

    pub fn head(&self) -> Result<Ref> {
        self.refs.head()
    }

    /// Files of the commit HEAD points to; empty while the current branch has no commits
    pub fn head_tree(&self) -> Result<FlatTree> {
        match self.head()?.oid {
            Some(oid) => self.commit_tree(&oid),
            None => Ok(FlatTree::new()),
        }
    }

    /// Flattened tree of a commit, or of a tree id given directly
    pub fn commit_tree(&self, oid: &ObjectId) -> Result<FlatTree> {
        match self.database.object_type(oid)? {
            ObjectType::Tree => self.database.flatten_tree(oid),
            _ => {
                let commit = self.database.decode_commit(oid)?;
                self.database.flatten_tree(commit.tree())
            }
        }
    }

    /// Stage `paths` (files or directories) and write the index
    ///
    /// Tracked files that no longer exist below a given path are unstaged.
    pub fn add(&mut self, paths: &[impl AsRef<Path>]) -> Result<()> {
        self.index.reread_if_necessary()?;

        for path in paths {
            let relative = self.workspace.relative_path(path.as_ref())?;
            let absolute = self.workspace.absolute_path(&relative);

            if std::fs::symlink_metadata(&absolute).is_err() {
                if !self.index.remove(&relative) {
                    return Err(Error::WorkingFileUnreadable {
                        path: absolute,
                        source: std::io::ErrorKind::NotFound.into(),
                    });
                }
                continue;
            }

            let root = (!relative.is_empty()).then_some(relative.as_str());
            for file in self.workspace.list_files(root)? {
                self.index
                    .add(&self.workspace, &self.database, Path::new(&file))?;
            }

            let prefix = format!("{relative}/");
            let vanished = self
                .index
                .entries()
                .filter(|entry| relative.is_empty() || entry.name.starts_with(&prefix))
                .map(|entry| entry.name.clone())
                .collect::<Vec<_>>();
            for name in vanished {
                if self.workspace.stat_file(&name)?.is_none() {
                    self.index.remove(&name);
                }
            }
        }

        if self.index.is_changed() {
            self.index.write()?;
        }

        Ok(())
    }

    /// Classify every tracked path against HEAD and the working tree
    ///
    /// Refreshed stat signatures stay in memory; call [`Repository::write_index`] to keep them.
    pub fn status(&mut self) -> Result<IndexDiff> {
        let head_tree = self.head_tree()?;
        self.index.reread_if_necessary()?;

        IndexDiff::compute(&head_tree, &mut self.index, Some(&self.workspace))
    }

    /// Staged differences between HEAD and the index only
    pub fn staged_changes(&mut self) -> Result<IndexDiff> {
        let head_tree = self.head_tree()?;
        self.index.reread_if_necessary()?;

        IndexDiff::compute(&head_tree, &mut self.index, None)
    }

    /// Working files that are neither in the index nor below a tracked path
    pub fn untracked_files(&mut self) -> Result<Vec<String>> {
        self.index.reread_if_necessary()?;

        Ok(self
            .workspace
            .list_files(None)?
            .into_iter()
            .filter(|file| !self.index.is_directly_tracked(file))
            .collect())
    }

    pub fn write_index(&mut self) -> Result<()> {
        self.index.write()
    }

    /// Store the trees for the current index and return the root tree id
    pub fn write_tree(&mut self) -> Result<ObjectId> {
        self.index.reread_if_necessary()?;
        self.database.write_tree(&self.index)
    }
}
