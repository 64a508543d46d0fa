//! Merge-join of a flattened tree against the index
//!
//! Both sides are sorted by path bytes, so one pass with a cursor on each side pairs every
//! path with its counterpart. Each path gets exactly one [`FileChange`], which keeps the
//! added/removed/changed/modified sets disjoint.

use crate::areas::index::Index;
use crate::areas::workspace::Workspace;
use crate::artifacts::database::FlatTree;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::index_entry::{EntryMetadata, IndexEntry};
use crate::artifacts::status::file_change::FileChange;
use crate::artifacts::status::inspector::{Inspector, WorkspaceCheck};
use crate::errors::Result;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexDiff {
    changes: BTreeMap<String, FileChange>,
}

impl IndexDiff {
    /// Classify every path of `tree` and `index`
    ///
    /// Without a workspace only staged differences are reported. With one, every index
    /// entry is also checked against its working file; entries whose content turned out
    /// unchanged get their stat signature refreshed in `index` (in memory only).
    pub fn compute(tree: &FlatTree, index: &mut Index, workspace: Option<&Workspace>) -> Result<Self> {
        let inspector = workspace.map(Inspector::new);
        let trust_stat = index.is_stat_trusted();

        let mut changes = BTreeMap::new();
        let mut refreshed = Vec::<(String, u8, EntryMetadata)>::new();

        {
            let mut tree_entries = tree.iter().peekable();
            let mut index_entries = Self::one_entry_per_path(index).peekable();

            loop {
                let (tree_entry, index_entry): (Option<(&String, &DatabaseEntry)>, Option<&IndexEntry>) =
                    match (tree_entries.peek(), index_entries.peek()) {
                        (None, None) => break,
                        (Some(_), None) => (tree_entries.next(), None),
                        (None, Some(_)) => (None, index_entries.next()),
                        (Some((path, _)), Some(entry)) => {
                            match path.as_bytes().cmp(entry.name.as_bytes()) {
                                Ordering::Less => (tree_entries.next(), None),
                                Ordering::Greater => (None, index_entries.next()),
                                Ordering::Equal => (tree_entries.next(), index_entries.next()),
                            }
                        }
                    };

                let path = match (tree_entry, index_entry) {
                    (_, Some(entry)) => entry.name.clone(),
                    (Some((path, _)), None) => path.clone(),
                    (None, None) => break,
                };

                let staged =
                    Inspector::check_index_against_tree(index_entry, tree_entry.map(|(_, e)| e));

                let unstaged = match (index_entry, &inspector) {
                    (Some(entry), Some(inspector)) => {
                        match inspector.check_index_against_workspace(entry, trust_stat)? {
                            WorkspaceCheck::Clean => FileChange::Unchanged,
                            WorkspaceCheck::Refresh(stat) => {
                                refreshed.push((entry.name.clone(), entry.stage, stat));
                                FileChange::Unchanged
                            }
                            WorkspaceCheck::Modified => FileChange::Modified,
                        }
                    }
                    _ => FileChange::Unchanged,
                };

                let change = if staged.is_staged() { staged } else { unstaged };
                changes.insert(path, change);
            }
        }

        for (path, stage, stat) in refreshed {
            index.update_entry_stat(&path, stage, stat);
        }
        if workspace.is_some() {
            index.mark_stat_trusted();
        }

        Ok(IndexDiff { changes })
    }

    /// Stage 0 when present, otherwise the lowest stage, for each path in order
    fn one_entry_per_path(index: &Index) -> impl Iterator<Item = &IndexEntry> {
        let mut previous: Option<&str> = None;

        index.entries().filter(move |&entry| {
            let first = previous != Some(entry.name.as_str());
            previous = Some(entry.name.as_str());
            first
        })
    }

    pub fn change(&self, path: &str) -> Option<FileChange> {
        self.changes.get(path).copied()
    }

    /// Every path in byte order with its tag, unchanged paths included
    pub fn changes(&self) -> impl Iterator<Item = (&str, FileChange)> {
        self.changes.iter().map(|(path, change)| (path.as_str(), *change))
    }

    fn paths_with(&self, wanted: FileChange) -> BTreeSet<&str> {
        self.changes
            .iter()
            .filter(|(_, change)| **change == wanted)
            .map(|(path, _)| path.as_str())
            .collect()
    }

    pub fn added(&self) -> BTreeSet<&str> {
        self.paths_with(FileChange::Added)
    }

    pub fn removed(&self) -> BTreeSet<&str> {
        self.paths_with(FileChange::Removed)
    }

    pub fn changed(&self) -> BTreeSet<&str> {
        self.paths_with(FileChange::Changed)
    }

    pub fn modified(&self) -> BTreeSet<&str> {
        self.paths_with(FileChange::Modified)
    }

    pub fn is_clean(&self) -> bool {
        self.changes.values().all(|change| *change == FileChange::Unchanged)
    }
}
