use crate::areas::workspace::Workspace;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::{EntryMetadata, IndexEntry};
use crate::artifacts::objects::object::hash_object;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::status::file_change::FileChange;
use crate::errors::Result;
use derive_new::new;

/// Outcome of comparing an index entry with its working file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceCheck {
    Clean,
    /// Content matches but the stat signature moved on; the entry should record `stat`
    Refresh(EntryMetadata),
    Modified,
}

#[derive(new)]
pub struct Inspector<'w> {
    workspace: &'w Workspace,
}

impl<'w> Inspector<'w> {
    pub fn check_index_against_tree(
        index_entry: Option<&IndexEntry>,
        tree_entry: Option<&DatabaseEntry>,
    ) -> FileChange {
        match (index_entry, tree_entry) {
            (Some(index_entry), Some(tree_entry))
                if tree_entry.mode != index_entry.metadata.mode
                    || tree_entry.oid != index_entry.oid =>
            {
                FileChange::Changed
            }
            (Some(_), None) => FileChange::Added,
            (None, Some(_)) => FileChange::Removed,
            _ => FileChange::Unchanged,
        }
    }

    /// Compare `entry` with the working file, re-hashing only when the stat signature
    /// cannot vouch for the content (or `trust_stat` is off)
    pub fn check_index_against_workspace(
        &self,
        entry: &IndexEntry,
        trust_stat: bool,
    ) -> Result<WorkspaceCheck> {
        // submodule checkouts and entries the user told us to leave alone
        if entry.skips_worktree() || entry.metadata.mode == EntryMode::Gitlink {
            return Ok(WorkspaceCheck::Clean);
        }

        let Some(stat) = self.workspace.stat_file(&entry.name)? else {
            return Ok(WorkspaceCheck::Modified);
        };

        if stat.mode != entry.metadata.mode {
            return Ok(WorkspaceCheck::Modified);
        }

        if trust_stat && entry.metadata.size == stat.size && entry.times_match(&stat) {
            return Ok(WorkspaceCheck::Clean);
        }

        if self.is_content_changed(entry, &stat)? {
            return Ok(WorkspaceCheck::Modified);
        }

        match entry.metadata == stat {
            true => Ok(WorkspaceCheck::Clean),
            false => Ok(WorkspaceCheck::Refresh(stat)),
        }
    }

    fn is_content_changed(&self, entry: &IndexEntry, stat: &EntryMetadata) -> Result<bool> {
        let content = self.workspace.read_blob(&entry.name, stat.mode)?;
        let oid = hash_object(ObjectType::Blob, &content);

        Ok(oid != entry.oid)
    }
}
