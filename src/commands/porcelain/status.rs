use crate::areas::repository::Repository;
use crate::artifacts::status::file_change::FileChange;
use colored::Colorize;
use std::io::Write;

// Terminology:
// - changes to be committed: paths whose index entry differs from HEAD (added, removed, changed)
// - changes not staged: tracked paths whose working file differs from the index (modified)
// - untracked files: files in the working tree that the index does not know
impl Repository {
    pub fn status_command(&mut self, porcelain: bool, out: &mut impl Write) -> anyhow::Result<()> {
        let diff = self.status()?;
        let untracked = self.untracked_files()?;

        // keep the stat signatures refreshed while checking
        if self.index()?.is_changed() {
            self.write_index()?;
        }

        if porcelain {
            for (path, change) in diff.changes().filter(|(_, c)| *c != FileChange::Unchanged) {
                writeln!(out, "{} {}", change.short_code(), path)?;
            }
            for path in &untracked {
                writeln!(out, "?? {path}")?;
            }

            return Ok(());
        }

        let head = self.head()?;
        if head.is_symbolic() {
            writeln!(out, "On branch {}", head.name.short_name())?;
        } else if let Some(oid) = head.oid {
            writeln!(out, "HEAD detached at {}", oid.to_short_oid())?;
        }
        if head.is_unborn() {
            writeln!(out, "\nNo commits yet")?;
        }

        let staged = diff
            .changes()
            .filter(|(_, change)| change.is_staged())
            .collect::<Vec<_>>();
        let unstaged = diff
            .changes()
            .filter(|(_, change)| *change == FileChange::Modified)
            .collect::<Vec<_>>();

        if !staged.is_empty() {
            writeln!(out, "\nChanges to be committed:")?;
            for (path, change) in &staged {
                writeln!(out, "{change}{path}")?;
            }
        }

        if !unstaged.is_empty() {
            writeln!(out, "\nChanges not staged for commit:")?;
            for (path, change) in &unstaged {
                writeln!(out, "{change}{path}")?;
            }
        }

        if !untracked.is_empty() {
            writeln!(out, "\nUntracked files:")?;
            for path in &untracked {
                writeln!(out, "{:>8}{}", "", path.red())?;
            }
        }

        if staged.is_empty() && unstaged.is_empty() {
            match untracked.is_empty() {
                true => writeln!(out, "\nnothing to commit, working tree clean")?,
                false => writeln!(out, "\nnothing added to commit but untracked files present")?,
            }
        }

        Ok(())
    }
}
