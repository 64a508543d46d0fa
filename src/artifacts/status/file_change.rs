use colored::Colorize;

const LABEL_WIDTH: usize = 8;

/// How one path differs between the tree, the index and the working tree
///
/// Staged differences (`Added`, `Removed`, `Changed`) win over an unstaged `Modified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum FileChange {
    #[default]
    Unchanged,
    /// In the index, not in the tree
    Added,
    /// In the tree, not in the index
    Removed,
    /// In both, with a different object id or mode
    Changed,
    /// Working file differs from the index entry, or is gone
    Modified,
}

impl FileChange {
    pub fn is_staged(&self) -> bool {
        matches!(self, FileChange::Added | FileChange::Removed | FileChange::Changed)
    }

    /// Two-column code in the style of `status --porcelain`
    pub fn short_code(&self) -> &'static str {
        match self {
            FileChange::Unchanged => "  ",
            FileChange::Added => "A ",
            FileChange::Removed => "D ",
            FileChange::Changed => "M ",
            FileChange::Modified => " M",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileChange::Unchanged => "",
            FileChange::Added => "new file:   ",
            FileChange::Removed => "deleted:    ",
            FileChange::Changed | FileChange::Modified => "modified:   ",
        }
    }
}

impl std::fmt::Display for FileChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FileChange::Unchanged => self.label().normal(),
            FileChange::Modified => self.label().red(),
            _ => self.label().green(),
        };
        write!(f, "{:>width$}{}", "", label, width = LABEL_WIDTH)
    }
}
