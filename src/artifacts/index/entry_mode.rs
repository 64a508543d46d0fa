//! File modes recorded in trees and index entries
//!
//! Git only records a handful of modes; permission bits other than the
//! executable bit are never stored.

#[derive(Debug, Clone, Copy, Eq, Ord, Default, PartialEq, PartialOrd, Hash)]
pub enum FileMode {
    #[default]
    Regular,
    Executable,
}

#[derive(Debug, Clone, Copy, Eq, Ord, PartialEq, PartialOrd, Hash)]
pub enum EntryMode {
    File(FileMode),
    Symlink,
    Gitlink,
    Directory,
}

impl Default for EntryMode {
    fn default() -> Self {
        EntryMode::File(FileMode::Regular)
    }
}

impl EntryMode {
    /// Octal form as written in tree objects (no leading zero for trees)
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryMode::File(FileMode::Regular) => "100644",
            EntryMode::File(FileMode::Executable) => "100755",
            EntryMode::Symlink => "120000",
            EntryMode::Gitlink => "160000",
            EntryMode::Directory => "40000",
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            EntryMode::File(FileMode::Regular) => 0o100644,
            EntryMode::File(FileMode::Executable) => 0o100755,
            EntryMode::Symlink => 0o120000,
            EntryMode::Gitlink => 0o160000,
            EntryMode::Directory => 0o40000,
        }
    }

    /// Recognize a mode from its numeric value, as stored in the index
    pub fn from_bits(mode: u32) -> Option<Self> {
        match mode {
            0o100644 => Some(EntryMode::File(FileMode::Regular)),
            0o100755 => Some(EntryMode::File(FileMode::Executable)),
            0o120000 => Some(EntryMode::Symlink),
            0o160000 => Some(EntryMode::Gitlink),
            0o40000 => Some(EntryMode::Directory),
            _ => None,
        }
    }

    /// Recognize a mode from its octal text, as stored in tree objects
    pub fn from_octal_str(mode: &str) -> Option<Self> {
        match mode {
            "100644" => Some(EntryMode::File(FileMode::Regular)),
            "100755" => Some(EntryMode::File(FileMode::Executable)),
            "120000" => Some(EntryMode::Symlink),
            "160000" => Some(EntryMode::Gitlink),
            "40000" => Some(EntryMode::Directory),
            _ => None,
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, EntryMode::Directory)
    }

    /// Object kind the entry's id refers to
    pub fn object_type(&self) -> crate::artifacts::objects::object_type::ObjectType {
        use crate::artifacts::objects::object_type::ObjectType;

        match self {
            EntryMode::Directory => ObjectType::Tree,
            EntryMode::Gitlink => ObjectType::Commit,
            EntryMode::File(_) | EntryMode::Symlink => ObjectType::Blob,
        }
    }
}

impl From<FileMode> for EntryMode {
    fn from(mode: FileMode) -> Self {
        EntryMode::File(mode)
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06o}", self.as_u32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("100644", EntryMode::File(FileMode::Regular))]
    #[case("100755", EntryMode::File(FileMode::Executable))]
    #[case("120000", EntryMode::Symlink)]
    #[case("160000", EntryMode::Gitlink)]
    #[case("40000", EntryMode::Directory)]
    fn recognizes_git_modes(#[case] text: &str, #[case] mode: EntryMode) {
        assert_eq!(EntryMode::from_octal_str(text), Some(mode));
        assert_eq!(EntryMode::from_bits(mode.as_u32()), Some(mode));
    }

    #[rstest]
    #[case("100664")]
    #[case("040000")]
    #[case("+100644")]
    #[case("abc")]
    #[case("")]
    fn rejects_unknown_modes(#[case] text: &str) {
        assert_eq!(EntryMode::from_octal_str(text), None);
    }

    #[test]
    fn display_is_zero_padded() {
        assert_eq!(EntryMode::Directory.to_string(), "040000");
        assert_eq!(EntryMode::Symlink.to_string(), "120000");
    }
}
