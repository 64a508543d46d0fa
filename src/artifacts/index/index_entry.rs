//! Index entry representation
//!
//! Each entry in the index represents a tracked path with:
//! - File path relative to the work tree, `/`-separated
//! - Content hash (blob object ID)
//! - Stat signature (mode, size, timestamps, device, inode, owner)
//! - Merge stage and flags
//!
//! ## Entry Format
//!
//! Entries are stored big-endian and padded with NUL bytes to an 8-byte boundary.
//! The stat signature lets status checks skip re-hashing files whose metadata
//! did not change since they were staged.

use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use bitflags::bitflags;
use byteorder::{ByteOrder, NetworkEndian, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use std::fs::Metadata;
use std::os::unix::prelude::MetadataExt;

/// Block size for entry alignment (8 bytes)
pub const ENTRY_BLOCK: usize = 8;

/// Size of the fixed part of an entry, up to and including the flags word
pub const ENTRY_FIXED_SIZE: usize = 62;

/// Size of the extended flags word present on version 3 extended entries
pub const EXTENDED_FLAGS_SIZE: usize = 2;

/// Name lengths at or above this value are stored as the value itself
pub const NAME_LENGTH_MASK: u16 = 0x0fff;

const STAGE_MASK: u16 = 0x3000;
const STAGE_SHIFT: u16 = 12;

/// Highest conflict stage (stage 3 is "theirs")
pub const MAX_STAGE: u8 = 3;

bitflags! {
    /// High bits of the on-disk flags word
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EntryFlags: u16 {
        const ASSUME_VALID = 0x8000;
        const EXTENDED = 0x4000;
    }
}

bitflags! {
    /// Second flags word of version 3 entries
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ExtendedFlags: u16 {
        const SKIP_WORKTREE = 0x4000;
        const INTENT_TO_ADD = 0x2000;
    }
}

/// Stat signature cached in index entries
///
/// Values are kept truncated to 32 bits exactly as the index stores them, so a freshly
/// stat'ed file compares equal to its recorded signature.
///
/// ## Timestamps
///
/// - `ctime`: File status change time (inode modification)
/// - `mtime`: File content modification time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryMetadata {
    pub ctime: u32,
    pub ctime_nsec: u32,
    pub mtime: u32,
    pub mtime_nsec: u32,
    pub dev: u32,
    pub ino: u32,
    pub mode: EntryMode,
    pub uid: u32,
    pub gid: u32,
    pub size: u32,
}

impl EntryMetadata {
    /// Stat signature of a file whose mode has already been classified
    pub fn from_fs(metadata: &Metadata, mode: EntryMode) -> Self {
        EntryMetadata {
            ctime: metadata.ctime() as u32,
            ctime_nsec: metadata.ctime_nsec() as u32,
            mtime: metadata.mtime() as u32,
            mtime_nsec: metadata.mtime_nsec() as u32,
            dev: metadata.dev() as u32,
            ino: metadata.ino() as u32,
            mode,
            uid: metadata.uid(),
            gid: metadata.gid(),
            size: metadata.size() as u32,
        }
    }
}

/// Index entry representing a tracked path at one merge stage
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexEntry {
    #[new(into)]
    pub name: String,
    pub oid: ObjectId,
    pub metadata: EntryMetadata,
    #[new(default)]
    pub stage: u8,
    #[new(default)]
    pub flags: EntryFlags,
    #[new(default)]
    pub extended_flags: ExtendedFlags,
}

impl IndexEntry {
    pub fn basename(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Every ancestor directory, outermost first: `a/b/c` gives `a`, `a/b`
    pub fn parent_dirs(&self) -> Vec<&str> {
        self.name
            .match_indices('/')
            .map(|(position, _)| &self.name[..position])
            .collect()
    }

    pub fn is_conflicted(&self) -> bool {
        self.stage != 0
    }

    /// Entries the working tree check must leave alone
    pub fn skips_worktree(&self) -> bool {
        self.flags.contains(EntryFlags::ASSUME_VALID)
            || self.extended_flags.contains(ExtendedFlags::SKIP_WORKTREE)
    }

    pub fn needs_extended_flags(&self) -> bool {
        !self.extended_flags.is_empty()
    }

    /// Mode and (unless unknown) size agree with a fresh stat
    pub fn stat_match(&self, other: &EntryMetadata) -> bool {
        (self.metadata.size == 0 || self.metadata.size == other.size)
            && self.metadata.mode == other.mode
    }

    pub fn times_match(&self, other: &EntryMetadata) -> bool {
        self.metadata.ctime == other.ctime
            && self.metadata.ctime_nsec == other.ctime_nsec
            && self.metadata.mtime == other.mtime
            && self.metadata.mtime_nsec == other.mtime_nsec
    }

    /// Total on-disk size, padding included
    pub fn disk_size(&self) -> usize {
        let fixed = ENTRY_FIXED_SIZE
            + if self.needs_extended_flags() {
                EXTENDED_FLAGS_SIZE
            } else {
                0
            };
        padded_size(fixed + self.name.len())
    }

    pub(crate) fn serialize(&self) -> Bytes {
        let mut flags = self.flags - EntryFlags::EXTENDED;
        if self.needs_extended_flags() {
            flags |= EntryFlags::EXTENDED;
        }
        let name_length = self.name.len().min(NAME_LENGTH_MASK as usize) as u16;
        let flags = flags.bits() | ((self.stage as u16) << STAGE_SHIFT) | name_length;

        let mut entry_bytes = Vec::with_capacity(self.disk_size());
        // writes into a Vec cannot fail
        for field in [
            self.metadata.ctime,
            self.metadata.ctime_nsec,
            self.metadata.mtime,
            self.metadata.mtime_nsec,
            self.metadata.dev,
            self.metadata.ino,
            self.metadata.mode.as_u32(),
            self.metadata.uid,
            self.metadata.gid,
            self.metadata.size,
        ] {
            let _ = entry_bytes.write_u32::<NetworkEndian>(field);
        }
        entry_bytes.extend_from_slice(self.oid.as_bytes());
        let _ = entry_bytes.write_u16::<NetworkEndian>(flags);
        if self.needs_extended_flags() {
            let _ = entry_bytes.write_u16::<NetworkEndian>(self.extended_flags.bits());
        }
        entry_bytes.extend_from_slice(self.name.as_bytes());

        // There must be at least one NUL byte at the end
        entry_bytes.push(0);
        while entry_bytes.len() % ENTRY_BLOCK != 0 {
            entry_bytes.push(0);
        }

        Bytes::from(entry_bytes)
    }

    /// Decode one complete on-disk entry, padding included
    pub(crate) fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < ENTRY_FIXED_SIZE {
            return Err(Error::MalformedIndex("truncated entry".to_string()));
        }

        let field = |index: usize| NetworkEndian::read_u32(&bytes[index * 4..index * 4 + 4]);
        let raw_mode = field(6);
        let mode = EntryMode::from_bits(raw_mode)
            .filter(|mode| !mode.is_tree())
            .ok_or_else(|| Error::MalformedIndex(format!("invalid entry mode {raw_mode:o}")))?;

        let metadata = EntryMetadata {
            ctime: field(0),
            ctime_nsec: field(1),
            mtime: field(2),
            mtime_nsec: field(3),
            dev: field(4),
            ino: field(5),
            mode,
            uid: field(7),
            gid: field(8),
            size: field(9),
        };

        let oid = ObjectId::read_h40_from(&mut &bytes[40..60])
            .map_err(|_| Error::MalformedIndex("truncated object id".to_string()))?;

        let raw_flags = NetworkEndian::read_u16(&bytes[60..62]);
        let flags = EntryFlags::from_bits_truncate(raw_flags);
        let stage = ((raw_flags & STAGE_MASK) >> STAGE_SHIFT) as u8;

        let (extended_flags, name_start) = if flags.contains(EntryFlags::EXTENDED) {
            let extended = bytes
                .get(ENTRY_FIXED_SIZE..ENTRY_FIXED_SIZE + EXTENDED_FLAGS_SIZE)
                .ok_or_else(|| Error::MalformedIndex("truncated extended flags".to_string()))?;
            (
                ExtendedFlags::from_bits_retain(NetworkEndian::read_u16(extended)),
                ENTRY_FIXED_SIZE + EXTENDED_FLAGS_SIZE,
            )
        } else {
            (ExtendedFlags::empty(), ENTRY_FIXED_SIZE)
        };

        let name_end = bytes[name_start..]
            .iter()
            .position(|&b| b == 0)
            .map(|offset| name_start + offset)
            .ok_or_else(|| Error::MalformedIndex("missing NUL after entry name".to_string()))?;
        let name = std::str::from_utf8(&bytes[name_start..name_end])
            .map_err(|_| Error::MalformedIndex("entry name is not valid UTF-8".to_string()))?;
        if name.is_empty() {
            return Err(Error::MalformedIndex("empty entry name".to_string()));
        }

        Ok(IndexEntry {
            name: name.to_string(),
            oid,
            metadata,
            stage,
            flags: flags - EntryFlags::EXTENDED,
            extended_flags,
        })
    }
}

/// Size of an entry whose fixed part and name take `unpadded` bytes
pub fn padded_size(unpadded: usize) -> usize {
    (unpadded + ENTRY_BLOCK) / ENTRY_BLOCK * ENTRY_BLOCK
}
