//! Git index file format
//!
//! The index (also called staging area or cache) records what the next commit will contain.
//!
//! ## File Format (Versions 2 and 3)
//!
//! ```text
//! Header (12 bytes):
//!   - Signature: "DIRC" (4 bytes)
//!   - Version: 2 or 3 (4 bytes)
//!   - Entry count (4 bytes)
//!
//! Entries (variable length):
//!   - 62 bytes of stat data, object id and flags
//!   - 2 bytes of extended flags (version 3, when the entry's extended bit is set)
//!   - Path, then 1 to 8 NUL bytes padding the entry to an 8-byte boundary
//!
//! Extensions (optional, repeated):
//!   - Signature (4 bytes), payload size (4 bytes), payload
//!
//! Checksum (20 bytes):
//!   - SHA-1 hash of all preceding bytes
//! ```
//!
//! All integers are big-endian.

pub mod checksum;
pub mod entry_mode;
pub mod extension;
pub mod index_entry;
pub mod index_header;

/// Size of SHA-1 checksum in bytes
pub const CHECKSUM_SIZE: usize = 20;

/// Size of index header in bytes
pub const HEADER_SIZE: usize = 12;

/// Magic signature identifying index files
pub const SIGNATURE: &[u8; 4] = b"DIRC";

/// Default index file format version
pub const VERSION: u32 = 2;

/// Version that adds the extended flags word
pub const EXTENDED_VERSION: u32 = 3;
