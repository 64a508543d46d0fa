//! Index extension blocks
//!
//! Extensions follow the entries as `<4-byte signature><u32 size><payload>`. They are kept
//! as raw bytes and written back verbatim; the staging area never interprets them.
//! Some of them cache facts derived from the entries (cached trees, untracked file
//! caches, entry offset tables) and go stale once the entry set changes.

use byteorder::{NetworkEndian, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;

/// Size of an extension's signature plus its length field
pub const EXTENSION_HEADER_SIZE: usize = 8;

/// Extensions describing the entries themselves
const ENTRY_DERIVED_SIGNATURES: [&[u8; 4]; 4] = [b"TREE", b"UNTR", b"EOIE", b"IEOT"];

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Extension {
    signature: [u8; 4],
    data: Bytes,
}

impl Extension {
    pub fn signature(&self) -> &[u8; 4] {
        &self.signature
    }

    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.signature).into_owned()
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Uppercase signatures mark extensions a reader may ignore
    pub fn is_optional(&self) -> bool {
        self.signature[0].is_ascii_uppercase()
    }

    /// Whether the payload goes stale when entries are added or removed
    pub fn is_entry_derived(&self) -> bool {
        ENTRY_DERIVED_SIGNATURES.contains(&&self.signature)
    }

    pub(crate) fn serialize(&self) -> Bytes {
        let mut bytes = Vec::with_capacity(EXTENSION_HEADER_SIZE + self.data.len());
        bytes.extend_from_slice(&self.signature);
        // writes into a Vec cannot fail
        let _ = bytes.write_u32::<NetworkEndian>(self.data.len() as u32);
        bytes.extend_from_slice(&self.data);

        Bytes::from(bytes)
    }
}
