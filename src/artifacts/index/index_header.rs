use crate::artifacts::index::{EXTENDED_VERSION, HEADER_SIZE, SIGNATURE, VERSION};
use crate::errors::{Error, Result};
use byteorder::{ByteOrder, NetworkEndian, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexHeader {
    pub(crate) version: u32,
    pub(crate) entries_count: u32,
}

impl IndexHeader {
    pub(crate) fn serialize(&self) -> Bytes {
        let mut bytes = Vec::with_capacity(HEADER_SIZE);
        bytes.extend_from_slice(SIGNATURE);
        // writes into a Vec cannot fail
        let _ = bytes.write_u32::<NetworkEndian>(self.version);
        let _ = bytes.write_u32::<NetworkEndian>(self.entries_count);

        Bytes::from(bytes)
    }

    /// Parse and validate the 12-byte header
    pub(crate) fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::MalformedIndex("truncated header".to_string()));
        }

        if &bytes[0..4] != SIGNATURE {
            return Err(Error::MalformedIndex(format!(
                "invalid signature {:?}",
                String::from_utf8_lossy(&bytes[0..4])
            )));
        }

        let version = NetworkEndian::read_u32(&bytes[4..8]);
        if !(VERSION..=EXTENDED_VERSION).contains(&version) {
            return Err(Error::MalformedIndex(format!(
                "unsupported version {version}"
            )));
        }

        let entries_count = NetworkEndian::read_u32(&bytes[8..12]);

        Ok(IndexHeader {
            version,
            entries_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn header_layout_is_signature_version_count() {
        let bytes = IndexHeader::new(2, 11).serialize();

        assert_eq!(&bytes[..], b"DIRC\0\0\0\x02\0\0\0\x0b");
        assert_eq!(IndexHeader::deserialize(&bytes).unwrap(), IndexHeader::new(2, 11));
    }

    #[rstest]
    #[case(b"DIRX\0\0\0\x02\0\0\0\0".to_vec())]
    #[case(b"DIRC\0\0\0\x04\0\0\0\0".to_vec())]
    #[case(b"DIRC\0\0\0\x01\0\0\0\0".to_vec())]
    #[case(b"DIRC\0\0".to_vec())]
    fn invalid_headers_are_malformed(#[case] bytes: Vec<u8>) {
        assert!(matches!(
            IndexHeader::deserialize(&bytes),
            Err(Error::MalformedIndex(_))
        ));
    }
}
