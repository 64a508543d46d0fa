//! SHA-1 trailer handling for the index file
//!
//! Every byte read or written through [`Checksum`] feeds the running digest, so the
//! trailer can be verified (or produced) once the last section has gone through.

use crate::artifacts::index::CHECKSUM_SIZE;
use crate::errors::{Error, Result};
use bytes::{Buf, Bytes};
use sha1::{Digest, Sha1};

#[derive(Debug)]
pub struct Checksum<T> {
    inner: T,
    digest: Sha1,
}

impl<T> Checksum<T> {
    pub(crate) fn new(inner: T) -> Self {
        Checksum {
            inner,
            digest: Sha1::new(),
        }
    }
}

impl Checksum<Bytes> {
    /// Take `size` bytes from the front of the buffer
    pub(crate) fn read(&mut self, size: usize) -> Result<Bytes> {
        if self.inner.remaining() < size {
            return Err(Error::MalformedIndex(
                "unexpected end-of-file while reading index".to_string(),
            ));
        }

        let chunk = self.inner.split_to(size);
        self.digest.update(&chunk);
        Ok(chunk)
    }

    /// Bytes left, trailer included
    pub(crate) fn remaining(&self) -> usize {
        self.inner.remaining()
    }

    /// Compare the trailing checksum with the digest of everything read so far
    pub(crate) fn verify(mut self) -> Result<()> {
        if self.inner.remaining() != CHECKSUM_SIZE {
            return Err(Error::MalformedIndex(format!(
                "expected {} trailing checksum bytes, found {}",
                CHECKSUM_SIZE,
                self.inner.remaining()
            )));
        }

        let expected = self.inner.split_to(CHECKSUM_SIZE);
        let actual = self.digest.finalize();

        if expected[..] != actual[..] {
            return Err(Error::IndexChecksumMismatch {
                expected: hex::encode(expected),
                actual: hex::encode(actual),
            });
        }

        Ok(())
    }
}

impl Checksum<Vec<u8>> {
    pub(crate) fn write(&mut self, data: &[u8]) {
        self.inner.extend_from_slice(data);
        self.digest.update(data);
    }

    /// Append the digest of everything written and hand back the buffer
    pub(crate) fn write_checksum(mut self) -> Vec<u8> {
        let checksum = self.digest.finalize();
        self.inner.extend_from_slice(checksum.as_slice());
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn written(data: &[u8]) -> Bytes {
        let mut writer = Checksum::new(Vec::new());
        writer.write(data);
        Bytes::from(writer.write_checksum())
    }

    #[test]
    fn written_trailer_verifies() {
        let mut reader = Checksum::new(written(b"DIRC payload"));

        assert_eq!(&reader.read(4).unwrap()[..], b"DIRC");
        assert_eq!(&reader.read(8).unwrap()[..], b" payload");
        assert_eq!(reader.remaining(), CHECKSUM_SIZE);
        reader.verify().unwrap();
    }

    #[test]
    fn flipped_trailer_byte_is_a_mismatch() {
        let mut bytes = written(b"DIRC payload").to_vec();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;

        let mut reader = Checksum::new(Bytes::from(bytes));
        reader.read(12).unwrap();

        assert!(matches!(
            reader.verify(),
            Err(Error::IndexChecksumMismatch { .. })
        ));
    }

    #[test]
    fn reading_past_the_end_is_malformed() {
        let mut reader = Checksum::new(Bytes::from_static(b"DIR"));

        assert!(matches!(reader.read(4), Err(Error::MalformedIndex(_))));
    }
}
