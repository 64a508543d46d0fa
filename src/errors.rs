//! Error types shared by every storage area.
//!
//! Each area reports failures through [`Error`] so callers can tell a missing object from a
//! corrupt one, or a checksum mismatch from an I/O failure, without string matching.

use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use std::path::PathBuf;

/// Errors raised by the object store, reference resolver, object model, staging index and
/// diff engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No object with this id exists in the object store.
    #[error("object {0} not found")]
    ObjectNotFound(ObjectId),

    /// The stored object could not be inflated or its header does not match its payload.
    #[error("object {oid} is corrupt: {reason}")]
    ObjectCorrupt { oid: ObjectId, reason: String },

    /// The text is not a 40 character hexadecimal object id.
    #[error("invalid object id: {0:?}")]
    InvalidObjectId(String),

    /// The reference (or a reference it points to) does not exist.
    #[error("reference {0} not found")]
    RefNotFound(String),

    /// Symbolic references nest deeper than the resolver follows.
    #[error("reference {name} exceeds the maximum symbolic depth of {max}")]
    RefChainTooDeep { name: String, max: usize },

    /// The reference name could escape the git directory or is otherwise unusable.
    #[error("invalid reference name: {0:?}")]
    InvalidRefName(String),

    /// A tree or commit payload is not structurally well-formed.
    #[error("malformed {kind} object: {reason}")]
    MalformedObject { kind: ObjectType, reason: String },

    /// The trailing checksum of the index file does not match its content.
    #[error("index checksum mismatch: expected {expected}, computed {actual}")]
    IndexChecksumMismatch { expected: String, actual: String },

    /// Entries in the index file are not strictly sorted by path and stage.
    #[error("index entries out of order: {previous:?} is followed by {current:?}")]
    IndexOrderingViolation { previous: String, current: String },

    /// The index file layout is invalid (signature, version, truncation, padding).
    #[error("malformed index: {0}")]
    MalformedIndex(String),

    /// Reading or writing the index file failed.
    #[error("index I/O failure on {path}")]
    IndexIOFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A tracked working file vanished or became unreadable while being re-hashed.
    #[error("cannot read working file {path}")]
    WorkingFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The path does not lie inside the repository's work tree.
    #[error("{path} is outside repository at {root}")]
    PathOutsideRepository { path: PathBuf, root: PathBuf },

    /// Any other filesystem failure while touching objects, refs or the work tree.
    #[error("I/O failure on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn index_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::IndexIOFailure {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(kind: ObjectType, reason: impl Into<String>) -> Self {
        Error::MalformedObject {
            kind,
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
