//! Stateful storage areas of a repository
//!
//! - `database`: Object database for storing blobs, trees, and commits
//! - `index`: Staging area with its on-disk freshness cache
//! - `refs`: Reference resolution (HEAD, branches, tags, packed refs)
//! - `repository`: Handle owning all of the above
//! - `workspace`: Working directory file system access

pub mod database;
pub mod index;
pub mod refs;
pub mod repository;
pub mod workspace;
