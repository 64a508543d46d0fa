//! Git data structures and algorithms
//!
//! - `database`: Entry types shared by trees and the object database
//! - `index`: Index file format (header, entries, extensions, checksum)
//! - `objects`: Git object types (blob, tree, commit)
//! - `refs`: Reference names and the packed-refs format
//! - `status`: Tree/index/working tree comparison

pub mod database;
pub mod index;
pub mod objects;
pub mod refs;
pub mod status;
