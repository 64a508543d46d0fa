//! Plumbing commands (low-level Git operations)
//!
//! ## Commands
//!
//! - `hash-object`: Compute object ID and optionally store in database
//! - `cat-file`: Print an object's type or content
//! - `ls-files`: List index entries
//! - `rev-parse`: Resolve a name to an object ID
//! - `symbolic-ref`: Show where a symbolic reference points
//! - `write-tree`: Store the index as a tree

pub mod cat_file;
pub mod hash_object;
pub mod ls_files;
pub mod rev_parse;
pub mod symbolic_ref;
pub mod write_tree;
