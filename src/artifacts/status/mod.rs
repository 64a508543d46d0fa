//! Three-way status between a tree, the index and the working tree
//!
//! ## Components
//!
//! - `file_change`: the single tag each path receives
//! - `inspector`: per-path comparisons (index versus tree, index versus working file)
//! - `index_diff`: merge-join over the flattened tree and the index

pub mod file_change;
pub mod index_diff;
pub mod inspector;
