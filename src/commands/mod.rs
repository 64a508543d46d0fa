//! Command implementations behind the `bit` binary
//!
//! Commands are split the way git splits them:
//!
//! - `plumbing`: direct access to objects, refs and the index (hash-object, cat-file, ...)
//! - `porcelain`: user-facing workflows composed from the areas (add, status)
//!
//! Every command writes its output to the writer it is handed.

pub mod plumbing;
pub mod porcelain;
