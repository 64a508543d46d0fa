//! Storage core of a git-compatible version control engine
//!
//! - `areas`: object database, reference store, staging index, working tree, repository handle
//! - `artifacts`: object model, index file format, reference formats, status engine
//! - `commands`: plumbing commands built on the areas, as used by the `bit` binary
//! - `config`: repository layout and load policies
//! - `errors`: the crate's error type

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod config;
pub mod errors;

pub use errors::{Error, Result};
