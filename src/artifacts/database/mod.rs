use crate::artifacts::database::database_entry::DatabaseEntry;
use std::collections::BTreeMap;

pub mod database_entry;

/// Every blob reachable from a tree keyed by its full `/`-separated path
///
/// The map iterates in path byte order, the same order the index keeps its entries in.
pub type FlatTree = BTreeMap<String, DatabaseEntry>;
