//! Git tree object
//!
//! Trees represent directory snapshots. They contain entries for files (blobs),
//! symlinks, submodules (gitlinks) and subdirectories (other trees).
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`
//! Each entry: `<mode> <name>\0<20-byte-sha1>`
//!
//! Entries are sorted by name bytes, where a subtree's name compares as if it ended in
//! `/`. This is the order in which a flattened tree lines up with the index, so decoding
//! insists on it.
//!
//! ## Tree Building
//!
//! [`TreeBuilder`] turns the flat path list of the index into nested trees, written
//! children first since a parent embeds its children's ids.

use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{Error, Result};
use bytes::{Buf, Bytes};
use derive_new::new;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::io::Write;

/// One `(mode, name, id)` row of a tree
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct TreeEntry {
    pub mode: EntryMode,
    #[new(into)]
    pub name: String,
    pub oid: ObjectId,
}

impl TreeEntry {
    pub fn as_database_entry(&self) -> DatabaseEntry {
        DatabaseEntry::new(self.oid, self.mode)
    }

    fn cmp_position(&self, other: &Self) -> Ordering {
        compare_entry_names(&self.name, self.mode.is_tree(), &other.name, other.mode.is_tree())
    }
}

/// Git's tree ordering: byte order, with subtree names compared as if suffixed by `/`
pub fn compare_entry_names(a: &str, a_is_tree: bool, b: &str, b_is_tree: bool) -> Ordering {
    let suffix = |is_tree: bool| if is_tree { Some(b'/') } else { None };
    let a_bytes = a.bytes().chain(suffix(a_is_tree));
    let b_bytes = b.bytes().chain(suffix(b_is_tree));

    a_bytes.cmp(b_bytes)
}

/// Git tree object representing a directory snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create a tree from entries in any order
    ///
    /// Fails on duplicate names, since a directory cannot hold two entries with one name.
    pub fn new(mut entries: Vec<TreeEntry>) -> Result<Self> {
        let mut names = HashSet::new();
        if let Some(duplicate) = entries.iter().find(|entry| !names.insert(entry.name.as_str())) {
            return Err(Error::malformed(
                ObjectType::Tree,
                format!("duplicate entry {:?}", duplicate.name),
            ));
        }

        entries.sort_by(|a, b| a.cmp_position(b));

        Ok(Tree { entries })
    }

    pub fn entries(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> impl Iterator<Item = TreeEntry> {
        self.entries.into_iter()
    }

    pub fn entry(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() || name == "." || name == ".." || name.contains('/') {
            return Err(Error::malformed(
                ObjectType::Tree,
                format!("invalid entry name {name:?}"),
            ));
        }

        Ok(())
    }
}

impl Packable for Tree {
    fn serialize(&self) -> Result<Bytes> {
        let mut content = Vec::new();

        for entry in &self.entries {
            // writes into a Vec cannot fail
            let _ = write!(content, "{} {}", entry.mode.as_str(), entry.name);
            content.push(0);
            content.extend_from_slice(entry.oid.as_bytes());
        }

        Ok(Bytes::from(content))
    }
}

impl Unpackable for Tree {
    fn deserialize(mut content: Bytes) -> Result<Self> {
        let mut entries: Vec<TreeEntry> = Vec::new();

        while content.has_remaining() {
            let space = content
                .iter()
                .position(|&b| b == b' ')
                .ok_or_else(|| Error::malformed(ObjectType::Tree, "unexpected end of entry mode"))?;
            let mode_bytes = content.split_to(space);
            content.advance(1);

            let mode = std::str::from_utf8(&mode_bytes)
                .ok()
                .and_then(EntryMode::from_octal_str)
                .ok_or_else(|| {
                    Error::malformed(
                        ObjectType::Tree,
                        format!("unrecognized mode {:?}", String::from_utf8_lossy(&mode_bytes)),
                    )
                })?;

            let nul = content
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| Error::malformed(ObjectType::Tree, "unexpected end of entry name"))?;
            let name_bytes = content.split_to(nul);
            content.advance(1);

            let name = std::str::from_utf8(&name_bytes)
                .map_err(|_| Error::malformed(ObjectType::Tree, "entry name is not valid UTF-8"))?
                .to_string();
            Tree::validate_name(&name)?;

            if content.remaining() < crate::artifacts::objects::OBJECT_ID_SIZE {
                return Err(Error::malformed(
                    ObjectType::Tree,
                    format!("truncated object id for {name:?}"),
                ));
            }
            let oid = ObjectId::read_h40_from(&mut content.split_to(20).reader())
                .map_err(|e| Error::malformed(ObjectType::Tree, e.to_string()))?;

            let entry = TreeEntry::new(mode, name, oid);
            if let Some(previous) = entries.last()
                && previous.cmp_position(&entry) != Ordering::Less
            {
                return Err(Error::malformed(
                    ObjectType::Tree,
                    format!("entry {:?} is out of order after {:?}", entry.name, previous.name),
                ));
            }

            entries.push(entry);
        }

        Ok(Tree { entries })
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }
}

impl std::fmt::Display for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for entry in &self.entries {
            writeln!(
                f,
                "{} {} {}\t{}",
                entry.mode,
                entry.mode.object_type(),
                entry.oid,
                entry.name
            )?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(DatabaseEntry),
    Directory(TreeBuilder),
}

/// Nested tree under construction, keyed by entry name
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    nodes: BTreeMap<String, Node>,
}

impl TreeBuilder {
    /// Build nested trees from `(path, entry)` pairs whose paths use `/` separators
    pub fn build<'e>(entries: impl IntoIterator<Item = (&'e str, DatabaseEntry)>) -> Result<Self> {
        let mut root = Self::default();

        for (path, entry) in entries {
            let components = path.split('/').collect::<Vec<_>>();
            root.insert(&components, entry)?;
        }

        Ok(root)
    }

    fn insert(&mut self, components: &[&str], entry: DatabaseEntry) -> Result<()> {
        match components {
            [] => Ok(()),
            [name] => {
                Tree::validate_name(name)?;
                match self.nodes.insert(name.to_string(), Node::Leaf(entry)) {
                    Some(Node::Directory(_)) => Err(Error::malformed(
                        ObjectType::Tree,
                        format!("{name:?} is both a file and a directory"),
                    )),
                    _ => Ok(()),
                }
            }
            [parent, rest @ ..] => {
                Tree::validate_name(parent)?;
                let node = self
                    .nodes
                    .entry(parent.to_string())
                    .or_insert_with(|| Node::Directory(TreeBuilder::default()));

                match node {
                    Node::Directory(subtree) => subtree.insert(rest, entry),
                    Node::Leaf(_) => Err(Error::malformed(
                        ObjectType::Tree,
                        format!("{parent:?} is both a file and a directory"),
                    )),
                }
            }
        }
    }

    /// Write every subtree, children first, through `store`; returns the root tree's id
    pub fn write<F>(&self, store: &mut F) -> Result<ObjectId>
    where
        F: FnMut(&Tree) -> Result<ObjectId>,
    {
        let mut entries = Vec::with_capacity(self.nodes.len());

        for (name, node) in &self.nodes {
            let entry = match node {
                Node::Leaf(entry) => TreeEntry::new(entry.mode, name.as_str(), entry.oid),
                Node::Directory(subtree) => {
                    TreeEntry::new(EntryMode::Directory, name.as_str(), subtree.write(store)?)
                }
            };
            entries.push(entry);
        }

        store(&Tree::new(entries)?)
    }
}
