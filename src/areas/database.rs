//! Object database
//!
//! Loose objects live under `objects/<xx>/<38 hex chars>`, zlib-compressed, each holding
//! `<type> <size>\0<content>`. Objects are immutable: a write of content that is already
//! stored leaves the existing file untouched.

use crate::artifacts::database::FlatTree;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, Unpackable, frame_object};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::{Tree, TreeBuilder};
use crate::areas::index::Index;
use crate::errors::{Error, Result};
use bytes::Bytes;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    fn object_path(&self, object_id: &ObjectId) -> PathBuf {
        self.path.join(object_id.to_path())
    }

    /// Store `content` as an object of `object_type` and return its id
    pub fn put(&self, object_type: ObjectType, content: &[u8]) -> Result<ObjectId> {
        let framed = frame_object(object_type, content);
        let object_id = ObjectId::digest(&framed);
        let object_path = self.object_path(&object_id);

        if object_path.exists() {
            tracing::trace!(oid = %object_id, "object already stored");
            return Ok(object_id);
        }

        self.write_object(&object_path, &framed)?;
        tracing::debug!(oid = %object_id, kind = %object_type, size = content.len(), "stored object");

        Ok(object_id)
    }

    pub fn store(&self, object: &impl Object) -> Result<ObjectId> {
        self.put(object.object_type(), &object.serialize()?)
    }

    /// Read an object, returning its kind and its content without the header
    pub fn get(&self, object_id: &ObjectId) -> Result<(ObjectType, Bytes)> {
        let object_path = self.object_path(object_id);
        let compressed = std::fs::read(&object_path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => Error::ObjectNotFound(*object_id),
            _ => Error::io(&object_path, source),
        })?;

        let corrupt = |reason: String| Error::ObjectCorrupt {
            oid: *object_id,
            reason,
        };

        let raw = Self::decompress(&compressed)
            .map_err(|e| corrupt(format!("cannot inflate: {e}")))?;
        let mut reader = Cursor::new(raw);
        let (object_type, size) = ObjectType::parse_header(&mut reader).map_err(corrupt)?;

        let header_length = reader.position() as usize;
        let content = Bytes::from(reader.into_inner()).slice(header_length..);
        if content.len() != size {
            return Err(corrupt(format!(
                "header announces {size} bytes but {} follow",
                content.len()
            )));
        }

        Ok((object_type, content))
    }

    pub fn contains(&self, object_id: &ObjectId) -> bool {
        self.object_path(object_id).is_file()
    }

    pub fn object_type(&self, object_id: &ObjectId) -> Result<ObjectType> {
        self.get(object_id).map(|(object_type, _)| object_type)
    }

    pub fn decode_tree(&self, object_id: &ObjectId) -> Result<Tree> {
        self.decode(object_id, ObjectType::Tree)
    }

    pub fn decode_commit(&self, object_id: &ObjectId) -> Result<Commit> {
        self.decode(object_id, ObjectType::Commit)
    }

    fn decode<T: Unpackable>(&self, object_id: &ObjectId, expected: ObjectType) -> Result<T> {
        let (object_type, content) = self.get(object_id)?;

        if object_type != expected {
            return Err(Error::malformed(
                expected,
                format!("{object_id} is a {object_type}"),
            ));
        }

        T::deserialize(content)
    }

    /// List every non-tree entry below the tree `object_id` under its full path
    ///
    /// Gitlinks are listed as entries; their commits live in another repository.
    pub fn flatten_tree(&self, object_id: &ObjectId) -> Result<FlatTree> {
        let mut flat_tree = FlatTree::new();
        self.flatten_into(object_id, None, &mut flat_tree)?;

        Ok(flat_tree)
    }

    fn flatten_into(
        &self,
        object_id: &ObjectId,
        prefix: Option<&str>,
        flat_tree: &mut FlatTree,
    ) -> Result<()> {
        let tree = self.decode_tree_or_empty(object_id)?;

        for entry in tree.entries() {
            let path = match prefix {
                Some(prefix) => format!("{prefix}/{}", entry.name),
                None => entry.name.clone(),
            };

            if entry.mode.is_tree() {
                self.flatten_into(&entry.oid, Some(&path), flat_tree)?;
            } else {
                flat_tree.insert(path, entry.as_database_entry());
            }
        }

        Ok(())
    }

    /// Store the trees describing the stage-0 entries of `index`; returns the root tree id
    pub fn write_tree(&self, index: &Index) -> Result<ObjectId> {
        if let Some(conflict) = index.entries().find(|entry| entry.is_conflicted()) {
            return Err(Error::MalformedIndex(format!(
                "cannot write a tree while {} is unmerged",
                conflict.name
            )));
        }

        let builder = TreeBuilder::build(
            index
                .entries()
                .map(|entry| (entry.name.as_str(), DatabaseEntry::new(entry.oid, entry.metadata.mode))),
        )?;

        builder.write(&mut |tree: &Tree| self.store(tree))
    }

    pub fn empty_tree_id() -> ObjectId {
        crate::artifacts::objects::object::hash_object(ObjectType::Tree, &[])
    }

    /// The empty tree is implied by every repository, stored or not
    pub fn decode_tree_or_empty(&self, object_id: &ObjectId) -> Result<Tree> {
        if *object_id == Self::empty_tree_id() && !self.contains(object_id) {
            return Tree::new(Vec::new());
        }

        self.decode_tree(object_id)
    }

    fn write_object(&self, object_path: &Path, framed: &[u8]) -> Result<()> {
        let object_dir = object_path
            .parent()
            .ok_or_else(|| Error::io(object_path, std::io::ErrorKind::InvalidInput.into()))?;
        std::fs::create_dir_all(object_dir).map_err(|e| Error::io(object_dir, e))?;

        let compressed = Self::compress(framed).map_err(|e| Error::io(object_path, e))?;

        // write a temp file next to the object and rename it so readers never see a partial object
        let mut temp_file = tempfile::Builder::new()
            .prefix("tmp_obj_")
            .tempfile_in(object_dir)
            .map_err(|e| Error::io(object_dir, e))?;
        temp_file
            .write_all(&compressed)
            .map_err(|e| Error::io(temp_file.path(), e))?;

        match temp_file.persist_noclobber(object_path) {
            Ok(_) => Ok(()),
            // a concurrent writer stored the same content first
            Err(_) if object_path.exists() => Ok(()),
            Err(e) => Err(Error::io(object_path, e.error)),
        }
    }

    fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut decoder = flate2::read::ZlibDecoder::new(data);
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed)?;

        Ok(decompressed)
    }
}
