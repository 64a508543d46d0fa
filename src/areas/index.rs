//! Git index (staging area)
//!
//! The index records which content goes into the next commit, together with a stat
//! signature per path so unchanged working files need not be re-hashed.
//!
//! ## Data Structures
//!
//! - `entries`: entries keyed by `(path, stage)`, iterated in path byte order
//! - `children`: directory paths mapped to the entry paths below them, for file/directory
//!   replacement
//! - `extensions`: opaque extension blocks written back as they were read
//!
//! ## Freshness
//!
//! A loaded index remembers the modification time and size of the file it was parsed from.
//! [`Index::reread_if_necessary`] parses again only when those differ, so a handle notices
//! other processes replacing the file without re-parsing on every access.

use crate::areas::database::Database;
use crate::areas::workspace::Workspace;
use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::extension::{EXTENSION_HEADER_SIZE, Extension};
use crate::artifacts::index::index_entry::{
    ENTRY_FIXED_SIZE, EXTENDED_FLAGS_SIZE, EntryFlags, EntryMetadata, ExtendedFlags, IndexEntry,
    MAX_STAGE, NAME_LENGTH_MASK, padded_size,
};
use crate::artifacts::index::index_header::IndexHeader;
use crate::artifacts::index::{CHECKSUM_SIZE, EXTENDED_VERSION, HEADER_SIZE, VERSION};
use crate::artifacts::objects::object_type::ObjectType;
use crate::config::ChecksumPolicy;
use crate::errors::{Error, Result};
use byteorder::{ByteOrder, NetworkEndian};
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Write};
use std::ops::DerefMut;
use std::path::Path;
use std::time::SystemTime;

/// Entries are unique per path and merge stage
pub type EntryKey = (String, u8);

/// What the index file looked like when it was last parsed or written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    modified: SystemTime,
    len: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Unloaded,
    /// `stamp` is `None` when there was no index file
    Loaded { stamp: Option<FileStamp> },
}

/// Git index (staging area)
#[derive(Debug, Clone)]
pub struct Index {
    /// Path to the index file (typically `.git/index`)
    path: Box<Path>,
    entries: BTreeMap<EntryKey, IndexEntry>,
    children: BTreeMap<String, BTreeSet<String>>,
    extensions: Vec<Extension>,
    /// Version of the file last read; written files use the lowest version that fits
    version: u32,
    state: IndexState,
    /// Set when the in-memory index differs from the file
    changed: bool,
    parse_count: usize,
    checksum_policy: ChecksumPolicy,
    /// Cleared when entries were kept despite a checksum mismatch
    stat_trusted: bool,
}

/// Result of parsing an index file, committed to the [`Index`] only on success
struct ParsedIndex {
    version: u32,
    entries: Vec<IndexEntry>,
    extensions: Vec<Extension>,
    checksum_valid: bool,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Self::with_policy(path, ChecksumPolicy::default())
    }

    pub fn with_policy(path: Box<Path>, checksum_policy: ChecksumPolicy) -> Self {
        Index {
            path,
            entries: BTreeMap::new(),
            children: BTreeMap::new(),
            extensions: Vec::new(),
            version: VERSION,
            state: IndexState::Unloaded,
            changed: false,
            parse_count: 0,
            checksum_policy,
            stat_trusted: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> IndexState {
        self.state
    }

    /// Number of times an index file was parsed by this handle
    pub fn parse_count(&self) -> usize {
        self.parse_count
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn checksum_policy(&self) -> ChecksumPolicy {
        self.checksum_policy
    }

    /// Whether cached stat signatures may be used to skip re-hashing
    pub fn is_stat_trusted(&self) -> bool {
        self.stat_trusted
    }

    /// Called once every tracked file has been re-hashed against the work tree
    pub fn mark_stat_trusted(&mut self) {
        self.stat_trusted = true;
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.children.clear();
        self.extensions.clear();
        self.version = VERSION;
        self.changed = false;
        self.stat_trusted = true;
    }

    /// Parse the index file, replacing whatever is held in memory
    ///
    /// A missing or empty file loads as an empty index.
    ///
    /// # Locking
    ///
    /// Acquires a shared lock on the index file during reading.
    pub fn load(&mut self) -> Result<()> {
        let stamp = self.file_stamp()?;

        let data = match stamp {
            None => Bytes::new(),
            Some(_) => self.read_locked()?,
        };

        if data.is_empty() {
            self.clear();
            self.state = IndexState::Loaded { stamp };
            tracing::debug!(path = %self.path.display(), "no index file, starting empty");
            return Ok(());
        }

        let parsed = self.parse(data)?;
        self.parse_count += 1;

        if !parsed.checksum_valid {
            tracing::warn!(
                path = %self.path.display(),
                "index checksum mismatch tolerated, cached stat data will be ignored"
            );
        }

        self.clear();
        self.version = parsed.version;
        self.extensions = parsed.extensions;
        self.stat_trusted = parsed.checksum_valid;
        for entry in parsed.entries {
            self.store_entry(entry);
        }
        self.state = IndexState::Loaded { stamp };

        tracing::debug!(
            entries = self.entries.len(),
            version = self.version,
            extensions = self.extensions.len(),
            "parsed index"
        );

        Ok(())
    }

    /// Load the index unless the cached parse still matches the file on disk
    ///
    /// Returns whether a parse happened.
    pub fn reread_if_necessary(&mut self) -> Result<bool> {
        if let IndexState::Loaded { stamp } = self.state
            && stamp == self.file_stamp()?
        {
            return Ok(false);
        }

        self.load()?;
        Ok(true)
    }

    fn file_stamp(&self) -> Result<Option<FileStamp>> {
        let metadata = match std::fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::index_io(&*self.path, e)),
        };

        let modified = metadata
            .modified()
            .map_err(|e| Error::index_io(&*self.path, e))?;

        Ok(Some(FileStamp {
            modified,
            len: metadata.len(),
        }))
    }

    fn read_locked(&self) -> Result<Bytes> {
        let io_error = |e| Error::index_io(&*self.path, e);

        let mut index_file = std::fs::OpenOptions::new()
            .read(true)
            .open(&self.path)
            .map_err(io_error)?;
        let mut lock =
            file_guard::lock(&mut index_file, file_guard::Lock::Shared, 0, 1).map_err(io_error)?;

        let mut data = Vec::new();
        lock.deref_mut().read_to_end(&mut data).map_err(io_error)?;

        Ok(Bytes::from(data))
    }

    fn parse(&self, data: Bytes) -> Result<ParsedIndex> {
        let mut reader = Checksum::new(data);

        let header = IndexHeader::deserialize(&reader.read(HEADER_SIZE)?)?;
        let entries = Self::parse_entries(&header, &mut reader)?;
        let extensions = Self::parse_extensions(&mut reader)?;

        let checksum_valid = match reader.verify() {
            Ok(()) => true,
            Err(Error::IndexChecksumMismatch { .. })
                if self.checksum_policy == ChecksumPolicy::Recover =>
            {
                false
            }
            Err(e) => return Err(e),
        };

        Ok(ParsedIndex {
            version: header.version,
            entries,
            extensions,
            checksum_valid,
        })
    }

    /// Read every entry, rejecting any that is not strictly after its predecessor
    fn parse_entries(header: &IndexHeader, reader: &mut Checksum<Bytes>) -> Result<Vec<IndexEntry>> {
        // Every entry takes at least one padded block of fixed fields plus a name byte
        let max_entries =
            reader.remaining().saturating_sub(CHECKSUM_SIZE) / padded_size(ENTRY_FIXED_SIZE + 1);
        if header.entries_count as usize > max_entries {
            return Err(Error::MalformedIndex(format!(
                "index declares {} entries but holds at most {max_entries}",
                header.entries_count
            )));
        }

        let mut entries = Vec::<IndexEntry>::with_capacity(header.entries_count as usize);

        for _ in 0..header.entries_count {
            let entry = Self::parse_entry(header.version, reader)?;

            if let Some(previous) = entries.last()
                && (previous.name.as_str(), previous.stage) >= (entry.name.as_str(), entry.stage)
            {
                return Err(Error::IndexOrderingViolation {
                    previous: format!("{} (stage {})", previous.name, previous.stage),
                    current: format!("{} (stage {})", entry.name, entry.stage),
                });
            }

            entries.push(entry);
        }

        Ok(entries)
    }

    fn parse_entry(version: u32, reader: &mut Checksum<Bytes>) -> Result<IndexEntry> {
        let mut entry_bytes = reader.read(ENTRY_FIXED_SIZE)?.to_vec();
        let flags = NetworkEndian::read_u16(&entry_bytes[60..62]);

        if flags & EntryFlags::EXTENDED.bits() != 0 {
            if version < EXTENDED_VERSION {
                return Err(Error::MalformedIndex(format!(
                    "extended entry flags in a version {version} index"
                )));
            }
            entry_bytes.extend_from_slice(&reader.read(EXTENDED_FLAGS_SIZE)?);
        }
        let fixed_size = entry_bytes.len();

        let name_length = flags & NAME_LENGTH_MASK;
        let mut terminator_read = 0;
        if name_length < NAME_LENGTH_MASK {
            entry_bytes.extend_from_slice(&reader.read(name_length as usize)?);
        } else {
            // the length field saturated, the name runs up to the first NUL
            loop {
                let byte = reader.read(1)?;
                if byte[0] == 0 {
                    terminator_read = 1;
                    break;
                }
                entry_bytes.extend_from_slice(&byte);
            }
        }

        let name_end = entry_bytes.len();
        let padding = padded_size(name_end) - name_end;
        let padding_bytes = reader.read(padding - terminator_read)?;
        if padding_bytes.iter().any(|&b| b != 0) {
            return Err(Error::MalformedIndex(format!(
                "entry {:?} is not NUL padded",
                String::from_utf8_lossy(&entry_bytes[fixed_size..name_end])
            )));
        }
        entry_bytes.resize(name_end + padding, 0);

        IndexEntry::deserialize(&entry_bytes)
    }

    fn parse_extensions(reader: &mut Checksum<Bytes>) -> Result<Vec<Extension>> {
        let mut extensions = Vec::new();

        while reader.remaining() > CHECKSUM_SIZE {
            let header = reader.read(EXTENSION_HEADER_SIZE)?;
            let mut signature = [0u8; 4];
            signature.copy_from_slice(&header[0..4]);
            let size = NetworkEndian::read_u32(&header[4..8]) as usize;

            if size > reader.remaining().saturating_sub(CHECKSUM_SIZE) {
                return Err(Error::MalformedIndex(format!(
                    "extension {:?} overruns the index",
                    String::from_utf8_lossy(&signature)
                )));
            }

            extensions.push(Extension::new(signature, reader.read(size)?));
        }

        Ok(extensions)
    }

    /// Version 3 only when some entry carries extended flags
    fn output_version(&self) -> u32 {
        if self.entries.values().any(IndexEntry::needs_extended_flags) {
            EXTENDED_VERSION
        } else {
            VERSION
        }
    }

    /// Serialize header, entries, extensions and checksum
    pub fn to_bytes(&self) -> Bytes {
        let mut writer = Checksum::new(Vec::new());
        let header = IndexHeader::new(self.output_version(), self.entries.len() as u32);

        writer.write(&header.serialize());
        for entry in self.entries.values() {
            writer.write(&entry.serialize());
        }
        for extension in &self.extensions {
            writer.write(&extension.serialize());
        }

        Bytes::from(writer.write_checksum())
    }

    /// Persist the index through a temporary file renamed over the index file
    ///
    /// On failure the previous index file is left untouched.
    pub fn write(&mut self) -> Result<()> {
        let io_error = |e| Error::index_io(&*self.path, e);
        let data = self.to_bytes();

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut temp_file = tempfile::Builder::new()
            .prefix("index.tmp")
            .tempfile_in(dir)
            .map_err(io_error)?;
        temp_file.write_all(&data).map_err(io_error)?;
        temp_file.as_file().sync_all().map_err(io_error)?;
        temp_file.persist(&self.path).map_err(|e| io_error(e.error))?;

        self.version = self.output_version();
        self.state = IndexState::Loaded {
            stamp: self.file_stamp()?,
        };
        self.changed = false;

        tracing::debug!(entries = self.entries.len(), version = self.version, "wrote index");

        Ok(())
    }

    /// Entries in path byte order, stages ascending within a path
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    pub fn add_extension(&mut self, extension: Extension) {
        self.extensions.retain(|e| e.signature() != extension.signature());
        self.extensions.push(extension);
        self.changed = true;
    }

    /// Entry for `path`: stage 0 when present, otherwise the lowest conflict stage
    pub fn entry_by_path(&self, path: &str) -> Option<&IndexEntry> {
        self.stages(path).next()
    }

    /// Every stage recorded for `path`
    pub fn stages<'a>(&'a self, path: &str) -> impl Iterator<Item = &'a IndexEntry> + use<'a> {
        self.entries
            .range((path.to_string(), 0)..=(path.to_string(), MAX_STAGE))
            .map(|(_, entry)| entry)
    }

    pub fn is_conflicted(&self) -> bool {
        self.entries.values().any(IndexEntry::is_conflicted)
    }

    /// Check if a path is tracked directly in the index
    ///
    /// Returns true if the path is either a file entry or has children
    /// (is a directory with tracked files).
    pub fn is_directly_tracked(&self, path: &str) -> bool {
        self.stages(path).next().is_some() || self.children.contains_key(path)
    }

    /// Stage the working file `file` at stage 0, storing its content as a blob
    ///
    /// Nothing is written to disk until [`Index::write`].
    pub fn add(&mut self, workspace: &Workspace, database: &Database, file: &Path) -> Result<()> {
        let path = workspace.relative_path(file)?;
        let stat = workspace
            .stat_file(&path)?
            .ok_or_else(|| Error::WorkingFileUnreadable {
                path: workspace.absolute_path(&path),
                source: std::io::ErrorKind::NotFound.into(),
            })?;

        let content = workspace.read_blob(&path, stat.mode)?;
        let oid = database.put(ObjectType::Blob, &content)?;

        let mut entry = IndexEntry::new(path, oid, stat);
        if let Some(existing) = self.stages(&entry.name).find(|e| e.stage == 0) {
            entry.flags = existing.flags;
            entry.extended_flags = existing.extended_flags - ExtendedFlags::INTENT_TO_ADD;
        }

        self.add_entry(entry);

        Ok(())
    }

    /// Insert or replace an entry; returns false when an identical entry was already present
    ///
    /// Entries whose paths clash with the new one as file versus directory are dropped, as
    /// are the other stages of the same path.
    pub fn add_entry(&mut self, entry: IndexEntry) -> bool {
        let key = (entry.name.clone(), entry.stage);
        if self.entries.get(&key) == Some(&entry) {
            return false;
        }

        self.discard_conflicts(&entry);
        self.store_entry(entry);
        self.invalidate_entry_caches();
        self.changed = true;

        true
    }

    /// Drop `path` at every stage, and everything below it when it is a directory
    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.entries.len();

        self.remove_path(path);
        self.remove_children(path);

        let removed = self.entries.len() != before;
        if removed {
            self.invalidate_entry_caches();
            self.changed = true;
        }

        removed
    }

    /// Record a fresh stat signature for an entry whose content is known to be unchanged
    pub fn update_entry_stat(&mut self, path: &str, stage: u8, stat: EntryMetadata) {
        if let Some(entry) = self.entries.get_mut(&(path.to_string(), stage))
            && entry.metadata != stat
        {
            tracing::trace!(path, "refreshed stat signature");
            entry.metadata = stat;
            self.changed = true;
        }
    }

    fn invalidate_entry_caches(&mut self) {
        self.extensions.retain(|extension| {
            let keep = !extension.is_entry_derived();
            if !keep {
                tracing::debug!(extension = %extension.name(), "dropped stale index extension");
            }
            keep
        });
    }

    fn discard_conflicts(&mut self, entry: &IndexEntry) {
        for parent in entry.parent_dirs() {
            self.remove_path(parent);
        }
        self.remove_children(&entry.name);

        let other_stages = self
            .stages(&entry.name)
            .filter(|existing| (existing.stage == 0) != (entry.stage == 0))
            .map(|existing| existing.stage)
            .collect::<Vec<_>>();
        for stage in other_stages {
            self.remove_entry(&(entry.name.clone(), stage));
        }
    }

    fn store_entry(&mut self, entry: IndexEntry) {
        for parent in entry.parent_dirs() {
            self.children
                .entry(parent.to_string())
                .or_default()
                .insert(entry.name.clone());
        }

        self.entries.insert((entry.name.clone(), entry.stage), entry);
    }

    fn remove_children(&mut self, path: &str) {
        if let Some(children) = self.children.get(path).cloned() {
            for child in children {
                self.remove_path(&child);
            }
        }
    }

    fn remove_path(&mut self, path: &str) {
        let keys = self
            .stages(path)
            .map(|entry| (entry.name.clone(), entry.stage))
            .collect::<Vec<_>>();

        for key in keys {
            self.remove_entry(&key);
        }
    }

    fn remove_entry(&mut self, key: &EntryKey) {
        let Some(entry) = self.entries.remove(key) else {
            return;
        };

        if self.stages(&entry.name).next().is_some() {
            return;
        }

        for parent in entry.parent_dirs() {
            if let Some(children) = self.children.get_mut(parent) {
                children.remove(&entry.name);
                if children.is_empty() {
                    self.children.remove(parent);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::index::entry_mode::{EntryMode, FileMode};
    use crate::artifacts::objects::object_id::ObjectId;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn index() -> Index {
        Index::new(Path::new("unused-index").into())
    }

    fn entry(name: &str) -> IndexEntry {
        IndexEntry::new(
            name,
            ObjectId::digest(name.as_bytes()),
            EntryMetadata {
                mtime: 1255117188,
                mode: EntryMode::File(FileMode::Regular),
                size: name.len() as u32,
                ..Default::default()
            },
        )
    }

    fn names(index: &Index) -> Vec<String> {
        index.entries().map(|e| e.name.clone()).collect()
    }

    fn reparse(index: &Index) -> ParsedIndex {
        index.parse(index.to_bytes()).unwrap()
    }

    #[rstest]
    fn entries_stay_sorted_by_path_bytes(mut index: Index) {
        for name in ["b.txt", "a/b.txt", "a.txt", "a-b", "A"] {
            index.add_entry(entry(name));
        }

        assert_eq!(names(&index), vec!["A", "a-b", "a.txt", "a/b.txt", "b.txt"]);
    }

    #[rstest]
    fn adding_a_file_replaces_a_directory(mut index: Index) {
        index.add_entry(entry("alice.txt"));
        index.add_entry(entry("nested/bob.txt"));
        index.add_entry(entry("nested/inner/claire.txt"));

        index.add_entry(entry("nested"));

        assert_eq!(names(&index), vec!["alice.txt", "nested"]);
        assert!(!index.is_directly_tracked("nested/inner"));
    }

    #[rstest]
    fn adding_below_a_file_replaces_the_file(mut index: Index) {
        index.add_entry(entry("alice.txt"));
        index.add_entry(entry("bob.txt"));

        index.add_entry(entry("alice.txt/nested.txt"));

        assert_eq!(names(&index), vec!["alice.txt/nested.txt", "bob.txt"]);
        assert!(index.is_directly_tracked("alice.txt"));
    }

    #[rstest]
    fn identical_entry_is_a_no_op(mut index: Index) {
        index.add_entry(entry("a.txt"));
        index.add_extension(Extension::new(*b"TREE", Bytes::from_static(b"cached")));
        let before = index.to_bytes();

        assert!(!index.add_entry(entry("a.txt")));
        assert_eq!(index.to_bytes(), before);
    }

    #[rstest]
    fn entry_changes_drop_only_entry_derived_extensions(mut index: Index) {
        index.add_extension(Extension::new(*b"TREE", Bytes::from_static(b"cached")));
        index.add_extension(Extension::new(*b"REUC", Bytes::from_static(b"resolve-undo")));

        index.add_entry(entry("a.txt"));

        let kept = index.extensions().iter().map(Extension::name).collect::<Vec<_>>();
        assert_eq!(kept, vec!["REUC"]);
    }

    #[rstest]
    fn write_format_round_trips_with_extensions(mut index: Index) {
        index.add_entry(entry("a.txt"));
        index.add_entry(entry("dir/b.txt"));
        index.add_extension(Extension::new(*b"link", Bytes::from_static(b"split index")));

        let parsed = reparse(&index);

        assert_eq!(parsed.version, VERSION);
        assert!(parsed.checksum_valid);
        assert_eq!(parsed.entries, index.entries().cloned().collect::<Vec<_>>());
        assert_eq!(parsed.extensions, index.extensions().to_vec());
    }

    #[rstest]
    fn extended_flags_switch_to_version_three(mut index: Index) {
        let mut sparse = entry("sparse.txt");
        sparse.extended_flags = ExtendedFlags::SKIP_WORKTREE;
        index.add_entry(sparse);

        let parsed = reparse(&index);

        assert_eq!(parsed.version, EXTENDED_VERSION);
        assert_eq!(parsed.entries[0].extended_flags, ExtendedFlags::SKIP_WORKTREE);
    }

    #[rstest]
    fn conflict_stages_are_kept_in_stage_order(mut index: Index) {
        for stage in [3, 1, 2] {
            let mut conflicted = entry("conflict.txt");
            conflicted.stage = stage;
            index.add_entry(conflicted);
        }

        let stages = index.stages("conflict.txt").map(|e| e.stage).collect::<Vec<_>>();
        assert_eq!(stages, vec![1, 2, 3]);
        assert_eq!(index.entry_by_path("conflict.txt").map(|e| e.stage), Some(1));
        assert_eq!(reparse(&index).entries.len(), 3);

        index.add_entry(entry("conflict.txt"));
        let stages = index.stages("conflict.txt").map(|e| e.stage).collect::<Vec<_>>();
        assert_eq!(stages, vec![0]);
    }

    #[rstest]
    fn remove_drops_path_and_descendants(mut index: Index) {
        index.add_entry(entry("a.txt"));
        index.add_entry(entry("dir/b.txt"));
        index.add_entry(entry("dir/c/d.txt"));

        assert!(index.remove("dir"));
        assert!(!index.remove("missing"));

        assert_eq!(names(&index), vec!["a.txt"]);
    }

    #[rstest]
    fn out_of_order_entries_are_rejected(index: Index) {
        let first = entry("b.txt").serialize();
        let second = entry("a.txt").serialize();
        let mut writer = Checksum::new(Vec::new());
        writer.write(&IndexHeader::new(VERSION, 2).serialize());
        writer.write(&first);
        writer.write(&second);
        let data = Bytes::from(writer.write_checksum());

        assert!(matches!(
            index.parse(data),
            Err(Error::IndexOrderingViolation { previous, current })
                if previous.starts_with("b.txt") && current.starts_with("a.txt")
        ));
    }

    #[rstest]
    fn duplicate_entries_are_rejected(index: Index) {
        let mut writer = Checksum::new(Vec::new());
        writer.write(&IndexHeader::new(VERSION, 2).serialize());
        writer.write(&entry("a.txt").serialize());
        writer.write(&entry("a.txt").serialize());
        let data = Bytes::from(writer.write_checksum());

        assert!(matches!(index.parse(data), Err(Error::IndexOrderingViolation { .. })));
    }

    #[rstest]
    fn corrupt_checksum_fails_strict_and_is_tolerated_on_recover(mut index: Index) {
        index.add_entry(entry("a.txt"));
        let mut data = index.to_bytes().to_vec();
        let last = data.len() - 1;
        data[last] ^= 0xff;

        assert!(matches!(
            index.parse(Bytes::from(data.clone())),
            Err(Error::IndexChecksumMismatch { .. })
        ));

        let recovering = Index::with_policy(Path::new("unused-index").into(), ChecksumPolicy::Recover);
        let parsed = recovering.parse(Bytes::from(data)).unwrap();
        assert!(!parsed.checksum_valid);
        assert_eq!(parsed.entries.len(), 1);
    }

    #[rstest]
    fn version_four_is_rejected(index: Index) {
        let mut writer = Checksum::new(Vec::new());
        writer.write(&IndexHeader::new(4, 0).serialize());
        let data = Bytes::from(writer.write_checksum());

        assert!(matches!(index.parse(data), Err(Error::MalformedIndex(_))));
    }

    #[rstest]
    #[case(u32::MAX)]
    #[case(1)]
    fn entry_counts_beyond_the_data_are_malformed(index: Index, #[case] declared: u32) {
        let mut writer = Checksum::new(Vec::new());
        writer.write(&IndexHeader::new(VERSION, declared).serialize());
        let data = Bytes::from(writer.write_checksum());

        assert_eq!(data.len(), HEADER_SIZE + CHECKSUM_SIZE);
        assert!(matches!(index.parse(data), Err(Error::MalformedIndex(_))));
    }

    #[rstest]
    fn dirty_padding_is_rejected(index: Index) {
        let mut entry_bytes = entry("a.txt").serialize().to_vec();
        let last = entry_bytes.len() - 1;
        entry_bytes[last] = b'x';
        let mut writer = Checksum::new(Vec::new());
        writer.write(&IndexHeader::new(VERSION, 1).serialize());
        writer.write(&entry_bytes);
        let data = Bytes::from(writer.write_checksum());

        assert!(matches!(index.parse(data), Err(Error::MalformedIndex(_))));
    }

    proptest! {
        #[test]
        fn any_insertion_order_yields_sorted_unique_entries(
            names in proptest::collection::vec("[a-c]{1,2}(/[a-c]{1,2}){0,2}", 1..24)
        ) {
            let mut index = Index::new(Path::new("unused-index").into());
            for name in &names {
                index.add_entry(entry(name));
            }

            let keys = index
                .entries()
                .map(|e| (e.name.clone(), e.stage))
                .collect::<Vec<_>>();
            prop_assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));

            // no path is both a file and a directory
            for key in &keys {
                let prefix = format!("{}/", key.0);
                prop_assert!(!keys.iter().any(|other| other.0.starts_with(&prefix)));
            }

            let parsed = index.parse(index.to_bytes()).unwrap();
            prop_assert_eq!(parsed.entries, index.entries().cloned().collect::<Vec<_>>());
        }
    }
}
