//! Git references (HEAD, branches, tags)
//!
//! References are human-readable names pointing to objects. A reference file holds either:
//! - A 40-character SHA-1 hash (direct reference)
//! - `ref: <name>` (symbolic reference, e.g. HEAD -> refs/heads/master)
//!
//! Loose files under the git directory take precedence over the `packed-refs` file.
//! Symbolic chains are followed for at most [`MAX_SYMREF_DEPTH`] hops.

use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::refs::packed_refs::PackedRefs;
use crate::artifacts::refs::ref_name::RefName;
use crate::artifacts::refs::{PACKED_REFS_FILE, REF_SEARCH_PREFIXES, SYMREF_REGEX};
use crate::config::MAX_SYMREF_DEPTH;
use crate::errors::{Error, Result};
use derive_new::new;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Reference store rooted at the git directory
#[derive(Debug, new)]
pub struct Refs {
    path: Box<Path>,
}

/// Outcome of following a reference to its end
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ref {
    /// Name the lookup started from, after short-name expansion (e.g. `HEAD`)
    pub original_name: RefName,
    /// Last name in the symbolic chain (e.g. `refs/heads/master`)
    pub name: RefName,
    /// `None` when the chain ends at a branch that has no commits yet
    pub oid: Option<ObjectId>,
}

impl Ref {
    pub fn is_symbolic(&self) -> bool {
        self.original_name != self.name
    }

    pub fn is_unborn(&self) -> bool {
        self.oid.is_none()
    }
}

/// Content of a single reference
#[derive(Debug, Clone, PartialEq, Eq)]
enum SymRefOrOid {
    SymRef(RefName),
    Oid(ObjectId),
}

impl SymRefOrOid {
    fn parse(content: &str) -> Result<Self> {
        let content = content.trim();
        let symref = regex::Regex::new(SYMREF_REGEX)
            .map_err(|_| Error::InvalidRefName(content.to_string()))?;

        match symref.captures(content) {
            Some(captures) => Ok(SymRefOrOid::SymRef(RefName::try_parse(captures[1].trim())?)),
            None => Ok(SymRefOrOid::Oid(ObjectId::try_parse(content)?)),
        }
    }
}

impl Refs {
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ref_path(&self, name: &RefName) -> PathBuf {
        self.path.join(name.as_str())
    }

    /// Object id `name` ultimately points to
    pub fn resolve(&self, name: &str) -> Result<ObjectId> {
        let reference = self.read_ref(name)?;

        reference
            .oid
            .ok_or_else(|| Error::RefNotFound(reference.name.to_string()))
    }

    /// Full name at the end of `name`'s symbolic chain, e.g. `refs/heads/master` for `HEAD`
    pub fn symbolic_target(&self, name: &str) -> Result<String> {
        Ok(self.read_ref(name)?.name.to_string())
    }

    pub fn head(&self) -> Result<Ref> {
        self.follow(RefName::head())
    }

    /// Follow `name` (a full name, or a short one expanded through the usual prefixes)
    /// to the end of its chain
    pub fn read_ref(&self, name: &str) -> Result<Ref> {
        let name = self.expand(name)?;
        self.follow(name)
    }

    fn expand(&self, name: &str) -> Result<RefName> {
        let packed = self.packed_refs()?;

        for prefix in REF_SEARCH_PREFIXES {
            let candidate = RefName::try_parse(&format!("{prefix}{name}"))?;
            if self.ref_path(&candidate).is_file() || packed.contains(candidate.as_str()) {
                return Ok(candidate);
            }
        }

        Err(Error::RefNotFound(name.to_string()))
    }

    fn follow(&self, start: RefName) -> Result<Ref> {
        let packed = self.packed_refs()?;
        let mut current = start.clone();

        for hop in 0..=MAX_SYMREF_DEPTH {
            match self.read_symref_or_oid(&current, &packed)? {
                Some(SymRefOrOid::Oid(oid)) => {
                    return Ok(Ref {
                        original_name: start,
                        name: current,
                        oid: Some(oid),
                    });
                }
                Some(SymRefOrOid::SymRef(target)) => {
                    tracing::debug!(from = %current, to = %target, hop, "following symbolic ref");
                    current = target;
                }
                // a symbolic ref may point at a branch that does not exist yet
                None if hop > 0 => {
                    return Ok(Ref {
                        original_name: start,
                        name: current,
                        oid: None,
                    });
                }
                None => return Err(Error::RefNotFound(current.to_string())),
            }
        }

        Err(Error::RefChainTooDeep {
            name: start.to_string(),
            max: MAX_SYMREF_DEPTH,
        })
    }

    fn read_symref_or_oid(
        &self,
        name: &RefName,
        packed: &PackedRefs,
    ) -> Result<Option<SymRefOrOid>> {
        let path = self.ref_path(name);

        match std::fs::read_to_string(&path) {
            Ok(content) => SymRefOrOid::parse(&content).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(packed.get(name.as_str()).map(SymRefOrOid::Oid))
            }
            // a directory such as refs/heads/feature for a ref named refs/heads/feature
            Err(_) if path.is_dir() => Ok(packed.get(name.as_str()).map(SymRefOrOid::Oid)),
            Err(source) => Err(Error::io(path, source)),
        }
    }

    fn packed_refs(&self) -> Result<PackedRefs> {
        let path = self.path.join(PACKED_REFS_FILE);

        match std::fs::read_to_string(&path) {
            Ok(content) => PackedRefs::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PackedRefs::default()),
            Err(source) => Err(Error::io(path, source)),
        }
    }

    /// Point `name` at `oid`, writing through any symbolic chain to its final ref
    pub fn update_ref(&self, name: &str, oid: ObjectId) -> Result<()> {
        let name = RefName::try_parse(name)?;
        let target = match self.follow(name.clone()) {
            Ok(reference) => reference.name,
            Err(Error::RefNotFound(_)) => name,
            Err(e) => return Err(e),
        };

        self.write_ref_file(&target, &format!("{oid}\n"))
    }

    /// Make `name` a symbolic reference to `target`
    pub fn set_symbolic_ref(&self, name: &str, target: &str) -> Result<()> {
        let name = RefName::try_parse(name)?;
        let target = RefName::try_parse(target)?;

        self.write_ref_file(&name, &format!("ref: {target}\n"))
    }

    fn write_ref_file(&self, name: &RefName, content: &str) -> Result<()> {
        let path = self.ref_path(name);
        let parent = path
            .parent()
            .ok_or_else(|| Error::InvalidRefName(name.to_string()))?;
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

        let mut temp_file = tempfile::Builder::new()
            .prefix("tmp_ref_")
            .tempfile_in(parent)
            .map_err(|e| Error::io(parent, e))?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| Error::io(temp_file.path(), e))?;
        temp_file
            .persist(&path)
            .map_err(|e| Error::io(&path, e.error))?;

        tracing::debug!(name = %name, "updated ref");

        Ok(())
    }
}
