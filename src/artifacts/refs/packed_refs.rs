//! `packed-refs` file
//!
//! One `<oid> <name>` pair per line, an optional `# pack-refs with:` header, and `^<oid>`
//! lines carrying the peeled target of the annotated tag above them.

use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackedRefs {
    refs: BTreeMap<String, ObjectId>,
}

impl PackedRefs {
    pub fn parse(content: &str) -> Result<Self> {
        let mut refs = BTreeMap::new();

        for line in content.lines() {
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') || line.starts_with('^') {
                continue;
            }

            let (oid, name) = line
                .split_once(' ')
                .ok_or_else(|| Error::InvalidRefName(line.to_string()))?;
            refs.insert(name.to_string(), ObjectId::try_parse(oid)?);
        }

        Ok(PackedRefs { refs })
    }

    pub fn get(&self, name: &str) -> Option<ObjectId> {
        self.refs.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.refs.contains_key(name)
    }
}
