use crate::areas::repository::Repository;
use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::artifacts::objects::object_id::ObjectId;
use std::io::Write;

impl Repository {
    /// A full hexadecimal object id, or a reference name resolved through the refs
    pub fn resolve_revision(&self, revision: &str) -> crate::Result<ObjectId> {
        if revision.len() == OBJECT_ID_LENGTH && revision.chars().all(|c| c.is_ascii_hexdigit()) {
            return ObjectId::try_parse(revision);
        }

        self.refs().resolve(revision)
    }

    pub fn rev_parse(&self, revision: &str, out: &mut impl Write) -> anyhow::Result<()> {
        writeln!(out, "{}", self.resolve_revision(revision)?)?;

        Ok(())
    }
}
