use crate::areas::repository::Repository;
use crate::artifacts::objects::object::hash_object;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use std::io::Write;
use std::path::Path;

impl Repository {
    pub fn hash_object(&self, file: &Path, write: bool, out: &mut impl Write) -> anyhow::Result<()> {
        let content = std::fs::read(file)
            .with_context(|| format!("unable to read {}", file.display()))?;

        let object_id = match write {
            true => self.database().put(ObjectType::Blob, &content)?,
            false => hash_object(ObjectType::Blob, &content),
        };

        writeln!(out, "{object_id}")?;

        Ok(())
    }
}
