use crate::areas::repository::Repository;
use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatFileMode {
    /// Print the object kind
    Type,
    /// Print the content; trees are listed one entry per line
    Pretty,
}

impl Repository {
    pub fn cat_file(&self, revision: &str, mode: CatFileMode, out: &mut impl Write) -> anyhow::Result<()> {
        let object_id = self.resolve_revision(revision)?;
        let (object_type, content) = self.database().get(&object_id)?;

        match (mode, object_type) {
            (CatFileMode::Type, _) => writeln!(out, "{object_type}")?,
            (CatFileMode::Pretty, ObjectType::Tree) => write!(out, "{}", Tree::deserialize(content)?)?,
            (CatFileMode::Pretty, _) => out.write_all(&content)?,
        }

        Ok(())
    }
}
