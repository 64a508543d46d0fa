use crate::areas::repository::Repository;
use std::io::Write;

impl Repository {
    pub fn write_tree_command(&mut self, out: &mut impl Write) -> anyhow::Result<()> {
        let tree_id = self.write_tree()?;
        writeln!(out, "{tree_id}")?;

        Ok(())
    }
}
