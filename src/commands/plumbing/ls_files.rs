use crate::areas::repository::Repository;
use std::io::Write;

impl Repository {
    pub fn ls_files(&mut self, stage: bool, out: &mut impl Write) -> anyhow::Result<()> {
        for entry in self.index()?.entries() {
            if stage {
                writeln!(
                    out,
                    "{} {} {}\t{}",
                    entry.metadata.mode, entry.oid, entry.stage, entry.name
                )?;
            } else {
                writeln!(out, "{}", entry.name)?;
            }
        }

        Ok(())
    }
}
