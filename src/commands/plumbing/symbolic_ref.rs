use crate::areas::repository::Repository;
use std::io::Write;

impl Repository {
    pub fn symbolic_ref(&self, name: &str, short: bool, out: &mut impl Write) -> anyhow::Result<()> {
        let reference = self.refs().read_ref(name)?;

        if !reference.is_symbolic() {
            anyhow::bail!("ref {} is not a symbolic ref", reference.original_name);
        }

        match short {
            true => writeln!(out, "{}", reference.name.short_name())?,
            false => writeln!(out, "{}", reference.name)?,
        }

        Ok(())
    }
}
