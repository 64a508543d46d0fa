use crate::areas::repository::Repository;
use std::path::PathBuf;

impl Repository {
    /// Stage `paths`, given relative to `current_dir`
    pub fn add_command(&mut self, current_dir: PathBuf, paths: &[String]) -> anyhow::Result<()> {
        let paths = paths
            .iter()
            .map(|path| current_dir.join(path))
            .collect::<Vec<_>>();

        self.add(&paths)?;

        Ok(())
    }
}
