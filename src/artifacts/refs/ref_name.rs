use crate::artifacts::refs::{HEAD_REF_NAME, INVALID_REF_NAME_REGEX, REF_ALIASES};
use crate::errors::{Error, Result};
use regex::Regex;

/// A reference name that is safe to join onto the git directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefName(String);

impl RefName {
    pub fn try_parse(name: &str) -> Result<Self> {
        let name = *REF_ALIASES.get(name).unwrap_or(&name);

        let invalid = Regex::new(INVALID_REF_NAME_REGEX)
            .map_err(|_| Error::InvalidRefName(name.to_string()))?;

        if name.is_empty() || invalid.is_match(name) {
            return Err(Error::InvalidRefName(name.to_string()));
        }

        Ok(Self(name.to_string()))
    }

    pub fn head() -> Self {
        Self(HEAD_REF_NAME.to_string())
    }

    pub fn is_head(&self) -> bool {
        self.0 == HEAD_REF_NAME
    }

    /// Short form used for reporting, e.g. `master` for `refs/heads/master`
    pub fn short_name(&self) -> &str {
        ["refs/heads/", "refs/tags/", "refs/remotes/"]
            .iter()
            .find_map(|prefix| self.0.strip_prefix(prefix))
            .unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
