use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ChangelogError, Result};

static RELEASE_BRANCH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"release[/-](\d+\.\d+)$").expect("Invalid release branch regex"));

/// A release branch such as `release/3.4` or `release-3.4`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseBranch {
    pub name: String,
    /// `<major>.<minor>` part of the branch name
    pub version: String,
}

impl ReleaseBranch {
    /// Parse a release branch name, failing for anything else
    pub fn parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let version = RELEASE_BRANCH_RE
            .captures(&name)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                ChangelogError::branch(format!("branch \"{}\" is not release branch", name))
            })?;

        Ok(ReleaseBranch { name, version })
    }

    /// Tag prefix owned by this branch (e.g. `v3.4`)
    pub fn tag_prefix(&self) -> String {
        format!("v{}", self.version)
    }
}
