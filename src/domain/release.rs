use chrono::{DateTime, Utc};
use serde::Serialize;

use super::version::{Unreleased, Version};
use crate::config::RepositoryConfig;

/// Versions one repository published on a release branch
#[derive(Debug, Clone, PartialEq)]
pub struct RepoResult {
    pub repo: RepositoryConfig,
    pub versions: Vec<Version>,
    pub unreleased: Unreleased,
}

/// Every repository's result for one release branch
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseResult {
    pub branch: String,
    /// `<major><minor>` of the branch as a number, e.g. `34` for `release/3.4`
    pub weight: i64,
    pub repos: Vec<RepoResult>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalResult {
    pub releases: Vec<ReleaseResult>,
}

/// One repository's contribution to an aggregated version
#[derive(Debug, Clone, Serialize)]
pub struct RepoVersionRenderData<'a> {
    pub repo: &'a RepositoryConfig,
    #[serde(flatten)]
    pub version: &'a Version,
}

/// A semantic version and every repository that published it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalVersionRenderData<'a> {
    pub tag_name: String,
    pub date: DateTime<Utc>,
    pub weight: i64,
    pub repos: Vec<RepoVersionRenderData<'a>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseRenderData<'a> {
    pub branch: &'a str,
    pub weight: i64,
    pub versions: Vec<GlobalVersionRenderData<'a>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GlobalRenderData<'a> {
    pub releases: Vec<ReleaseRenderData<'a>>,
}
