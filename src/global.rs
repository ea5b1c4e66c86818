//! Release-wide changelogs aggregated over every configured repository.
//!
//! Each repository is read on its own, restricted to the tags of the release
//! branch. The per-repository versions are then merged by semantic version,
//! so `v3.4.2` of `onecloud` and `v3.4.2` of `ocadm` end up in one entry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{Config, ReleaseConfig, RepositoryConfig};
use crate::domain::{
    GlobalRenderData, GlobalResult, GlobalVersionRenderData, ReleaseBranch, ReleaseRenderData,
    ReleaseResult, RepoResult, RepoVersionRenderData, Version,
};
use crate::error::{ChangelogError, Result, ResultExt};
use crate::generator::Generator;
use crate::git::{GitClient, GitCommand};
use crate::processor::ChangelogInfo;

/// Builds the git client used for one repository
pub type ClientFactory = Box<dyn Fn(&RepositoryConfig) -> Result<Arc<dyn GitClient>>>;

pub struct GlobalGenerator {
    config: Config,
    client_factory: ClientFactory,
}

impl GlobalGenerator {
    /// Generator running `config.bin` inside each repository's working directory.
    ///
    /// `config` is expected to be normalized.
    pub fn new(config: Config) -> Self {
        let bin = config.bin.clone();
        let factory = move |repo: &RepositoryConfig| -> Result<Arc<dyn GitClient>> {
            let dir = repo.working_dir.as_ref().ok_or_else(|| {
                ChangelogError::config(format!("repo \"{}\" has no working dir", repo.name))
            })?;
            Ok(Arc::new(GitCommand::new(bin.clone(), dir)))
        };

        GlobalGenerator::with_client_factory(config, factory)
    }

    /// Generator with a custom client per repository
    pub fn with_client_factory<F>(config: Config, factory: F) -> Self
    where
        F: Fn(&RepositoryConfig) -> Result<Arc<dyn GitClient>> + 'static,
    {
        GlobalGenerator {
            config,
            client_factory: Box::new(factory),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Results of every configured release, in configuration order
    pub fn get_results(&self) -> Result<GlobalResult> {
        let mut releases = Vec::with_capacity(self.config.releases.len());

        for release in &self.config.releases {
            let result = self
                .get_release_results(release)
                .with_context(|| format!("get results for branch \"{}\"", release.branch))?;
            releases.push(result);
        }

        Ok(GlobalResult { releases })
    }

    /// Read every repository of one release branch
    pub fn get_release_results(&self, release: &ReleaseConfig) -> Result<ReleaseResult> {
        let weight = branch_weight(&release.branch)?;
        let mut repos = Vec::with_capacity(release.repos.len());

        for repo in &release.repos {
            tracing::info!("{}: reading branch {}", repo.name, release.branch);
            let (unreleased, versions) = self
                .get_repo_results(repo, &release.branch)
                .with_context(|| format!("repo \"{}\"", repo.name))?;

            repos.push(RepoResult {
                repo: repo.clone(),
                versions,
                unreleased,
            });
        }

        Ok(ReleaseResult {
            branch: release.branch.clone(),
            weight,
            repos,
        })
    }

    fn get_repo_results(
        &self,
        repo: &RepositoryConfig,
        branch: &str,
    ) -> Result<(crate::domain::Unreleased, Vec<Version>)> {
        let client = (self.client_factory)(repo)?;
        let info = ChangelogInfo {
            title: repo.name.clone(),
            repository_url: repo.url.clone(),
            repo_name: repo.name.clone(),
        };

        let generator = Generator::new(
            client,
            &self.config.options,
            info,
            Some(repo.processor_kind().build()),
        )?;
        generator.get_semver_branch_results(branch)
    }
}

/// Weight of a dotted version string, e.g. `3.4.1` -> `341`
///
/// # Errors
/// * `Weight` - If anything but digits remains once the dots are removed
pub fn semver_str_weight(version: &str) -> Result<i64> {
    let digits = version.replace('.', "");
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ChangelogError::weight(format!(
            "version \"{}\" is not numeric",
            version
        )));
    }

    digits
        .parse::<i64>()
        .map_err(|e| ChangelogError::weight(format!("version \"{}\": {}", version, e)))
}

/// Weight of a release branch, e.g. `release/3.4` -> `34`
pub fn branch_weight(branch: &str) -> Result<i64> {
    let branch = ReleaseBranch::parse(branch)?;
    semver_str_weight(&branch.version)
}

/// Merge the per-repository versions of every release into render data.
///
/// Repositories named in `pinned_repos` are listed first, in that order,
/// the others by name.
pub fn render_data<'a>(
    result: &'a GlobalResult,
    pinned_repos: &[String],
) -> Result<GlobalRenderData<'a>> {
    let releases = result
        .releases
        .iter()
        .map(|release| {
            release_render_data(release, pinned_repos)
                .with_context(|| format!("render branch \"{}\"", release.branch))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(GlobalRenderData { releases })
}

pub fn release_render_data<'a>(
    release: &'a ReleaseResult,
    pinned_repos: &[String],
) -> Result<ReleaseRenderData<'a>> {
    let mut versions: Vec<GlobalVersionRenderData<'a>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for repo_result in &release.repos {
        for version in &repo_result.versions {
            let key = version_key(version);
            let contribution = RepoVersionRenderData {
                repo: &repo_result.repo,
                version,
            };

            match index.get(&key) {
                Some(&i) => versions[i].repos.push(contribution),
                None => {
                    index.insert(key.clone(), versions.len());
                    versions.push(GlobalVersionRenderData {
                        weight: semver_str_weight(&key)?,
                        tag_name: key,
                        date: version.tag.date,
                        repos: vec![contribution],
                    });
                }
            }
        }
    }

    versions.sort_by(|a, b| {
        b.weight
            .cmp(&a.weight)
            .then_with(|| parse_semver(&b.tag_name).cmp(&parse_semver(&a.tag_name)))
    });
    for version in &mut versions {
        sort_repos(&mut version.repos, pinned_repos);
    }

    Ok(ReleaseRenderData {
        branch: &release.branch,
        weight: release.weight,
        versions,
    })
}

/// Semantic version string of a version's tag; the virtual next tag has
/// none, so its name without the `v` stands in.
fn version_key(version: &Version) -> String {
    match &version.tag.semantic_version {
        Some(semver) => semver.to_string(),
        None => version.tag.version_part().to_string(),
    }
}

fn parse_semver(name: &str) -> Option<semver::Version> {
    semver::Version::parse(name).ok()
}

fn sort_repos(repos: &mut [RepoVersionRenderData<'_>], pinned_repos: &[String]) {
    let rank = |name: &str| {
        pinned_repos
            .iter()
            .position(|pinned| pinned == name)
            .unwrap_or(pinned_repos.len())
    };

    repos.sort_by(|a, b| {
        rank(&a.repo.name)
            .cmp(&rank(&b.repo.name))
            .then_with(|| a.repo.name.cmp(&b.repo.name))
    });
}
