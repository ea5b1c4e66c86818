use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::commit_extractor::CommitExtractor;
use crate::commit_parser::CommitParser;
use crate::config::ChangelogOptions;
use crate::domain::{ReleaseBranch, Tag, Unreleased, Version};
use crate::error::{ChangelogError, Result, ResultExt};
use crate::git::GitClient;
use crate::processor::{ChangelogInfo, Processor};
use crate::tag_reader::{GitTagReader, TagReader};
use crate::tag_selector;

/// Builds the versions of one repository
///
/// Queries follow the tag selector grammar:
///  - `<old>..<new>` - commits of the tags from `<old>` up to `<new>` (e.g. `1.0.0..2.0.0`)
///  - `<tagname>..`  - from `<tagname>` to the latest tag
///  - `..<tagname>`  - from the oldest tag to `<tagname>`
///  - `<tagname>`    - commits of `<tagname>` only
pub struct Generator {
    options: ChangelogOptions,
    info: ChangelogInfo,
    tag_reader: Box<dyn TagReader>,
    commit_parser: CommitParser,
    commit_extractor: CommitExtractor,
    processor: Option<Box<dyn Processor>>,
}

impl Generator {
    /// Create a generator reading through `client`.
    ///
    /// The processor, when given, is bootstrapped here and may rewrite
    /// `info.repository_url`.
    ///
    /// # Returns
    /// * `Err` - If a configured pattern does not compile
    pub fn new(
        client: Arc<dyn GitClient>,
        options: &ChangelogOptions,
        mut info: ChangelogInfo,
        mut processor: Option<Box<dyn Processor>>,
    ) -> Result<Self> {
        if let Some(processor) = processor.as_mut() {
            processor.bootstrap(&mut info);
        }

        let mut options = options.clone();
        options.normalize_patterns();

        let tag_reader: Box<dyn TagReader> = if options.use_semver {
            Box::new(GitTagReader::semver(client.clone())?)
        } else {
            Box::new(GitTagReader::new(client.clone(), &options.tag_filter_pattern)?)
        };

        Ok(Generator {
            commit_parser: CommitParser::new(client, &options, info.repo_name.clone())?,
            commit_extractor: CommitExtractor::new(&options),
            tag_reader,
            options,
            info,
            processor,
        })
    }

    pub fn info(&self) -> &ChangelogInfo {
        &self.info
    }

    /// Unreleased commits and one version per selected tag, newest first
    ///
    /// # Errors
    /// * `NoTags` - The repository has no (matching) tag
    /// * `NextTagExists` - The configured next tag is already a real tag
    /// * `NotFoundTag` / `FailedQueryParse` - From the tag selector
    /// * `NoVersions` - The query selected nothing
    pub fn get_results(&self, query: &str) -> Result<(Unreleased, Vec<Version>)> {
        let (tags, first) = self.get_tags(query)?;

        let unreleased = self.read_unreleased(&tags)?;
        let versions = self.read_versions(&tags, &first)?;

        if versions.is_empty() {
            return Err(ChangelogError::NoVersions(query.to_string()));
        }

        Ok((unreleased, versions))
    }

    /// Tags published from a release branch, i.e. prefixed by `v<major>.<minor>`
    pub fn get_semver_branch_tags(&self, branch: &str) -> Result<Vec<Tag>> {
        let branch = ReleaseBranch::parse(branch)?;
        let tags = self.tag_reader.read_all()?;
        Ok(filter_tags_by_prefix(&branch.tag_prefix(), &tags))
    }

    /// Query covering every tag of a release branch (`<oldest>..<newest>`)
    pub fn get_semver_branch_query(&self, branch: &str) -> Result<String> {
        let tags = self.get_semver_branch_tags(branch)?;

        match tags.as_slice() {
            [] => Err(ChangelogError::branch(format!(
                "branch \"{}\" not found tags",
                branch
            ))),
            [only] => Ok(only.name.clone()),
            [newest, .., oldest] => Ok(format!("{}..{}", oldest.name, newest.name)),
        }
    }

    pub fn get_semver_branch_results(&self, branch: &str) -> Result<(Unreleased, Vec<Version>)> {
        let query = self.get_semver_branch_query(branch)?;
        tracing::debug!("{}: branch {} resolved to query {}", self.info.repo_name, branch, query);
        self.get_results(&query)
    }

    fn get_tags(&self, query: &str) -> Result<(Vec<Tag>, String)> {
        let mut tags = self.tag_reader.read_all().context("read all tags")?;

        let next = &self.options.next_tag;
        if !next.is_empty() {
            if tags.iter().any(|tag| &tag.name == next) {
                return Err(ChangelogError::NextTagExists(next.clone()));
            }

            // dated from its first commit in read_versions
            let mut virtual_tag = Tag::new(next.clone(), next.clone(), DateTime::<Utc>::default());
            virtual_tag.previous = tags.first().map(Tag::relate);
            tags.insert(0, virtual_tag);
        }

        if tags.is_empty() {
            return Err(ChangelogError::NoTags);
        }

        if query.is_empty() {
            return Ok((tags, String::new()));
        }

        tag_selector::select(&tags, query).with_context(|| format!("select tags by {:?}", query))
    }

    fn parse_commits(&self, rev: &str) -> Result<Vec<crate::domain::Commit>> {
        self.commit_parser.parse(rev, self.processor.as_deref())
    }

    fn read_unreleased(&self, tags: &[Tag]) -> Result<Unreleased> {
        if !self.options.next_tag.is_empty() {
            return Ok(Unreleased::default());
        }

        let rev = match tags.first() {
            Some(tag) => format!("{}..HEAD", tag.name),
            None => "HEAD".to_string(),
        };

        let commits = self.parse_commits(&rev)?;
        let extraction = self.commit_extractor.extract(&commits);
        Ok(Unreleased::new(commits, extraction))
    }

    fn read_versions(&self, tags: &[Tag], first: &str) -> Result<Vec<Version>> {
        let mut versions = Vec::with_capacity(tags.len());

        for (i, tag) in tags.iter().enumerate() {
            let is_next = self.options.next_tag == tag.name;

            let rev = if is_next {
                match &tag.previous {
                    Some(previous) => format!("{}..HEAD", previous.name),
                    None => "HEAD".to_string(),
                }
            } else if let Some(older) = tags.get(i + 1) {
                format!("{}..{}", older.name, tag.name)
            } else if !first.is_empty() {
                format!("{}..{}", first, tag.name)
            } else {
                tag.name.clone()
            };

            let commits = self.parse_commits(&rev)?;
            let extraction = self.commit_extractor.extract(&commits);

            let mut tag = tag.clone();
            if is_next {
                if let Some(commit) = commits.first() {
                    tag.date = commit.author.date;
                }
            }

            tracing::debug!(
                "{}: {} has {} commits",
                self.info.repo_name,
                tag.name,
                commits.len()
            );
            versions.push(Version::new(tag, commits, extraction));
        }

        Ok(versions)
    }
}

/// Keep the tags whose name starts with `prefix` (e.g. `v3.4`)
pub fn filter_tags_by_prefix(prefix: &str, tags: &[Tag]) -> Vec<Tag> {
    tags.iter()
        .filter(|tag| tag.name.starts_with(prefix))
        .cloned()
        .collect()
}
