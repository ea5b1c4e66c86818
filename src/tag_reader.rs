use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::boundary::BoundaryWarning;
use crate::domain::{assign_previous_and_next, Tag};
use crate::error::{ChangelogError, Result, ResultExt};
use crate::git::{GitClient, SEPARATOR};

/// `%(taggerdate)` / `%(authordate)` default format, e.g. `Mon Jan 1 10:00:00 2018 +0900`
const TAG_DATE_FORMAT: &str = "%a %b %e %H:%M:%S %Y %z";

static STRICT_SEMVER_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v\d+\.\d+\.\d+$").expect("Invalid semver tag regex"));

/// Source of a repository's ordered tag list
pub trait TagReader {
    /// Read, filter and sort every tag, newest first, with neighbours linked
    fn read_all(&self) -> Result<Vec<Tag>>;
}

/// Reads tags through `git for-each-ref refs/tags`
pub struct GitTagReader {
    client: Arc<dyn GitClient>,
    filter: Option<Regex>,
    use_semver: bool,
}

impl GitTagReader {
    /// Reader keeping tags whose name matches `filter_pattern`, ordered by date.
    ///
    /// An empty pattern keeps every tag.
    pub fn new(client: Arc<dyn GitClient>, filter_pattern: &str) -> Result<Self> {
        let filter = if filter_pattern.is_empty() {
            None
        } else {
            Some(
                Regex::new(filter_pattern)
                    .with_context(|| format!("tag filter pattern \"{}\"", filter_pattern))?,
            )
        };

        Ok(GitTagReader {
            client,
            filter,
            use_semver: false,
        })
    }

    /// Reader keeping only `v<major>.<minor>.<patch>` tags, ordered by version
    pub fn semver(client: Arc<dyn GitClient>) -> Result<Self> {
        let mut reader = GitTagReader::new(client, "^v")?;
        reader.use_semver = true;
        Ok(reader)
    }
}

impl TagReader for GitTagReader {
    fn read_all(&self) -> Result<Vec<Tag>> {
        let format = ["%(refname)", "%(subject)", "%(taggerdate)", "%(authordate)"].join(SEPARATOR);
        let out = self
            .client
            .exec("for-each-ref", &["--format", &format, "refs/tags"])
            .context("failed to get git-tag")?;

        parse_tags(&out, self.filter.as_ref(), self.use_semver)
    }
}

/// Turn `for-each-ref` output into a sorted, linked tag list.
///
/// Lines without exactly four fields are ignored. The tagger date is used
/// when it parses, the author date otherwise (lightweight tags); a tag with
/// neither is an error.
pub fn parse_tags(out: &str, filter: Option<&Regex>, use_semver: bool) -> Result<Vec<Tag>> {
    let mut tags = Vec::new();

    for line in out.lines() {
        let tokens: Vec<&str> = line.split(SEPARATOR).collect();
        if tokens.len() != 4 {
            continue;
        }

        let name = tokens[0].replacen("refs/tags/", "", 1);
        let subject = tokens[1].trim();
        let date = parse_date(tokens[2])
            .or_else(|| parse_date(tokens[3]))
            .ok_or_else(|| ChangelogError::TagDate {
                tag: name.clone(),
                value: tokens[3].to_string(),
            })?;

        if let Some(filter) = filter {
            if !filter.is_match(&name) {
                continue;
            }
        }

        let mut tag = Tag::new(name, subject, date);
        if use_semver {
            match semantic_version(&tag.name) {
                Some(version) => tag = tag.with_version(version),
                None => {
                    BoundaryWarning::NonSemverTag { tag: tag.name }.emit();
                    continue;
                }
            }
        }

        tags.push(tag);
    }

    if use_semver {
        tags.sort_by(|a, b| b.semantic_version.cmp(&a.semantic_version));
    } else {
        tags.sort_by(|a, b| b.date.cmp(&a.date));
    }
    assign_previous_and_next(&mut tags);

    tracing::debug!("Read {} tags", tags.len());
    Ok(tags)
}

fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(input.trim(), TAG_DATE_FORMAT)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Version of a `v<major>.<minor>.<patch>` tag name, if it is one
fn semantic_version(name: &str) -> Option<semver::Version> {
    if !STRICT_SEMVER_TAG_RE.is_match(name) {
        return None;
    }
    semver::Version::parse(name.trim_start_matches('v')).ok()
}
