//! Host-specific link rewriting applied to every parsed commit.
//!
//! A [`Processor`] is bootstrapped once with the changelog info (it may
//! normalize the repository URL there) and then rewrites each commit,
//! turning `@user` mentions and issue numbers into markdown links.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::Commit;

/// Repository metadata shared with processors and renderers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangelogInfo {
    pub title: String,
    pub repository_url: String,
    /// Stamped into `Commit::repo`
    pub repo_name: String,
}

/// Hook into commit parsing to adjust commit contents
pub trait Processor: Send + Sync {
    /// Called once before any commit is processed
    fn bootstrap(&mut self, info: &mut ChangelogInfo);

    /// Rewrite a commit, or return `None` to drop it from the changelog
    fn process_commit(&self, commit: Commit) -> Option<Commit>;
}

/// Selects the processor strategy for a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorKind {
    #[serde(rename = "github")]
    GitHub,
    #[serde(rename = "gitlab")]
    GitLab,
    Bitbucket,
}

impl ProcessorKind {
    /// Guess the hosting provider from a repository URL, defaulting to GitHub
    pub fn detect(url: &str) -> Self {
        let url = url.to_lowercase();
        if url.contains("gitlab") {
            ProcessorKind::GitLab
        } else if url.contains("bitbucket") {
            ProcessorKind::Bitbucket
        } else {
            ProcessorKind::GitHub
        }
    }

    pub fn build(self) -> Box<dyn Processor> {
        match self {
            ProcessorKind::GitHub => Box::new(GitHubProcessor::default()),
            ProcessorKind::GitLab => Box::new(GitLabProcessor::default()),
            ProcessorKind::Bitbucket => Box::new(BitbucketProcessor::default()),
        }
    }
}

static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\w+)").expect("Invalid mention regex"));

/// `#123` or `gh-123`
static GITHUB_ISSUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(#|gh-)(\d+)").expect("Invalid issue regex"));

static ISSUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)#(\d+)").expect("Invalid issue regex"));

/// Strip trailing `/` and a `.git` suffix from a repository URL
pub fn normalize_repo_url(url: &str) -> String {
    let url = url.trim_end_matches('/');
    url.strip_suffix(".git")
        .unwrap_or(url)
        .trim_end_matches('/')
        .to_string()
}

fn normalize_host(host: &str, default: &str) -> String {
    if host.is_empty() {
        default.to_string()
    } else {
        host.trim_end_matches('/').to_string()
    }
}

/// Applies `add_links` to every text field a renderer shows
fn rewrite_text(commit: &mut Commit, add_links: impl Fn(&str) -> String) {
    commit.header = add_links(&commit.header);
    commit.subject = add_links(&commit.subject);
    commit.body = add_links(&commit.body);

    for note in &mut commit.notes {
        note.body = add_links(&note.body);
    }

    if let crate::domain::CommitKind::Revert(revert) = &mut commit.kind {
        revert.header = add_links(&revert.header);
    }
}

/// Processor for changelogs published on GitHub
///
/// - `@user` -> `[@user](https://github.com/user)`
/// - `#123` / `gh-123` -> `[#123](<repo>/issues/123)`
/// - short hash -> `[abc1234](<repo>/commit/<long>)`
pub struct GitHubProcessor {
    /// Link host including the protocol, e.g. `https://github.com`
    pub host: String,
    repo_url: String,
}

impl Default for GitHubProcessor {
    fn default() -> Self {
        GitHubProcessor::with_host("")
    }
}

impl GitHubProcessor {
    pub fn with_host(host: impl Into<String>) -> Self {
        GitHubProcessor {
            host: host.into(),
            repo_url: String::new(),
        }
    }

    fn add_links(&self, input: &str) -> String {
        let mention = format!("[@${{1}}]({}/${{1}})", self.host);
        let issue = format!("[${{1}}${{2}}]({}/issues/${{2}})", self.repo_url);

        let input = MENTION_RE.replace_all(input, mention.as_str());
        GITHUB_ISSUE_RE
            .replace_all(&input, issue.as_str())
            .into_owned()
    }
}

impl Processor for GitHubProcessor {
    fn bootstrap(&mut self, info: &mut ChangelogInfo) {
        self.host = normalize_host(&self.host, "https://github.com");
        self.repo_url = normalize_repo_url(&info.repository_url);
        info.repository_url = self.repo_url.clone();
    }

    fn process_commit(&self, mut commit: Commit) -> Option<Commit> {
        rewrite_text(&mut commit, |s| self.add_links(s));

        if !commit.hash.long.is_empty() {
            commit.hash.short = format!(
                "[{}]({}/commit/{})",
                commit.hash.short, self.repo_url, commit.hash.long
            );
        }

        Some(commit)
    }
}

/// Processor for changelogs published on GitLab
pub struct GitLabProcessor {
    pub host: String,
    repo_url: String,
}

impl Default for GitLabProcessor {
    fn default() -> Self {
        GitLabProcessor {
            host: String::new(),
            repo_url: String::new(),
        }
    }
}

impl GitLabProcessor {
    fn add_links(&self, input: &str) -> String {
        let mention = format!("[@${{1}}]({}/${{1}})", self.host);
        let issue = format!("[#${{1}}]({}/issues/${{1}})", self.repo_url);

        let input = MENTION_RE.replace_all(input, mention.as_str());
        ISSUE_RE
            .replace_all(&input, issue.as_str())
            .into_owned()
    }
}

impl Processor for GitLabProcessor {
    fn bootstrap(&mut self, info: &mut ChangelogInfo) {
        self.host = normalize_host(&self.host, "https://gitlab.com");
        self.repo_url = info.repository_url.trim_end_matches('/').to_string();
    }

    fn process_commit(&self, mut commit: Commit) -> Option<Commit> {
        rewrite_text(&mut commit, |s| self.add_links(s));
        Some(commit)
    }
}

/// Processor for changelogs published on Bitbucket (links end with `/`)
pub struct BitbucketProcessor {
    pub host: String,
    repo_url: String,
}

impl Default for BitbucketProcessor {
    fn default() -> Self {
        BitbucketProcessor {
            host: String::new(),
            repo_url: String::new(),
        }
    }
}

impl BitbucketProcessor {
    fn add_links(&self, input: &str) -> String {
        let mention = format!("[@${{1}}]({}/${{1}}/)", self.host);
        let issue = format!("[#${{1}}]({}/issues/${{1}}/)", self.repo_url);

        let input = MENTION_RE.replace_all(input, mention.as_str());
        ISSUE_RE
            .replace_all(&input, issue.as_str())
            .into_owned()
    }
}

impl Processor for BitbucketProcessor {
    fn bootstrap(&mut self, info: &mut ChangelogInfo) {
        self.host = normalize_host(&self.host, "https://bitbucket.org");
        self.repo_url = info.repository_url.trim_end_matches('/').to_string();
    }

    fn process_commit(&self, mut commit: Commit) -> Option<Commit> {
        rewrite_text(&mut commit, |s| self.add_links(s));
        Some(commit)
    }
}
