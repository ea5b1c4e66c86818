use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ChangelogError, Result, ResultExt};
use crate::processor::ProcessorKind;

const CONFIG_FILE_NAME: &str = "changelog-gen.toml";

/// Represents the complete configuration for changelog-gen.
///
/// Contains the release branches to aggregate, the repositories published on
/// each branch, and the commit parsing options shared by every repository.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// git executable
    #[serde(default = "default_bin")]
    pub bin: String,

    /// Directory local clones are kept in
    #[serde(default)]
    pub cache_dir: String,

    #[serde(default)]
    pub options: ChangelogOptions,

    #[serde(default)]
    pub releases: Vec<ReleaseConfig>,

    #[serde(default)]
    pub output: OutputConfig,
}

fn default_bin() -> String {
    "git".to_string()
}

/// One release branch and the repositories published on it
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReleaseConfig {
    pub branch: String,
    #[serde(default)]
    pub repos: Vec<RepositoryConfig>,
}

/// A repository either written as a bare URL or as a table
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RepositoryEntry {
    Url(String),
    Full {
        url: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        working_dir: Option<PathBuf>,
        #[serde(default)]
        processor: Option<ProcessorKind>,
    },
}

impl From<RepositoryEntry> for RepositoryConfig {
    fn from(entry: RepositoryEntry) -> Self {
        match entry {
            RepositoryEntry::Url(url) => RepositoryConfig::new(url),
            RepositoryEntry::Full {
                url,
                name,
                working_dir,
                processor,
            } => RepositoryConfig {
                url,
                name,
                working_dir,
                processor,
            },
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(from = "RepositoryEntry")]
pub struct RepositoryConfig {
    /// Remote URL, e.g. `https://github.com/yunionio/onecloud`
    pub url: String,
    /// Defaults to the last URL segment
    pub name: String,
    /// Defaults to `<cache_dir>/<name>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    /// Link rewriting strategy, detected from the URL when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processor: Option<ProcessorKind>,
}

impl RepositoryConfig {
    pub fn new(url: impl Into<String>) -> Self {
        RepositoryConfig {
            url: url.into(),
            name: String::new(),
            working_dir: None,
            processor: None,
        }
    }

    /// Fill the name and working directory from the URL and cache dir
    pub fn normalize(&mut self, cache_dir: &str) -> Result<()> {
        self.url = self.url.trim_end_matches('/').to_string();

        if self.name.is_empty() {
            let last = self
                .url
                .rsplit('/')
                .next()
                .map(|s| s.trim_end_matches(".git"))
                .unwrap_or_default();
            if last.is_empty() {
                return Err(ChangelogError::config(format!(
                    "Invalid repo url \"{}\"",
                    self.url
                )));
            }
            self.name = last.to_string();
        }

        if self.working_dir.is_none() {
            if cache_dir.is_empty() {
                return Err(ChangelogError::config(format!(
                    "cache_dir must be specified for repo \"{}\"",
                    self.name
                )));
            }
            self.working_dir = Some(Path::new(cache_dir).join(&self.name));
        }

        Ok(())
    }

    pub fn processor_kind(&self) -> ProcessorKind {
        self.processor
            .unwrap_or_else(|| ProcessorKind::detect(&self.url))
    }
}

/// Output handling options
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct OutputConfig {
    /// Write one directory of files per release branch here; unset keeps
    /// the render data on stdout only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Options controlling how tags are read and commits are parsed and grouped.
///
/// Field selectors (`commit_sort_by`, `commit_group_by`, `commit_group_sort_by`,
/// the pattern maps and the filter keys) name `Commit` / `CommitGroup` fields
/// such as `Type`, `Scope`, `Title` or `Author.Name`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct ChangelogOptions {
    /// Treat unreleased commits as this tag
    pub next_tag: String,
    /// Only keep `v<major>.<minor>.<patch>` tags, ordered by version
    pub use_semver: bool,
    /// Keep tags matching this regex (when not in semver mode)
    pub tag_filter_pattern: String,
    pub no_case_sensitive: bool,
    /// Field -> allowed values; an empty list does not filter
    pub commit_filters: BTreeMap<String, Vec<String>>,
    pub commit_sort_by: String,
    pub commit_group_by: String,
    pub commit_group_sort_by: String,
    pub commit_group_title_maps: BTreeMap<String, String>,
    pub header_pattern: String,
    pub header_pattern_maps: Vec<String>,
    /// e.g. `#`, `gh-`
    pub issue_prefix: Vec<String>,
    /// e.g. `closes`, `fixes`
    pub ref_actions: Vec<String>,
    /// Pass `--no-merges` to git log
    pub no_merges: bool,
    pub merge_pattern: String,
    pub merge_pattern_maps: Vec<String>,
    pub revert_pattern: String,
    pub revert_pattern_maps: Vec<String>,
    /// e.g. `BREAKING CHANGE`
    pub note_keywords: Vec<String>,
    /// Repositories listed first in every aggregated version
    pub pinned_repos: Vec<String>,
}

impl ChangelogOptions {
    /// Fill empty header/merge/revert patterns with working defaults
    pub fn normalize_patterns(&mut self) {
        if self.header_pattern.is_empty() {
            self.header_pattern = "^(.*)$".to_string();
            self.header_pattern_maps = vec!["Subject".to_string()];
        }

        if self.merge_pattern.is_empty() {
            self.merge_pattern = r"^Merge branch '(\w+)'$".to_string();
            self.merge_pattern_maps = vec!["Source".to_string()];
        }

        if self.revert_pattern.is_empty() {
            self.revert_pattern = r#"^Revert "([\s\S]*)"$"#.to_string();
            self.revert_pattern_maps = vec!["Header".to_string()];
        }
    }

    /// Conventional-commit defaults used for aggregated release changelogs
    pub fn apply_release_defaults(&mut self) {
        self.use_semver = true;
        self.no_merges = true;

        for (key, title) in default_title_maps() {
            self.commit_group_title_maps.insert(key, title);
        }

        if self.header_pattern_maps.is_empty() {
            self.header_pattern_maps = vec![
                "Type".to_string(),
                "Scope".to_string(),
                "Subject".to_string(),
            ];
        }
        if self.header_pattern.is_empty() {
            self.header_pattern = r"^(\w*)(?:\(([\w\$\.\-\*\s]*)\))?\:\s(.*)$".to_string();
        }
        if self.commit_group_by.is_empty() {
            self.commit_group_by = "Type".to_string();
        }
        if self.commit_group_sort_by.is_empty() {
            self.commit_group_sort_by = "Title".to_string();
        }
        if self.commit_sort_by.is_empty() {
            self.commit_sort_by = "Scope".to_string();
        }
        if self.note_keywords.is_empty() {
            self.note_keywords = vec!["BREAKING CHANGE".to_string()];
        }
        if self.pinned_repos.is_empty() {
            self.pinned_repos = vec!["onecloud".to_string()];
        }
    }
}

fn default_title_maps() -> Vec<(String, String)> {
    [
        ("feat", "Features"),
        ("fix", "Bug Fixes"),
        ("perf", "Performance Improvements"),
        ("refactor", "Code Refactoring"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bin: default_bin(),
            cache_dir: String::new(),
            options: ChangelogOptions::default(),
            releases: Vec::new(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Apply release defaults and resolve every repository's name and directory
    pub fn normalize(&mut self) -> Result<()> {
        self.options.apply_release_defaults();

        if self.releases.is_empty() {
            return Err(ChangelogError::config("no releases configured"));
        }

        let cache_dir = self.cache_dir.clone();
        for release in &mut self.releases {
            for repo in &mut release.repos {
                repo.normalize(&cache_dir)
                    .with_context(|| format!("release config \"{}\"", release.branch))?;
            }
        }

        Ok(())
    }

    /// The documented example configuration
    pub fn example() -> Self {
        let repos = [
            "https://github.com/yunionio/notify-plugins",
            "https://github.com/yunionio/onecloud-service-operator",
            "https://github.com/yunionio/ocadm",
            "https://github.com/yunionio/onecloud",
            "https://github.com/yunionio/onecloud-operator",
            "https://github.com/yunionio/sdnagent",
        ];
        let release = |branch: &str| ReleaseConfig {
            branch: branch.to_string(),
            repos: repos.iter().map(|url| RepositoryConfig::new(*url)).collect(),
        };

        let mut options = ChangelogOptions {
            commit_group_title_maps: default_title_maps().into_iter().collect(),
            ..Default::default()
        };
        options.apply_release_defaults();
        options.header_pattern = r"^(\w*)(?:\(([\w\$\.,\/\-\*\s]*)\))?\:\s(.*)$".to_string();

        Config {
            bin: default_bin(),
            cache_dir: "./_cache/".to_string(),
            options,
            releases: vec![release("release/3.4"), release("release/3.3")],
            output: OutputConfig {
                dir: Some(PathBuf::from("./_output/changelog")),
            },
        }
    }
}

/// Loads configuration from file.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `changelog-gen.toml` in current directory
/// 3. `changelog-gen.toml` in user config directory
///
/// Files ending in `.yaml` / `.yml` are read as YAML, everything else as TOML.
///
/// # Returns
/// * `Ok(Config)` - Loaded configuration, not yet normalized
/// * `Err` - If no file is found, or the file cannot be read or parsed
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let path = if let Some(path) = config_path {
        PathBuf::from(path)
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        PathBuf::from(CONFIG_FILE_NAME)
    } else if let Some(path) = dirs::config_dir()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .filter(|p| p.exists())
    {
        path
    } else {
        return Err(ChangelogError::config(format!(
            "no {} found, pass --config",
            CONFIG_FILE_NAME
        )));
    };

    tracing::debug!("Loading config from: {}", path.display());
    let content = fs::read_to_string(&path)
        .with_context(|| format!("read config file \"{}\"", path.display()))?;

    parse_config(&content, &path)
}

/// Parse configuration text, choosing the format from the file extension
pub fn parse_config(content: &str, path: &Path) -> Result<Config> {
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );

    if is_yaml {
        serde_yaml::from_str(content).map_err(|e| {
            ChangelogError::config(format!("parse yaml config {}: {}", path.display(), e))
        })
    } else {
        toml::from_str(content).map_err(|e| {
            ChangelogError::config(format!("parse toml config {}: {}", path.display(), e))
        })
    }
}
