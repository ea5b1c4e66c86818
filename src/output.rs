use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::Serialize;

use crate::domain::{GlobalRenderData, ReleaseRenderData};
use crate::error::{ChangelogError, Result, ResultExt};

/// Structured format the render data is written in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    /// Serialize `data`; JSON is pretty-printed
    pub fn render<T: Serialize + ?Sized>(self, data: &T) -> Result<String> {
        match self {
            OutputFormat::Json => serde_json::to_string_pretty(data)
                .map_err(|e| ChangelogError::Serialize(format!("json: {}", e))),
            OutputFormat::Yaml => serde_yaml::to_string(data)
                .map_err(|e| ChangelogError::Serialize(format!("yaml: {}", e))),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        }
    }
}

/// Writes render data as a tree of files, one directory per release branch.
///
/// ```text
/// <dir>/release-3.4/_index.md      front matter of the branch
/// <dir>/release-3.4/3-4-2.json     one aggregated version
/// ```
pub struct ReleaseWriter {
    dir: PathBuf,
    format: OutputFormat,
}

impl ReleaseWriter {
    pub fn new(dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        ReleaseWriter {
            dir: dir.into(),
            format,
        }
    }

    /// Write every release, returning the paths written in order
    pub fn write_all(&self, data: &GlobalRenderData<'_>) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for release in &data.releases {
            let paths = self
                .write_release(release)
                .with_context(|| format!("write branch \"{}\"", release.branch))?;
            written.extend(paths);
        }
        Ok(written)
    }

    pub fn write_release(&self, release: &ReleaseRenderData<'_>) -> Result<Vec<PathBuf>> {
        let release_dir = self.dir.join(release_dir_name(release.branch));
        fs::create_dir_all(&release_dir)
            .with_context(|| format!("create directory {}", release_dir.display()))?;

        let index = release_dir.join("_index.md");
        write_file(&index, &index_front_matter(release))?;
        let mut written = vec![index];

        for version in &release.versions {
            let path = release_dir.join(format!(
                "{}.{}",
                version_file_stem(&version.tag_name),
                self.format.extension()
            ));
            write_file(&path, &self.format.render(version)?)?;
            written.push(path);
        }

        tracing::debug!(
            "{}: wrote {} file(s) to {}",
            release.branch,
            written.len(),
            release_dir.display()
        );
        Ok(written)
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("write {}", path.display()))
}

/// `release/3.4` -> `release-3.4`
pub fn release_dir_name(branch: &str) -> String {
    branch.replace('/', "-")
}

/// `3.4.2` -> `3-4-2`
pub fn version_file_stem(tag_name: &str) -> String {
    tag_name.replace('.', "-")
}

/// Front matter of a branch index page, weighted so newer branches list first
pub fn index_front_matter(release: &ReleaseRenderData<'_>) -> String {
    let latest = release
        .versions
        .first()
        .and_then(|version| version.repos.first())
        .map(|repo| &repo.version.tag);
    let (tag, date) = match latest {
        Some(tag) => (tag.name.clone(), tag.date.format("%Y-%m-%d").to_string()),
        None => ("-".to_string(), "-".to_string()),
    };

    format!(
        "---\ntitle: \"{branch}\"\ndescription: >\n  {branch} CHANGELOG summary, latest release: {tag} , date: {date}\nweight: -{weight}\n---\n",
        branch = release.branch,
        tag = tag,
        date = date,
        weight = release.weight,
    )
}
