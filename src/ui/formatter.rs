//! Formatting functions for CLI progress and summaries.

use std::path::Path;

use console::style;

use crate::domain::ReleaseResult;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    eprintln!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    eprintln!("{} {}", style("→").yellow(), message);
}

/// Show which configuration file a run uses.
pub fn display_config_path(path: &Path) {
    eprintln!("{} {}", style("Config:").bold(), style(path.display()).cyan());
}

/// Print one line per repository with the number of versions it published
/// on the release branch.
///
/// # Arguments
/// * `release` - The aggregated results of one release branch
pub fn display_release_summary(release: &ReleaseResult) {
    eprintln!(
        "\n{}",
        style(format!("Release {}", release.branch)).bold().underlined()
    );
    for line in summary_lines(release) {
        eprintln!("  {}", line);
    }
}

/// Summary lines shown by [`display_release_summary`], without styling
pub fn summary_lines(release: &ReleaseResult) -> Vec<String> {
    release
        .repos
        .iter()
        .map(|repo| {
            let newest = repo
                .versions
                .first()
                .map(|v| v.tag.name.as_str())
                .unwrap_or("-");
            let mut line = format!(
                "{}: {} version(s), newest {}",
                repo.repo.name,
                repo.versions.len(),
                newest
            );
            if !repo.unreleased.is_empty() {
                line.push_str(&format!(", {} unreleased", repo.unreleased.commits.len()));
            }
            line
        })
        .collect()
}
