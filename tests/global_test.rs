// tests/global_test.rs
use std::sync::Arc;

use changelog_gen::config::{Config, ReleaseConfig, RepositoryConfig};
use changelog_gen::git::{GitClient, MockClient, DELIMITER, SEPARATOR};
use changelog_gen::global::{render_data, GlobalGenerator};
use changelog_gen::output::OutputFormat;
use changelog_gen::ChangelogError;

fn tag_line(name: &str, day: u32, weekday: &str) -> String {
    [
        format!("refs/tags/{}", name),
        String::new(),
        format!("{} Jan {} 00:00:00 2018 +0000", weekday, day),
        String::new(),
    ]
    .join(SEPARATOR)
}

fn record(subject: &str) -> String {
    format!(
        "{SEPARATOR}HASH:0123456789abcdef\t0123456{DELIMITER}AUTHOR:alice\talice@example.com\t1514764800{DELIMITER}COMMITTER:alice\talice@example.com\t1514764800{DELIMITER}SUBJECT:{subject}{DELIMITER}BODY:\n"
    )
}

/// Every repository carries the same tags, and its name in each commit subject
fn client_for(repo: &RepositoryConfig) -> changelog_gen::Result<Arc<dyn GitClient>> {
    let tags = match repo.name.as_str() {
        "sdnagent" => vec![tag_line("v3.4.0", 1, "Mon")],
        "broken" => return Err(ChangelogError::command("not a git repository")),
        _ => vec![tag_line("v3.4.0", 1, "Mon"), tag_line("v3.4.1", 2, "Tue")],
    }
    .join("\n");
    let name = repo.name.clone();

    Ok(Arc::new(MockClient::new(move |subcmd, _| match subcmd {
        "for-each-ref" => Ok(tags.clone()),
        _ => Ok(record(&format!("feat: change in {}", name))),
    })))
}

fn config(branch: &str, repos: &[&str]) -> Config {
    let mut config = Config {
        cache_dir: "/tmp/changelog-gen-cache".to_string(),
        releases: vec![ReleaseConfig {
            branch: branch.to_string(),
            repos: repos
                .iter()
                .map(|name| RepositoryConfig::new(format!("https://github.com/yunionio/{}", name)))
                .collect(),
        }],
        ..Default::default()
    };
    config.normalize().unwrap();
    config
}

#[test]
fn test_release_aggregated_across_repositories() {
    let config = config("release/3.4", &["sdnagent", "ocadm", "onecloud"]);
    let pinned = config.options.pinned_repos.clone();
    let generator = GlobalGenerator::with_client_factory(config, client_for);

    let result = generator.get_results().unwrap();
    assert_eq!(result.releases.len(), 1);
    assert_eq!(result.releases[0].weight, 34);
    assert_eq!(result.releases[0].repos.len(), 3);

    let data = render_data(&result, &pinned).unwrap();
    let release = &data.releases[0];
    assert_eq!(release.branch, "release/3.4");

    let tags: Vec<&str> = release.versions.iter().map(|v| v.tag_name.as_str()).collect();
    assert_eq!(tags, vec!["3.4.1", "3.4.0"]);
    let weights: Vec<i64> = release.versions.iter().map(|v| v.weight).collect();
    assert_eq!(weights, vec![341, 340]);

    let repos: Vec<&str> = release.versions[1]
        .repos
        .iter()
        .map(|r| r.repo.name.as_str())
        .collect();
    assert_eq!(repos, vec!["onecloud", "ocadm", "sdnagent"]);

    let repos: Vec<&str> = release.versions[0]
        .repos
        .iter()
        .map(|r| r.repo.name.as_str())
        .collect();
    assert_eq!(repos, vec!["onecloud", "ocadm"]);

    // commits carry the repository they come from
    let onecloud = &release.versions[0].repos[0].version;
    assert_eq!(onecloud.commits[0].repo, "onecloud");
    assert_eq!(onecloud.commit_groups[0].title, "Features");
}

#[test]
fn test_failing_repository_names_branch_and_repo() {
    let config = config("release/3.4", &["ocadm", "broken"]);
    let generator = GlobalGenerator::with_client_factory(config, client_for);

    let err = generator.get_results().unwrap_err();
    let msg = err.to_string();
    assert!(msg.starts_with("get results for branch \"release/3.4\""), "{}", msg);
    assert!(msg.contains("repo \"broken\""), "{}", msg);
    assert!(matches!(err.root(), ChangelogError::Command(_)));
}

#[test]
fn test_non_release_branch_is_rejected() {
    let config = config("master", &["ocadm"]);
    let generator = GlobalGenerator::with_client_factory(config, client_for);

    let err = generator.get_results().unwrap_err();
    assert!(matches!(err.root(), ChangelogError::Branch(_)));
}

#[test]
fn test_render_data_as_yaml() {
    let config = config("release/3.4", &["ocadm"]);
    let generator = GlobalGenerator::with_client_factory(config, client_for);
    let result = generator.get_results().unwrap();

    let data = render_data(&result, &[]).unwrap();
    let yaml = OutputFormat::Yaml.render(&data).unwrap();
    assert!(yaml.contains("branch: release/3.4"));
    assert!(yaml.contains("tagName:"));
    assert!(yaml.contains("3.4.1"));
    assert!(yaml.contains("weight: 341"));
}
