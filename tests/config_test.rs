// tests/config_test.rs
use std::io::Write;
use std::path::PathBuf;

use changelog_gen::config::{load_config, parse_config, Config};
use changelog_gen::processor::ProcessorKind;
use serial_test::serial;
use tempfile::{Builder, NamedTempFile, TempDir};

const TOML_CONFIG: &str = r#"
cache_dir = "./_cache"

[options]
next_tag = "v3.4.9"
pinned_repos = ["ocadm"]

[options.commit_filters]
Type = ["feat", "fix"]

[[releases]]
branch = "release/3.4"
repos = [
    "https://github.com/yunionio/onecloud",
    { url = "https://bitbucket.org/acme/tool.git", working_dir = "/src/tool" },
]
"#;

#[test]
fn test_load_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(TOML_CONFIG.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let mut config = load_config(Some(temp_file.path().to_str().unwrap())).unwrap();
    config.normalize().unwrap();

    assert_eq!(config.options.next_tag, "v3.4.9");
    assert_eq!(config.options.pinned_repos, vec!["ocadm"]);
    assert_eq!(config.options.commit_filters["Type"], vec!["feat", "fix"]);
    assert!(config.options.use_semver);

    let repos = &config.releases[0].repos;
    assert_eq!(repos[0].working_dir, Some(PathBuf::from("./_cache/onecloud")));
    assert_eq!(repos[1].name, "tool");
    assert_eq!(repos[1].working_dir, Some(PathBuf::from("/src/tool")));
    assert_eq!(repos[1].processor_kind(), ProcessorKind::Bitbucket);
}

#[test]
fn test_load_yaml_file() {
    let mut temp_file = Builder::new().suffix(".yml").tempfile().unwrap();
    let yaml_content = r#"
bin: /usr/bin/git
cache_dir: /var/cache/changelog
options:
  note_keywords: [DEPRECATED]
releases:
  - branch: release-3.3
    repos:
      - url: https://github.com/yunionio/ocadm
        name: ocadm-fork
"#;
    temp_file.write_all(yaml_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let mut config = load_config(Some(temp_file.path().to_str().unwrap())).unwrap();
    config.normalize().unwrap();

    assert_eq!(config.bin, "/usr/bin/git");
    assert_eq!(config.options.note_keywords, vec!["DEPRECATED"]);
    let repo = &config.releases[0].repos[0];
    assert_eq!(repo.name, "ocadm-fork");
    assert_eq!(
        repo.working_dir,
        Some(PathBuf::from("/var/cache/changelog/ocadm-fork"))
    );
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    let err = load_config(Some(path.to_str().unwrap())).unwrap_err();
    assert!(err.to_string().contains("read config file"));
}

#[test]
fn test_invalid_toml_is_reported() {
    let err = parse_config("releases = 3", &PathBuf::from("bad.toml")).unwrap_err();
    assert!(err.to_string().starts_with("Configuration error: parse toml config"));
}

#[test]
fn test_example_round_trips_through_toml() {
    let example = Config::example();
    let text = toml::to_string_pretty(&example).unwrap();
    let parsed = parse_config(&text, &PathBuf::from("changelog-gen.toml")).unwrap();
    assert_eq!(parsed, example);
}

#[test]
#[serial]
fn test_config_found_in_current_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("changelog-gen.toml"), TOML_CONFIG).unwrap();

    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();
    let result = load_config(None);
    std::env::set_current_dir(previous).unwrap();

    let config = result.unwrap();
    assert_eq!(config.releases[0].branch, "release/3.4");
}
