use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use changelog_gen::config::{self, Config};
use changelog_gen::git::LocalRepository;
use changelog_gen::global::{self, GlobalGenerator};
use changelog_gen::output::{OutputFormat, ReleaseWriter};
use changelog_gen::ui;

#[derive(Parser)]
#[command(
    name = "changelog-gen",
    version,
    about = "Generate release changelogs from the git history of many repositories"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read every configured release and print its render data
    Run {
        #[arg(short, long, help = "Custom configuration file path")]
        config: Option<String>,

        #[arg(short, long, help = "Use the local clones as they are")]
        no_fetch: bool,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        output_format: OutputFormat,

        #[arg(short, long, help = "Enable debug logging")]
        verbose: bool,
    },
    /// Configuration helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print an example configuration
    Example {
        #[arg(short, long, value_enum, default_value_t = ConfigFormat::Toml)]
        format: ConfigFormat,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ConfigFormat {
    Toml,
    Yaml,
}

fn main() {
    let args = Args::parse();

    let result = match args.command {
        Command::Run {
            config,
            no_fetch,
            output_format,
            verbose,
        } => {
            init_tracing(verbose);
            run(config.as_deref(), no_fetch, output_format)
        }
        Command::Config {
            command: ConfigCommand::Example { format },
        } => print_example(format),
    };

    if let Err(e) = result {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(config_path: Option<&str>, no_fetch: bool, format: OutputFormat) -> Result<()> {
    let mut config = config::load_config(config_path).context("load config")?;
    if let Some(path) = config_path {
        ui::display_config_path(Path::new(path));
    }
    config.normalize().context("normalize config")?;

    prepare_repositories(&config, no_fetch)?;

    let pinned = config.options.pinned_repos.clone();
    let generator = GlobalGenerator::new(config);
    let results = generator.get_results()?;

    for release in &results.releases {
        ui::display_release_summary(release);
    }

    let data = global::render_data(&results, &pinned)?;
    println!("{}", format.render(&data)?);

    if let Some(dir) = generator.config().output.dir.as_deref() {
        let written = ReleaseWriter::new(dir, format)
            .write_all(&data)
            .with_context(|| format!("write output to {}", dir.display()))?;
        ui::display_status(&format!(
            "Wrote {} file(s) to {}",
            written.len(),
            dir.display()
        ));
    }

    ui::display_success(&format!("{} release(s) generated", results.releases.len()));
    Ok(())
}

/// Clone missing repositories and fetch the others
fn prepare_repositories(config: &Config, no_fetch: bool) -> Result<()> {
    let mut seen = HashSet::new();

    for release in &config.releases {
        for repo in &release.repos {
            let Some(dir) = repo.working_dir.as_ref() else {
                anyhow::bail!("repo \"{}\" has no working dir", repo.name);
            };
            // the same repository is usually listed by every release
            if !seen.insert(dir.clone()) {
                continue;
            }

            let local = LocalRepository::open_or_clone(dir, &repo.url)?;
            match local.check_origin() {
                Ok(Some(warning)) => warning.emit(),
                Ok(None) => {}
                Err(e) => tracing::debug!("{}: {}", local.log_prefix(), e),
            }
            if no_fetch {
                continue;
            }

            ui::display_status(&format!("Fetching {}", local.log_prefix()));
            local
                .fetch()
                .with_context(|| format!("fetch {}", local.log_prefix()))?;
        }
    }

    Ok(())
}

fn print_example(format: ConfigFormat) -> Result<()> {
    let example = Config::example();
    let text = match format {
        ConfigFormat::Toml => toml::to_string_pretty(&example)?,
        ConfigFormat::Yaml => serde_yaml::to_string(&example)?,
    };

    print!("{}", text);
    Ok(())
}
