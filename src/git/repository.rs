use std::fs;
use std::path::{Path, PathBuf};

use git2::Repository;

use crate::boundary::BoundaryWarning;
use crate::error::{ChangelogError, Result, ResultExt};

/// A repository checked out under the cache directory
///
/// Cloned from its URL on first use and opened on later runs.
pub struct LocalRepository {
    repo: Repository,
    local_dir: PathBuf,
    url: String,
}

impl LocalRepository {
    /// Open `local_dir`, cloning `url` into it when it does not exist yet
    ///
    /// # Arguments
    /// * `local_dir` - Clone destination (e.g. `./_cache/onecloud`)
    /// * `url` - Remote URL
    ///
    /// # Returns
    /// * `Ok(LocalRepository)` - The opened or freshly cloned repository
    /// * `Err` - If the directory cannot be created, cloned or opened
    pub fn open_or_clone(local_dir: impl AsRef<Path>, url: &str) -> Result<Self> {
        let local_dir = local_dir.as_ref().to_path_buf();

        let repo = if local_dir.exists() {
            Repository::open(&local_dir)
                .with_context(|| format!("open local repo \"{}\"", local_dir.display()))?
        } else {
            fs::create_dir_all(&local_dir)
                .with_context(|| format!("create dir \"{}\"", local_dir.display()))?;

            tracing::info!("Start clone {} to {}", url, local_dir.display());
            let mut builder = git2::build::RepoBuilder::new();
            builder.fetch_options(fetch_options());
            builder
                .clone(url, &local_dir)
                .with_context(|| format!("clone \"{}\" to local \"{}\"", url, local_dir.display()))?
        };

        Ok(LocalRepository {
            repo,
            local_dir,
            url: url.to_string(),
        })
    }

    pub fn local_dir(&self) -> &Path {
        &self.local_dir
    }

    /// `<local_dir>: <url>`, used to prefix log lines and errors
    pub fn log_prefix(&self) -> String {
        format!("{}: {}", self.local_dir.display(), self.url)
    }

    /// URL of the `origin` remote
    pub fn origin_url(&self) -> Result<String> {
        let remote = self
            .repo
            .find_remote("origin")
            .map_err(|_| ChangelogError::config("not found 'origin' remote"))?;

        remote
            .url()
            .map(str::to_string)
            .ok_or_else(|| ChangelogError::config("'origin' remote has no url"))
    }

    /// Warning when `origin` points somewhere else than the configured URL,
    /// e.g. a cache directory reused for another repository
    pub fn check_origin(&self) -> Result<Option<BoundaryWarning>> {
        let origin = self.origin_url()?;
        if same_remote(&origin, &self.url) {
            return Ok(None);
        }

        Ok(Some(BoundaryWarning::OriginMismatch {
            dir: self.local_dir().display().to_string(),
            origin,
            url: self.url.clone(),
        }))
    }

    /// Fetch every branch and tag from `origin`
    pub fn fetch(&self) -> Result<()> {
        tracing::info!("Start fetch {}", self.log_prefix());

        let mut remote = self
            .repo
            .find_remote("origin")
            .map_err(|_| ChangelogError::config("not found 'origin' remote"))?;

        let refspecs = &["+refs/heads/*:refs/remotes/origin/*", "+refs/tags/*:refs/tags/*"];
        let mut options = fetch_options();
        options.download_tags(git2::AutotagOption::All);

        remote
            .fetch(refspecs, Some(&mut options), None)
            .with_context(|| format!("fetch repo {}", self.log_prefix()))?;

        Ok(())
    }
}

fn same_remote(a: &str, b: &str) -> bool {
    let trim = |url: &str| url.trim_end_matches('/').trim_end_matches(".git").to_string();
    trim(a) == trim(b)
}

/// Fetch options authenticating with the usual SSH keys, the agent, or defaults
fn fetch_options<'a>() -> git2::FetchOptions<'a> {
    let mut callbacks = git2::RemoteCallbacks::new();
    callbacks.credentials(|_url, username_from_url, allowed_types| {
        let username = username_from_url.unwrap_or("git");

        if allowed_types.contains(git2::CredentialType::SSH_KEY) {
            if let Some(ssh_dir) = dirs::home_dir().map(|home| home.join(".ssh")) {
                for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let path = ssh_dir.join(key);
                    if path.exists() {
                        if let Ok(cred) = git2::Cred::ssh_key(username, None, &path, None) {
                            return Ok(cred);
                        }
                    }
                }
            }

            if let Ok(cred) = git2::Cred::ssh_key_from_agent(username) {
                return Ok(cred);
            }
        }

        git2::Cred::default()
    });

    let mut options = git2::FetchOptions::new();
    options.remote_callbacks(callbacks);
    options
}
