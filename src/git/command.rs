use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{ChangelogError, Result};
use crate::git::GitClient;

/// Spawns the git executable with its working directory set per call
///
/// The process working directory is never changed, so several repositories
/// can be processed in one run without restoring any global state.
#[derive(Debug, Clone)]
pub struct GitCommand {
    bin: String,
    working_dir: PathBuf,
}

impl GitCommand {
    /// # Arguments
    /// * `bin` - git executable name or path
    /// * `working_dir` - Repository the commands run in
    pub fn new(bin: impl Into<String>, working_dir: impl AsRef<Path>) -> Self {
        GitCommand {
            bin: bin.into(),
            working_dir: working_dir.as_ref().to_path_buf(),
        }
    }
}

impl GitClient for GitCommand {
    fn exec(&self, subcmd: &str, args: &[&str]) -> Result<String> {
        tracing::debug!(
            "Running {} {} {} in {}",
            self.bin,
            subcmd,
            args.join(" "),
            self.working_dir.display()
        );

        let output = Command::new(&self.bin)
            .arg(subcmd)
            .args(args)
            .current_dir(&self.working_dir)
            .output()
            .map_err(|e| {
                ChangelogError::command(format!("failed to spawn {} {}: {}", self.bin, subcmd, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ChangelogError::command(format!(
                "{} {} exited with {}: {}",
                self.bin,
                subcmd,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.trim_end_matches('\n').to_string())
    }
}
