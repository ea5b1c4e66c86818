//! Git access layer
//!
//! The changelog engine never talks to a repository directly. Tags and commit
//! logs are read as text through the [GitClient] trait, which has two
//! implementations:
//!
//! - [command::GitCommand]: spawns the git binary inside a working directory
//! - [mock::MockClient]: canned output for tests
//!
//! [repository::LocalRepository] is responsible for getting a repository onto
//! disk (clone or open, then fetch tags) before a [command::GitCommand] is
//! pointed at it.
//!
//! # Usage
//!
//! ```rust
//! # use changelog_gen::git::GitClient;
//! # fn example(client: &dyn GitClient) -> changelog_gen::Result<()> {
//! let refs = client.exec("for-each-ref", &["--format", "%(refname)", "refs/tags"])?;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod mock;
pub mod repository;

pub use command::GitCommand;
pub use mock::MockClient;
pub use repository::LocalRepository;

use crate::error::Result;

/// Starts every record in `for-each-ref` and `log` output
pub const SEPARATOR: &str = "@@__CHGLOG__@@";

/// Separates the fields of one `log` record
pub const DELIMITER: &str = "@@__CHGLOG_DELIMITER__@@";

/// Runs git sub-commands and returns their standard output
///
/// ## Thread Safety
///
/// All implementors must be `Send + Sync` so one client can be shared by the
/// tag reader, the commit parser and the generator through an `Arc`.
pub trait GitClient: Send + Sync {
    /// Execute `git <subcmd> <args...>`
    ///
    /// # Arguments
    /// * `subcmd` - The git sub-command (e.g. "log", "for-each-ref")
    /// * `args` - Arguments passed after the sub-command
    ///
    /// # Returns
    /// * `Ok(String)` - Standard output with the trailing newline removed
    /// * `Err` - If the process cannot be spawned or exits unsuccessfully
    fn exec(&self, subcmd: &str, args: &[&str]) -> Result<String>;
}
