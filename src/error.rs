use thiserror::Error;

/// Unified error type for changelog-gen operations
#[derive(Error, Debug)]
pub enum ChangelogError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Git command failed: {0}")]
    Command(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("could not find the tag: {0}")]
    NotFoundTag(String),

    #[error("failed to parse the query: {0}")]
    FailedQueryParse(String),

    #[error("cannot parse date of tag \"{tag}\": {value:?}")]
    TagDate { tag: String, value: String },

    #[error("git-tag does not exist")]
    NoTags,

    #[error("\"{0}\" tag already exists")]
    NextTagExists(String),

    #[error("commits corresponding to \"{0}\" was not found")]
    NoVersions(String),

    #[error("Branch error: {0}")]
    Branch(String),

    #[error("Weight error: {0}")]
    Weight(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ChangelogError>,
    },
}

/// Convenience type alias for Results in changelog-gen
pub type Result<T> = std::result::Result<T, ChangelogError>;

impl ChangelogError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ChangelogError::Config(msg.into())
    }

    /// Create a command error with context
    pub fn command(msg: impl Into<String>) -> Self {
        ChangelogError::Command(msg.into())
    }

    /// Create a branch error with context
    pub fn branch(msg: impl Into<String>) -> Self {
        ChangelogError::Branch(msg.into())
    }

    /// Create a weight error with context
    pub fn weight(msg: impl Into<String>) -> Self {
        ChangelogError::Weight(msg.into())
    }

    /// Wrap this error with a description of what was being done
    pub fn context(self, context: impl Into<String>) -> Self {
        ChangelogError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping every context layer
    pub fn root(&self) -> &ChangelogError {
        match self {
            ChangelogError::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Attach context to crate results, the way `anyhow::Context` does for the binary
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<ChangelogError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().context(context))
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| e.into().context(f()))
    }
}
