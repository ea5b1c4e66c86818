use std::fmt;

/// Non-fatal problems found while reading tags, parsing commits or resolving
/// configured field names.
///
/// None of these abort a run; they are reported through [`BoundaryWarning::emit`]
/// and leave the affected value skipped or defaulted.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// Tag ignored in semver mode because its name is not `v<major>.<minor>.<patch>`
    NonSemverTag { tag: String },
    /// Author or committer timestamp that is not a Unix time; epoch is used instead
    UnparsableTimestamp { value: String },
    /// A configured field name that no record exposes
    UnknownField { field: String, kind: &'static str },
    /// Local clone whose `origin` is not the configured repository URL
    OriginMismatch {
        dir: String,
        origin: String,
        url: String,
    },
}

impl BoundaryWarning {
    /// Log the warning at `warn` level
    pub fn emit(&self) {
        tracing::warn!("{}", self);
    }
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::NonSemverTag { tag } => {
                write!(f, "Skipping tag '{}': not a semantic version", tag)
            }
            BoundaryWarning::UnparsableTimestamp { value } => {
                write!(f, "Cannot parse timestamp '{}', using epoch", value)
            }
            BoundaryWarning::UnknownField { field, kind } => {
                write!(f, "Unknown {} field '{}'", kind, field)
            }
            BoundaryWarning::OriginMismatch { dir, origin, url } => write!(
                f,
                "{}: origin '{}' does not match configured url '{}'",
                dir, origin, url
            ),
        }
    }
}
