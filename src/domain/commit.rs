use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Long and abbreviated commit hash
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitHash {
    pub long: String,
    pub short: String,
}

/// Author or committer identity with its timestamp
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitSignature {
    pub name: String,
    pub email: String,
    pub date: DateTime<Utc>,
}

/// Fields captured from a merge header (e.g. `Merge pull request #3 from user/branch`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitMerge {
    pub r#ref: String,
    pub source: String,
}

/// Fields captured from a revert header (e.g. `Revert "fix: something"`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitRevert {
    pub header: String,
}

/// A commit is exactly one of normal, merge or revert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CommitKind {
    #[default]
    Normal,
    Merge(CommitMerge),
    Revert(CommitRevert),
}

impl CommitKind {
    pub fn merge(&self) -> Option<&CommitMerge> {
        match self {
            CommitKind::Merge(m) => Some(m),
            _ => None,
        }
    }

    pub fn revert(&self) -> Option<&CommitRevert> {
        match self {
            CommitKind::Revert(r) => Some(r),
            _ => None,
        }
    }
}

// Rendered as the two optional `merge` / `revert` keys consumers expect.
impl Serialize for CommitKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("merge", &self.merge())?;
        map.serialize_entry("revert", &self.revert())?;
        map.end()
    }
}

/// Issue reference found in a header or body (e.g. `Closes owner/repo#12`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitRef {
    /// e.g. `Closes`
    pub action: String,
    /// e.g. `123`
    pub r#ref: String,
    /// e.g. `owner/repository`
    pub source: String,
}

impl CommitRef {
    pub fn new(action: impl Into<String>, source: impl Into<String>, r#ref: impl Into<String>) -> Self {
        CommitRef {
            action: action.into(),
            r#ref: r#ref.into(),
            source: source.into(),
        }
    }
}

/// Footer annotation such as a `BREAKING CHANGE` note
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitNote {
    pub title: String,
    pub body: String,
}

impl CommitNote {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        CommitNote {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Parsed representation of one git log record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub repo: String,
    pub hash: CommitHash,
    pub author: CommitSignature,
    pub committer: CommitSignature,
    #[serde(flatten)]
    pub kind: CommitKind,
    pub refs: Vec<CommitRef>,
    pub notes: Vec<CommitNote>,
    /// User names mentioned in the header or body
    pub mentions: Vec<String>,
    /// e.g. `feat(core): add new feature`
    pub header: String,
    /// e.g. `feat`
    pub r#type: String,
    /// e.g. `core`
    pub scope: String,
    /// e.g. `add new feature`
    pub subject: String,
    pub body: String,
}

impl Commit {
    pub fn is_merge(&self) -> bool {
        matches!(self.kind, CommitKind::Merge(_))
    }

    pub fn is_revert(&self) -> bool {
        matches!(self.kind, CommitKind::Revert(_))
    }

    pub fn merge(&self) -> Option<&CommitMerge> {
        self.kind.merge()
    }

    pub fn revert(&self) -> Option<&CommitRevert> {
        self.kind.revert()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_default_is_normal() {
        let commit = Commit::default();
        assert!(!commit.is_merge());
        assert!(!commit.is_revert());
        assert!(commit.merge().is_none());
    }

    #[test]
    fn test_commit_kind_accessors() {
        let commit = Commit {
            kind: CommitKind::Revert(CommitRevert {
                header: "fix: x".to_string(),
            }),
            ..Default::default()
        };
        assert!(commit.is_revert());
        assert!(!commit.is_merge());
        assert_eq!(commit.revert().unwrap().header, "fix: x");
    }

    #[test]
    fn test_commit_serializes_merge_and_revert_keys() {
        let commit = Commit {
            header: "Merge pull request #3 from user/branch".to_string(),
            kind: CommitKind::Merge(CommitMerge {
                r#ref: "3".to_string(),
                source: "user/branch".to_string(),
            }),
            ..Default::default()
        };

        let value = serde_json::to_value(&commit).unwrap();
        assert_eq!(value["merge"]["ref"], "3");
        assert_eq!(value["merge"]["source"], "user/branch");
        assert!(value["revert"].is_null());
        assert_eq!(value["type"], "");
        assert!(value.get("kind").is_none());
    }
}
