use chrono::{DateTime, Utc};
use serde::Serialize;

/// Snapshot of a neighbouring tag.
///
/// Holds copies of the fields instead of a reference back into the tag list,
/// so tags never own each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelateTag {
    pub name: String,
    pub subject: String,
    pub date: DateTime<Utc>,
}

/// Represents a git tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub name: String,
    pub subject: String,
    pub date: DateTime<Utc>,
    /// Chronologically newer neighbour
    pub next: Option<RelateTag>,
    /// Chronologically older neighbour
    pub previous: Option<RelateTag>,
    #[serde(serialize_with = "serialize_semver")]
    pub semantic_version: Option<semver::Version>,
}

fn serialize_semver<S>(
    version: &Option<semver::Version>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match version {
        Some(v) => serializer.serialize_some(&v.to_string()),
        None => serializer.serialize_none(),
    }
}

impl Tag {
    /// Create a tag with no neighbours and no semantic version
    pub fn new(name: impl Into<String>, subject: impl Into<String>, date: DateTime<Utc>) -> Self {
        Tag {
            name: name.into(),
            subject: subject.into(),
            date,
            next: None,
            previous: None,
            semantic_version: None,
        }
    }

    /// Attach the parsed semantic version
    pub fn with_version(mut self, version: semver::Version) -> Self {
        self.semantic_version = Some(version);
        self
    }

    /// Copy of the identifying fields, used for neighbour links
    pub fn relate(&self) -> RelateTag {
        RelateTag {
            name: self.name.clone(),
            subject: self.subject.clone(),
            date: self.date,
        }
    }

    /// Extract version number from tag (e.g., "v1.2.3" -> "1.2.3")
    pub fn version_part(&self) -> &str {
        self.name.trim_start_matches('v').trim_start_matches('V')
    }
}

/// Link every tag to its neighbours in the given (descending) order.
///
/// Index `i - 1` is the newer tag, index `i + 1` the older one.
pub fn assign_previous_and_next(tags: &mut [Tag]) {
    let snapshots: Vec<RelateTag> = tags.iter().map(Tag::relate).collect();

    for (i, tag) in tags.iter_mut().enumerate() {
        tag.next = if i > 0 {
            Some(snapshots[i - 1].clone())
        } else {
            None
        };
        tag.previous = snapshots.get(i + 1).cloned();
    }
}
