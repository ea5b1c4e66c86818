use serde::Serialize;

use super::commit::{Commit, CommitNote};
use super::tag::Tag;

/// Commits bucketed by the configured group-by field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitGroup {
    /// Raw title before conversion (e.g. `build`)
    pub raw_title: String,
    /// Mapped display title, or the title-cased raw title (e.g. `Build`)
    pub title: String,
    pub commits: Vec<Commit>,
}

/// Notes sharing one title across every commit of a version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitNoteGroup {
    pub title: String,
    pub notes: Vec<CommitNote>,
}

/// Classified commit set shared by [`Version`] and [`Unreleased`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub commit_groups: Vec<CommitGroup>,
    pub merge_commits: Vec<Commit>,
    pub revert_commits: Vec<Commit>,
    pub note_groups: Vec<CommitNoteGroup>,
}

/// Every commit of the interval ending at `tag`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub tag: Tag,
    pub commit_groups: Vec<CommitGroup>,
    pub commits: Vec<Commit>,
    pub merge_commits: Vec<Commit>,
    pub revert_commits: Vec<Commit>,
    pub note_groups: Vec<CommitNoteGroup>,
}

impl Version {
    pub fn new(tag: Tag, commits: Vec<Commit>, extraction: Extraction) -> Self {
        Version {
            tag,
            commit_groups: extraction.commit_groups,
            commits,
            merge_commits: extraction.merge_commits,
            revert_commits: extraction.revert_commits,
            note_groups: extraction.note_groups,
        }
    }
}

/// Commits made after the newest tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Unreleased {
    pub commit_groups: Vec<CommitGroup>,
    pub commits: Vec<Commit>,
    pub merge_commits: Vec<Commit>,
    pub revert_commits: Vec<Commit>,
    pub note_groups: Vec<CommitNoteGroup>,
}

impl Unreleased {
    pub fn new(commits: Vec<Commit>, extraction: Extraction) -> Self {
        Unreleased {
            commit_groups: extraction.commit_groups,
            commits,
            merge_commits: extraction.merge_commits,
            revert_commits: extraction.revert_commits,
            note_groups: extraction.note_groups,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}
