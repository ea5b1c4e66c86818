//! Named field access for commits and commit groups.
//!
//! Sorting, grouping, filtering and regex capture assignment are configured
//! with field names such as `Type`, `Scope` or `Author.Name`. Names are parsed
//! once into the enums below; each enum knows how to read (or write) its field
//! on the record, so no lookup by string happens per commit.
//!
//! Names match case-insensitively and ignore `_`, so `Author.Name`,
//! `author.name` and `raw_title` / `RawTitle` are all accepted.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::boundary::BoundaryWarning;
use crate::domain::{Commit, CommitGroup, CommitMerge, CommitRevert};

/// A field value read from a record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Str(&'a str),
    Int(i64),
    Float(f64),
    Time(DateTime<Utc>),
}

impl<'a> FieldValue<'a> {
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Three-way comparison of two values of compatible kinds.
    ///
    /// Integers and floats compare with each other; any other mix of kinds
    /// (or a NaN) is incomparable and yields `None`.
    pub fn compare(&self, other: &FieldValue<'_>) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Str(a), FieldValue::Str(b)) => Some(a.cmp(b)),
            (FieldValue::Int(a), FieldValue::Int(b)) => Some(a.cmp(b)),
            (FieldValue::Float(a), FieldValue::Float(b)) => a.partial_cmp(b),
            (FieldValue::Int(a), FieldValue::Float(b)) => (*a as f64).partial_cmp(b),
            (FieldValue::Float(a), FieldValue::Int(b)) => a.partial_cmp(&(*b as f64)),
            (FieldValue::Time(a), FieldValue::Time(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Ordering used by the extractor's sorts.
///
/// Missing or incomparable values are treated as equal so a stable sort
/// leaves those pairs in their original order.
pub fn compare_values(a: Option<FieldValue<'_>>, b: Option<FieldValue<'_>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.compare(&b).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Readable field of a [`Commit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitField {
    Repo,
    Header,
    Type,
    Scope,
    Subject,
    Body,
    HashLong,
    HashShort,
    AuthorName,
    AuthorEmail,
    AuthorDate,
    CommitterName,
    CommitterEmail,
    CommitterDate,
    MergeRef,
    MergeSource,
    RevertHeader,
}

impl CommitField {
    pub fn parse(name: &str) -> Option<Self> {
        let field = match normalize(name).as_str() {
            "repo" => CommitField::Repo,
            "header" => CommitField::Header,
            "type" => CommitField::Type,
            "scope" => CommitField::Scope,
            "subject" => CommitField::Subject,
            "body" => CommitField::Body,
            "hash.long" => CommitField::HashLong,
            "hash.short" => CommitField::HashShort,
            "author.name" => CommitField::AuthorName,
            "author.email" => CommitField::AuthorEmail,
            "author.date" => CommitField::AuthorDate,
            "committer.name" => CommitField::CommitterName,
            "committer.email" => CommitField::CommitterEmail,
            "committer.date" => CommitField::CommitterDate,
            "merge.ref" => CommitField::MergeRef,
            "merge.source" => CommitField::MergeSource,
            "revert.header" => CommitField::RevertHeader,
            _ => return None,
        };
        Some(field)
    }

    /// Parse a configured field name, warning when it is set but unknown
    pub fn resolve(name: &str) -> Option<Self> {
        if name.is_empty() {
            return None;
        }
        let field = CommitField::parse(name);
        if field.is_none() {
            BoundaryWarning::UnknownField {
                field: name.to_string(),
                kind: "commit",
            }
            .emit();
        }
        field
    }

    /// Read this field; merge/revert fields are `None` on other commit kinds
    pub fn get<'a>(&self, commit: &'a Commit) -> Option<FieldValue<'a>> {
        let value = match self {
            CommitField::Repo => FieldValue::Str(&commit.repo),
            CommitField::Header => FieldValue::Str(&commit.header),
            CommitField::Type => FieldValue::Str(&commit.r#type),
            CommitField::Scope => FieldValue::Str(&commit.scope),
            CommitField::Subject => FieldValue::Str(&commit.subject),
            CommitField::Body => FieldValue::Str(&commit.body),
            CommitField::HashLong => FieldValue::Str(&commit.hash.long),
            CommitField::HashShort => FieldValue::Str(&commit.hash.short),
            CommitField::AuthorName => FieldValue::Str(&commit.author.name),
            CommitField::AuthorEmail => FieldValue::Str(&commit.author.email),
            CommitField::AuthorDate => FieldValue::Time(commit.author.date),
            CommitField::CommitterName => FieldValue::Str(&commit.committer.name),
            CommitField::CommitterEmail => FieldValue::Str(&commit.committer.email),
            CommitField::CommitterDate => FieldValue::Time(commit.committer.date),
            CommitField::MergeRef => FieldValue::Str(&commit.merge()?.r#ref),
            CommitField::MergeSource => FieldValue::Str(&commit.merge()?.source),
            CommitField::RevertHeader => FieldValue::Str(&commit.revert()?.header),
        };
        Some(value)
    }
}

/// Readable field of a [`CommitGroup`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    RawTitle,
    Title,
    /// Number of commits in the group
    Commits,
}

impl GroupField {
    pub fn parse(name: &str) -> Option<Self> {
        match normalize(name).as_str() {
            "rawtitle" => Some(GroupField::RawTitle),
            "title" => Some(GroupField::Title),
            "commits" => Some(GroupField::Commits),
            _ => None,
        }
    }

    pub fn resolve(name: &str) -> Option<Self> {
        if name.is_empty() {
            return None;
        }
        let field = GroupField::parse(name);
        if field.is_none() {
            BoundaryWarning::UnknownField {
                field: name.to_string(),
                kind: "commit group",
            }
            .emit();
        }
        field
    }

    pub fn get<'a>(&self, group: &'a CommitGroup) -> FieldValue<'a> {
        match self {
            GroupField::RawTitle => FieldValue::Str(&group.raw_title),
            GroupField::Title => FieldValue::Str(&group.title),
            GroupField::Commits => FieldValue::Int(group.commits.len() as i64),
        }
    }
}

/// Commit field a header-pattern capture can be written into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    Type,
    Scope,
    Subject,
    Header,
    Body,
}

impl HeaderField {
    pub fn parse(name: &str) -> Option<Self> {
        match normalize(name).as_str() {
            "type" => Some(HeaderField::Type),
            "scope" => Some(HeaderField::Scope),
            "subject" => Some(HeaderField::Subject),
            "header" => Some(HeaderField::Header),
            "body" => Some(HeaderField::Body),
            _ => None,
        }
    }

    pub fn assign(&self, commit: &mut Commit, value: &str) {
        let slot = match self {
            HeaderField::Type => &mut commit.r#type,
            HeaderField::Scope => &mut commit.scope,
            HeaderField::Subject => &mut commit.subject,
            HeaderField::Header => &mut commit.header,
            HeaderField::Body => &mut commit.body,
        };
        *slot = value.to_string();
    }
}

/// Merge field a merge-pattern capture can be written into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeField {
    Ref,
    Source,
}

impl MergeField {
    pub fn parse(name: &str) -> Option<Self> {
        match normalize(name).as_str() {
            "ref" => Some(MergeField::Ref),
            "source" => Some(MergeField::Source),
            _ => None,
        }
    }

    pub fn assign(&self, merge: &mut CommitMerge, value: &str) {
        match self {
            MergeField::Ref => merge.r#ref = value.to_string(),
            MergeField::Source => merge.source = value.to_string(),
        }
    }
}

/// Revert field a revert-pattern capture can be written into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertField {
    Header,
}

impl RevertField {
    pub fn parse(name: &str) -> Option<Self> {
        match normalize(name).as_str() {
            "header" => Some(RevertField::Header),
            _ => None,
        }
    }

    pub fn assign(&self, revert: &mut CommitRevert, value: &str) {
        match self {
            RevertField::Header => revert.header = value.to_string(),
        }
    }
}

/// Parse a list of capture targets, warning about (and keeping a hole for)
/// names that cannot be assigned so capture indexes stay aligned.
pub fn resolve_targets<T>(
    names: &[String],
    kind: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Vec<Option<T>> {
    names
        .iter()
        .map(|name| {
            let target = parse(name);
            if target.is_none() {
                BoundaryWarning::UnknownField {
                    field: name.clone(),
                    kind,
                }
                .emit();
            }
            target
        })
        .collect()
}
