use std::collections::BTreeMap;

use crate::config::ChangelogOptions;
use crate::domain::{Commit, CommitGroup, CommitNote, CommitNoteGroup, Extraction};
use crate::field::{compare_values, CommitField, GroupField};

const OTHERS_TITLE: &str = "Others";

/// A commit filter: the field must hold one of `values`
struct CommitFilter {
    name: String,
    field: Option<CommitField>,
    values: Vec<String>,
}

/// Classifies, groups and orders the commits of one version
pub struct CommitExtractor {
    filters: Vec<CommitFilter>,
    no_case_sensitive: bool,
    group_by: Option<CommitField>,
    group_sort_by: Option<GroupField>,
    commit_sort_by: Option<CommitField>,
    title_maps: BTreeMap<String, String>,
}

impl CommitExtractor {
    /// Resolve the configured field names once; unknown names are logged
    pub fn new(options: &ChangelogOptions) -> Self {
        let mut filters: Vec<CommitFilter> = options
            .commit_filters
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(name, values)| CommitFilter {
                name: name.clone(),
                field: CommitField::resolve(name),
                values: values.clone(),
            })
            .collect();
        filters.sort_by(|a, b| a.name.cmp(&b.name));

        CommitExtractor {
            filters,
            no_case_sensitive: options.no_case_sensitive,
            group_by: CommitField::resolve(&options.commit_group_by),
            group_sort_by: GroupField::resolve(&options.commit_group_sort_by),
            commit_sort_by: CommitField::resolve(&options.commit_sort_by),
            title_maps: options.commit_group_title_maps.clone(),
        }
    }

    /// Split commits into sorted groups, merge and revert lists and note groups.
    ///
    /// Merge and revert commits keep their log order and never join a group.
    /// Normal commits rejected by a filter join no group either. Normal commits
    /// with no group value go to a trailing `Others` group. Notes are collected
    /// from every commit.
    pub fn extract(&self, commits: &[Commit]) -> Extraction {
        let mut extraction = Extraction::default();
        let mut others = CommitGroup {
            raw_title: OTHERS_TITLE.to_string(),
            title: OTHERS_TITLE.to_string(),
            commits: Vec::new(),
        };

        for commit in commits {
            for note in &commit.notes {
                append_note(&mut extraction.note_groups, note);
            }

            if commit.is_merge() {
                extraction.merge_commits.push(commit.clone());
                continue;
            }
            if commit.is_revert() {
                extraction.revert_commits.push(commit.clone());
                continue;
            }
            if !self.passes_filters(commit) {
                continue;
            }

            let raw = self
                .group_by
                .and_then(|field| field.get(commit))
                .and_then(|value| value.as_str())
                .unwrap_or_default();

            if raw.is_empty() {
                others.commits.push(commit.clone());
                continue;
            }

            match extraction
                .commit_groups
                .iter()
                .position(|group| self.same_title(&group.raw_title, raw))
            {
                Some(i) => extraction.commit_groups[i].commits.push(commit.clone()),
                None => extraction.commit_groups.push(CommitGroup {
                    raw_title: raw.to_string(),
                    title: self.group_title(raw),
                    commits: vec![commit.clone()],
                }),
            }
        }

        self.sort_groups(&mut extraction.commit_groups);
        if !others.commits.is_empty() {
            self.sort_commits(&mut others.commits);
            extraction.commit_groups.push(others);
        }
        sort_note_groups(&mut extraction.note_groups);

        extraction
    }

    fn passes_filters(&self, commit: &Commit) -> bool {
        self.filters.iter().all(|filter| {
            let Some(value) = filter
                .field
                .and_then(|field| field.get(commit))
                .and_then(|value| value.as_str())
            else {
                return false;
            };

            filter
                .values
                .iter()
                .any(|allowed| self.same_title(allowed, value))
        })
    }

    fn same_title(&self, a: &str, b: &str) -> bool {
        if self.no_case_sensitive {
            a.to_lowercase() == b.to_lowercase()
        } else {
            a == b
        }
    }

    fn group_title(&self, raw: &str) -> String {
        self.title_maps
            .get(raw)
            .cloned()
            .unwrap_or_else(|| title_case(raw))
    }

    fn sort_groups(&self, groups: &mut [CommitGroup]) {
        if let Some(field) = self.group_sort_by {
            groups.sort_by(|a, b| compare_values(Some(field.get(a)), Some(field.get(b))));
        }

        for group in groups.iter_mut() {
            self.sort_commits(&mut group.commits);
        }
    }

    fn sort_commits(&self, commits: &mut [Commit]) {
        if let Some(field) = self.commit_sort_by {
            commits.sort_by(|a, b| compare_values(field.get(a), field.get(b)));
        }
    }
}

fn append_note(groups: &mut Vec<CommitNoteGroup>, note: &CommitNote) {
    match groups.iter().position(|group| group.title == note.title) {
        Some(i) => groups[i].notes.push(note.clone()),
        None => groups.push(CommitNoteGroup {
            title: note.title.clone(),
            notes: vec![note.clone()],
        }),
    }
}

fn sort_note_groups(groups: &mut [CommitNoteGroup]) {
    groups.sort_by_key(|group| group.title.to_lowercase());
    for group in groups.iter_mut() {
        group.notes.sort_by_key(|note| note.title.to_lowercase());
    }
}

/// Upper-case the first letter of every word (`bug fixes` -> `Bug Fixes`)
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut word_start = true;

    for c in input.chars() {
        if word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        word_start = !(c.is_alphanumeric() || c == '_');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommitKind, CommitMerge, CommitRevert};

    fn commit(r#type: &str, scope: &str, header: &str, notes: &[(&str, &str)]) -> Commit {
        Commit {
            r#type: r#type.to_string(),
            scope: scope.to_string(),
            header: header.to_string(),
            notes: notes
                .iter()
                .map(|(title, body)| CommitNote::new(*title, *body))
                .collect(),
            ..Default::default()
        }
    }

    fn headers(commits: &[Commit]) -> Vec<&str> {
        commits.iter().map(|c| c.header.as_str()).collect()
    }

    fn grouping_options() -> ChangelogOptions {
        ChangelogOptions {
            commit_sort_by: "Scope".to_string(),
            commit_group_by: "Type".to_string(),
            commit_group_sort_by: "Title".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("foo"), "Foo");
        assert_eq!(title_case("bug fixes"), "Bug Fixes");
        assert_eq!(title_case("ci-build"), "Ci-Build");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_others_group_is_last() {
        let extractor = CommitExtractor::new(&grouping_options());
        let commits = vec![
            commit("", "", "untyped", &[]),
            commit("zeta", "", "z", &[]),
            commit("alpha", "", "a", &[]),
        ];

        let extraction = extractor.extract(&commits);
        let titles: Vec<&str> = extraction
            .commit_groups
            .iter()
            .map(|g| g.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Alpha", "Zeta", "Others"]);
        assert_eq!(headers(&extraction.commit_groups[2].commits), vec!["untyped"]);
    }

    #[test]
    fn test_no_others_group_when_empty() {
        let extractor = CommitExtractor::new(&grouping_options());
        let extraction = extractor.extract(&[commit("feat", "", "a", &[])]);
        assert_eq!(extraction.commit_groups.len(), 1);
    }

    #[test]
    fn test_filters() {
        let mut options = grouping_options();
        options
            .commit_filters
            .insert("Type".to_string(), vec!["feat".to_string(), "fix".to_string()]);
        options.commit_filters.insert("Scope".to_string(), Vec::new());

        let commits = vec![
            commit("feat", "", "kept", &[]),
            commit("chore", "", "dropped", &[("NOTE", "from dropped")]),
            commit("Fix", "", "case differs", &[]),
        ];

        let extraction = CommitExtractor::new(&options).extract(&commits);
        assert_eq!(extraction.commit_groups.len(), 1);
        assert_eq!(headers(&extraction.commit_groups[0].commits), vec!["kept"]);
        // filtered commits still contribute notes
        assert_eq!(extraction.note_groups[0].notes[0].body, "from dropped");

        options.no_case_sensitive = true;
        let extraction = CommitExtractor::new(&options).extract(&commits);
        let all: Vec<&str> = extraction
            .commit_groups
            .iter()
            .flat_map(|g| headers(&g.commits))
            .collect();
        assert_eq!(all.len(), 2);
        assert!(all.contains(&"case differs"));
    }

    #[test]
    fn test_unknown_filter_field_excludes_commits() {
        let mut options = grouping_options();
        options
            .commit_filters
            .insert("Colour".to_string(), vec!["red".to_string()]);

        let extraction = CommitExtractor::new(&options).extract(&[commit("feat", "", "a", &[])]);
        assert!(extraction.commit_groups.is_empty());
    }

    #[test]
    fn test_case_insensitive_grouping() {
        let mut options = grouping_options();
        options.no_case_sensitive = true;

        let commits = vec![commit("Feat", "b", "1", &[]), commit("feat", "a", "2", &[])];
        let extraction = CommitExtractor::new(&options).extract(&commits);
        assert_eq!(extraction.commit_groups.len(), 1);
        assert_eq!(extraction.commit_groups[0].raw_title, "Feat");
        assert_eq!(headers(&extraction.commit_groups[0].commits), vec!["2", "1"]);
    }

    #[test]
    fn test_merge_and_revert_keep_order() {
        let merge = |header: &str| Commit {
            header: header.to_string(),
            r#type: "feat".to_string(),
            kind: CommitKind::Merge(CommitMerge::default()),
            ..Default::default()
        };
        let revert = Commit {
            header: "r".to_string(),
            kind: CommitKind::Revert(CommitRevert::default()),
            notes: vec![CommitNote::new("BREAKING CHANGE", "reverted api")],
            ..Default::default()
        };

        let commits = vec![merge("m2"), revert, merge("m1")];
        let extraction = CommitExtractor::new(&grouping_options()).extract(&commits);

        assert!(extraction.commit_groups.is_empty());
        assert_eq!(headers(&extraction.merge_commits), vec!["m2", "m1"]);
        assert_eq!(headers(&extraction.revert_commits), vec!["r"]);
        assert_eq!(extraction.note_groups[0].title, "BREAKING CHANGE");
    }

    #[test]
    fn test_incomparable_sort_field_keeps_order() {
        let mut options = grouping_options();
        options.commit_sort_by = "Merge.Ref".to_string();

        let commits = vec![commit("feat", "", "1", &[]), commit("feat", "", "2", &[])];
        let extraction = CommitExtractor::new(&options).extract(&commits);
        assert_eq!(headers(&extraction.commit_groups[0].commits), vec!["1", "2"]);
    }

    #[test]
    fn test_note_groups_sorted_case_insensitively() {
        let commits = vec![commit(
            "feat",
            "",
            "1",
            &[("beta", "b"), ("Alpha", "a"), ("gamma", "g")],
        )];
        let extraction = CommitExtractor::new(&grouping_options()).extract(&commits);
        let titles: Vec<&str> = extraction
            .note_groups
            .iter()
            .map(|g| g.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Alpha", "beta", "gamma"]);
    }
}
