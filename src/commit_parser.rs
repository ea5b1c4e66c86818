use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;

use crate::boundary::BoundaryWarning;
use crate::config::ChangelogOptions;
use crate::domain::{
    Commit, CommitHash, CommitKind, CommitMerge, CommitNote, CommitRef, CommitRevert,
    CommitSignature,
};
use crate::error::{Result, ResultExt};
use crate::field::{resolve_targets, HeaderField, MergeField, RevertField};
use crate::git::{GitClient, DELIMITER, SEPARATOR};
use crate::processor::Processor;

const HASH_FIELD: &str = "HASH";
const AUTHOR_FIELD: &str = "AUTHOR";
const COMMITTER_FIELD: &str = "COMMITTER";
const SUBJECT_FIELD: &str = "SUBJECT";
const BODY_FIELD: &str = "BODY";

/// `--pretty` format producing one `SEPARATOR`-prefixed record per commit
pub fn log_format() -> String {
    let fields = [
        format!("{}:%H\t%h", HASH_FIELD),
        format!("{}:%an\t%ae\t%at", AUTHOR_FIELD),
        format!("{}:%cn\t%ce\t%ct", COMMITTER_FIELD),
        format!("{}:%s", SUBJECT_FIELD),
        format!("{}:%b", BODY_FIELD),
    ];
    format!("{}{}", SEPARATOR, fields.join(DELIMITER))
}

fn join_escaped(list: &[String]) -> String {
    list.iter()
        .map(|s| regex::escape(s))
        .collect::<Vec<_>>()
        .join("|")
}

/// A regex plus the fields its capture groups are written into
struct CapturePattern<T> {
    re: Regex,
    targets: Vec<Option<T>>,
}

impl<T: Copy> CapturePattern<T> {
    fn new(
        pattern: &str,
        names: &[String],
        kind: &'static str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<Self> {
        let re = Regex::new(pattern).with_context(|| format!("{} pattern \"{}\"", kind, pattern))?;
        Ok(CapturePattern {
            re,
            targets: resolve_targets(names, kind, parse),
        })
    }

    /// Call `assign` for each mapped capture; `false` when the pattern does not match
    fn apply(&self, input: &str, mut assign: impl FnMut(T, &str)) -> bool {
        let Some(caps) = self.re.captures(input) else {
            return false;
        };

        for (i, target) in self.targets.iter().enumerate() {
            if let Some(target) = target {
                let value = caps.get(i + 1).map(|m| m.as_str()).unwrap_or_default();
                assign(*target, value);
            }
        }
        true
    }
}

/// Tracks whether a body line is inside a markdown code block.
///
/// A block opened by one fence kind only closes on the same kind.
#[derive(Debug, Default)]
struct FenceDetector {
    fence: Option<usize>,
}

impl FenceDetector {
    const FENCES: [&'static str; 4] = ["```", "~~~", "    ", "\t"];

    fn update(&mut self, line: &str) {
        match self.fence {
            None => self.fence = Self::FENCES.iter().position(|f| line.starts_with(f)),
            Some(i) => {
                if line.starts_with(Self::FENCES[i]) {
                    self.fence = None;
                }
            }
        }
    }

    fn in_code_block(&self) -> bool {
        self.fence.is_some()
    }
}

/// Parses `git log` output over a revision range into [`Commit`]s
pub struct CommitParser {
    client: Arc<dyn GitClient>,
    repo: String,
    no_merges: bool,
    header: CapturePattern<HeaderField>,
    merge: CapturePattern<MergeField>,
    revert: CapturePattern<RevertField>,
    /// `None` when no issue prefix is configured
    re_ref: Option<Regex>,
    re_issue: Option<Regex>,
    /// `None` when no note keyword is configured
    re_notes: Option<Regex>,
    re_mention: Regex,
}

impl CommitParser {
    /// Compile every configured pattern
    ///
    /// # Arguments
    /// * `client` - Git client for the repository
    /// * `options` - Patterns and keywords; empty header/merge/revert patterns get defaults
    /// * `repo` - Repository name stamped into every commit
    ///
    /// # Returns
    /// * `Err` - If a configured pattern is not a valid regex
    pub fn new(
        client: Arc<dyn GitClient>,
        options: &ChangelogOptions,
        repo: impl Into<String>,
    ) -> Result<Self> {
        let mut opts = options.clone();
        opts.normalize_patterns();

        let (re_ref, re_issue) = if opts.issue_prefix.is_empty() {
            (None, None)
        } else {
            let actions = join_escaped(&opts.ref_actions);
            let prefixes = join_escaped(&opts.issue_prefix);
            (
                Some(Regex::new(&format!(
                    r"(?i)({})\s?([\w/\.\-]+)?(?:{})(\d+)",
                    actions, prefixes
                ))?),
                Some(Regex::new(&format!(r"(?:{})(\d+)", prefixes))?),
            )
        };

        let re_notes = if opts.note_keywords.is_empty() {
            None
        } else {
            Some(Regex::new(&format!(
                r"^(?i)\s*({})[:\s]+(.*)",
                join_escaped(&opts.note_keywords)
            ))?)
        };

        Ok(CommitParser {
            client,
            repo: repo.into(),
            no_merges: opts.no_merges,
            header: CapturePattern::new(
                &opts.header_pattern,
                &opts.header_pattern_maps,
                "header",
                HeaderField::parse,
            )?,
            merge: CapturePattern::new(
                &opts.merge_pattern,
                &opts.merge_pattern_maps,
                "merge",
                MergeField::parse,
            )?,
            revert: CapturePattern::new(
                &opts.revert_pattern,
                &opts.revert_pattern_maps,
                "revert",
                RevertField::parse,
            )?,
            re_ref,
            re_issue,
            re_notes,
            re_mention: Regex::new(r"@([\w-]+)")?,
        })
    }

    /// Run `git log` over `rev` and parse every commit in it
    ///
    /// # Arguments
    /// * `rev` - Revision range (e.g. `v1.0.0..v1.1.0`, `HEAD`)
    /// * `processor` - Optional link rewriter; commits it rejects are dropped
    ///
    /// # Returns
    /// * `Ok(Vec<Commit>)` - Commits in log order (newest first)
    /// * `Err` - If `git log` fails
    pub fn parse(&self, rev: &str, processor: Option<&dyn Processor>) -> Result<Vec<Commit>> {
        let pretty = format!("--pretty={}", log_format());
        let mut args = Vec::new();
        if self.no_merges {
            args.push("--no-merges");
        }
        args.extend([rev, "--no-decorate", pretty.as_str()]);

        let out = self
            .client
            .exec("log", &args)
            .with_context(|| format!("git log {}", rev))?;

        Ok(self.parse_log(&out, processor))
    }

    /// Parse raw log output produced with [`log_format`]
    pub fn parse_log(&self, out: &str, processor: Option<&dyn Processor>) -> Vec<Commit> {
        out.split(SEPARATOR)
            .skip(1)
            .map(|record| self.parse_commit(record))
            .filter_map(|commit| match processor {
                Some(processor) => processor.process_commit(commit),
                None => Some(commit),
            })
            .collect()
    }

    fn parse_commit(&self, record: &str) -> Commit {
        let mut commit = Commit {
            repo: self.repo.clone(),
            ..Default::default()
        };

        for token in record.split(DELIMITER) {
            let Some((field, value)) = token.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match field {
                HASH_FIELD => commit.hash = parse_hash(value),
                AUTHOR_FIELD => commit.author = parse_signature(value),
                COMMITTER_FIELD => commit.committer = parse_signature(value),
                SUBJECT_FIELD => self.process_header(&mut commit, value),
                BODY_FIELD => self.process_body(&mut commit, value),
                _ => {}
            }
        }

        commit.refs = uniq_refs(std::mem::take(&mut commit.refs));
        commit.mentions = uniq_mentions(std::mem::take(&mut commit.mentions));
        commit
    }

    fn process_header(&self, commit: &mut Commit, input: &str) {
        commit.header = input.to_string();

        self.header
            .apply(input, |field, value| field.assign(commit, value));

        let mut merge = CommitMerge::default();
        let mut revert = CommitRevert::default();
        if self.merge.apply(input, |field, value| field.assign(&mut merge, value)) {
            commit.kind = CommitKind::Merge(merge);
        } else if self
            .revert
            .apply(input, |field, value| field.assign(&mut revert, value))
        {
            commit.kind = CommitKind::Revert(revert);
        }

        commit.refs.extend(self.parse_refs(input));
        commit.mentions.extend(self.parse_mentions(input));
    }

    fn process_body(&self, commit: &mut Commit, input: &str) {
        let input = input.replace("\r\n", "\n").replace('\r', "\n");

        let mut in_note = false;
        let mut fence = FenceDetector::default();

        for line in input.split('\n') {
            fence.update(line);

            if !fence.in_code_block() {
                let refs = self.parse_refs(line);
                if !refs.is_empty() {
                    in_note = false;
                    commit.refs.extend(refs);
                }

                let mentions = self.parse_mentions(line);
                if !mentions.is_empty() {
                    in_note = false;
                    commit.mentions.extend(mentions);
                }
            }

            let note = self
                .re_notes
                .as_ref()
                .and_then(|re| re.captures(line));

            if let Some(caps) = note {
                in_note = true;
                commit.notes.push(CommitNote::new(&caps[1], &caps[2]));
            } else if in_note {
                if let Some(last) = commit.notes.last_mut() {
                    last.body.push('\n');
                    last.body.push_str(line);
                }
            }
        }

        for note in &mut commit.notes {
            note.body = note.body.trim().to_string();
        }

        commit.body = input;
    }

    /// Action references first, then bare issue numbers not already referenced
    fn parse_refs(&self, input: &str) -> Vec<CommitRef> {
        let (Some(re_ref), Some(re_issue)) = (&self.re_ref, &self.re_issue) else {
            return Vec::new();
        };

        let mut refs: Vec<CommitRef> = re_ref
            .captures_iter(input)
            .map(|caps| {
                let source = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
                CommitRef::new(&caps[1], source, &caps[3])
            })
            .collect();

        for caps in re_issue.captures_iter(input) {
            let number = &caps[1];
            if !refs.iter().any(|r| r.r#ref == number) {
                refs.push(CommitRef::new("", "", number));
            }
        }

        refs
    }

    fn parse_mentions(&self, input: &str) -> Vec<String> {
        self.re_mention
            .captures_iter(input)
            .map(|caps| caps[1].to_string())
            .collect()
    }
}

fn parse_hash(input: &str) -> CommitHash {
    let mut parts = input.split('\t');
    CommitHash {
        long: parts.next().unwrap_or_default().to_string(),
        short: parts.next().unwrap_or_default().to_string(),
    }
}

/// `name\temail\tunix-timestamp`; a bad timestamp degrades to the epoch
fn parse_signature(input: &str) -> CommitSignature {
    let mut parts = input.split('\t');
    let name = parts.next().unwrap_or_default().to_string();
    let email = parts.next().unwrap_or_default().to_string();
    let timestamp = parts.next().unwrap_or_default();

    let date = timestamp
        .parse::<i64>()
        .ok()
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        .unwrap_or_else(|| {
            BoundaryWarning::UnparsableTimestamp {
                value: timestamp.to_string(),
            }
            .emit();
            DateTime::<Utc>::default()
        });

    CommitSignature { name, email, date }
}

fn uniq_refs(refs: Vec<CommitRef>) -> Vec<CommitRef> {
    let mut uniq: Vec<CommitRef> = Vec::with_capacity(refs.len());
    for r in refs {
        if !uniq.contains(&r) {
            uniq.push(r);
        }
    }
    uniq
}

fn uniq_mentions(mentions: Vec<String>) -> Vec<String> {
    let mut uniq: Vec<String> = Vec::with_capacity(mentions.len());
    for m in mentions {
        if !uniq.contains(&m) {
            uniq.push(m);
        }
    }
    uniq
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockClient;

    fn conventional_options() -> ChangelogOptions {
        ChangelogOptions {
            header_pattern: r"^(\w*)(?:\(([\w\-]*)\))?\:\s(.*)$".to_string(),
            header_pattern_maps: vec!["Type".into(), "Scope".into(), "Subject".into()],
            issue_prefix: vec!["#".into()],
            ref_actions: vec!["closes".into(), "fixes".into()],
            note_keywords: vec!["BREAKING CHANGE".into()],
            ..Default::default()
        }
    }

    fn parser(options: &ChangelogOptions) -> CommitParser {
        CommitParser::new(Arc::new(MockClient::with_output("")), options, "demo").unwrap()
    }

    fn record(subject: &str, body: &str) -> String {
        format!(
            "{SEPARATOR}HASH:0123456789abcdef\t0123456{DELIMITER}AUTHOR:alice\talice@example.com\t1514808000{DELIMITER}COMMITTER:bob\tbob@example.com\t1514808001{DELIMITER}SUBJECT:{subject}{DELIMITER}BODY:{body}"
        )
    }

    #[test]
    fn test_log_format() {
        assert_eq!(
            log_format(),
            "@@__CHGLOG__@@HASH:%H\t%h@@__CHGLOG_DELIMITER__@@AUTHOR:%an\t%ae\t%at@@__CHGLOG_DELIMITER__@@COMMITTER:%cn\t%ce\t%ct@@__CHGLOG_DELIMITER__@@SUBJECT:%s@@__CHGLOG_DELIMITER__@@BODY:%b"
        );
    }

    #[test]
    fn test_header_fields() {
        let commits = parser(&conventional_options()).parse_log(&record("feat(core): add X", ""), None);
        assert_eq!(commits.len(), 1);
        let commit = &commits[0];
        assert_eq!(commit.r#type, "feat");
        assert_eq!(commit.scope, "core");
        assert_eq!(commit.subject, "add X");
        assert_eq!(commit.repo, "demo");
        assert_eq!(commit.hash.short, "0123456");
        assert_eq!(commit.author.name, "alice");
        assert_eq!(commit.committer.date.timestamp(), 1514808001);
        assert!(!commit.is_merge() && !commit.is_revert());
    }

    #[test]
    fn test_unmatched_header_keeps_commit() {
        let commits = parser(&conventional_options()).parse_log(&record("Update README", ""), None);
        assert_eq!(commits[0].header, "Update README");
        assert_eq!(commits[0].r#type, "");
        assert_eq!(commits[0].subject, "");
    }

    #[test]
    fn test_default_patterns_detect_merge_and_revert() {
        let options = ChangelogOptions::default();
        let out = [
            record("Merge branch 'develop'", ""),
            record("Revert \"feat: add X\"", ""),
        ]
        .concat();
        let commits = parser(&options).parse_log(&out, None);

        assert_eq!(commits[0].merge().unwrap().source, "develop");
        assert_eq!(commits[1].revert().unwrap().header, "feat: add X");
        // default header pattern captures everything into Subject
        assert_eq!(commits[0].subject, "Merge branch 'develop'");
    }

    #[test]
    fn test_bad_timestamp_defaults_to_epoch() {
        let signature = parse_signature("alice\talice@example.com\tnot-a-number");
        assert_eq!(signature.name, "alice");
        assert_eq!(signature.date.timestamp(), 0);
    }

    #[test]
    fn test_crlf_body_is_normalized() {
        let commits = parser(&conventional_options())
            .parse_log(&record("fix: x", "line one\r\nline two\rline three"), None);
        assert_eq!(commits[0].body, "line one\nline two\nline three");
    }

    #[test]
    fn test_note_accumulates_until_reference() {
        let body = "Intro\n\nBREAKING CHANGE: first line\nsecond line\n\n  third line  \nCloses #7\nafter";
        let commits = parser(&conventional_options()).parse_log(&record("feat: y", body), None);
        let commit = &commits[0];

        assert_eq!(commit.notes.len(), 1);
        assert_eq!(commit.notes[0].title, "BREAKING CHANGE");
        assert_eq!(commit.notes[0].body, "first line\nsecond line\n\n  third line");
        assert_eq!(commit.refs, vec![CommitRef::new("Closes", "", "7")]);
    }

    #[test]
    fn test_action_refs_with_source_and_issue_prefixes() {
        let options = ChangelogOptions {
            issue_prefix: vec!["#".into(), "gh-".into()],
            ..conventional_options()
        };
        let body = "Closes owner/repo#12\nfixes gh-3";
        let commits = parser(&options).parse_log(&record("fix: tidy", body), None);

        assert_eq!(
            commits[0].refs,
            vec![
                CommitRef::new("Closes", "owner/repo", "12"),
                CommitRef::new("fixes", "", "3"),
            ]
        );
    }

    #[test]
    fn test_fenced_lines_do_not_produce_refs() {
        let body = "~~~\n@inside #1\n```\n~~~\n@outside #2";
        let commits = parser(&conventional_options()).parse_log(&record("docs: z", body), None);
        let commit = &commits[0];

        assert_eq!(commit.mentions, vec!["outside"]);
        assert_eq!(commit.refs, vec![CommitRef::new("", "", "2")]);
    }

    #[test]
    fn test_refs_and_mentions_are_unique() {
        let body = "@alice @bob\n@alice\n#5 #5";
        let commits = parser(&conventional_options()).parse_log(&record("fix: #5 @bob", body), None);
        let commit = &commits[0];
        assert_eq!(commit.mentions, vec!["bob", "alice"]);
        assert_eq!(commit.refs, vec![CommitRef::new("", "", "5")]);
    }

    #[test]
    fn test_without_issue_prefix_no_refs_are_read() {
        let options = ChangelogOptions {
            note_keywords: vec!["NOTE".into()],
            ..Default::default()
        };
        let commits = parser(&options).parse_log(&record("fix 12", "closes 34\nNOTE: keep"), None);
        assert!(commits[0].refs.is_empty());
        assert_eq!(commits[0].notes, vec![CommitNote::new("NOTE", "keep")]);
    }

    struct DropFixes;

    impl Processor for DropFixes {
        fn bootstrap(&mut self, _info: &mut crate::processor::ChangelogInfo) {}

        fn process_commit(&self, mut commit: Commit) -> Option<Commit> {
            if commit.r#type == "fix" {
                return None;
            }
            commit.subject = commit.subject.to_uppercase();
            Some(commit)
        }
    }

    #[test]
    fn test_processor_drops_commits() {
        let out = [
            record("feat: a", ""),
            record("fix: b", ""),
            record("feat: c", ""),
        ]
        .concat();
        let commits = parser(&conventional_options()).parse_log(&out, Some(&DropFixes));
        let subjects: Vec<&str> = commits.iter().map(|c| c.subject.as_str()).collect();
        assert_eq!(subjects, vec!["A", "C"]);
    }

    #[test]
    fn test_parse_invokes_git_log() {
        let client = Arc::new(MockClient::with_output(record("feat: a", "")));
        let options = ChangelogOptions {
            no_merges: true,
            ..conventional_options()
        };
        let parser = CommitParser::new(client.clone(), &options, "demo").unwrap();

        let commits = parser.parse("v1.0.0..v1.1.0", None).unwrap();
        assert_eq!(commits.len(), 1);

        let calls = client.calls();
        assert!(calls[0].starts_with("log --no-merges v1.0.0..v1.1.0 --no-decorate --pretty=@@__CHGLOG__@@"));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let options = ChangelogOptions {
            header_pattern: "(".to_string(),
            ..Default::default()
        };
        let result = CommitParser::new(Arc::new(MockClient::with_output("")), &options, "demo");
        assert!(result.is_err());
    }
}
