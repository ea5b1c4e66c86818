// tests/tag_selector_test.rs
use chrono::{TimeZone, Utc};
use changelog_gen::domain::Tag;
use changelog_gen::tag_selector::select;
use changelog_gen::ChangelogError;

fn fixtures() -> Vec<Tag> {
    ["2.2.12-rc.12", "2.1.0", "v2.0.0-beta.1", "v1.2.9", "v1.0.0"]
        .iter()
        .enumerate()
        .map(|(i, name)| Tag::new(*name, "", Utc.timestamp_opt(100 - i as i64, 0).unwrap()))
        .collect()
}

fn run(query: &str) -> (Vec<String>, String) {
    let (selected, from) = select(&fixtures(), query).unwrap();
    (selected.into_iter().map(|t| t.name).collect(), from)
}

#[test]
fn test_select_table() {
    let table: Vec<(&str, Vec<&str>, &str)> = vec![
        // single
        ("2.2.12-rc.12", vec!["2.2.12-rc.12"], "2.1.0"),
        ("v2.0.0-beta.1", vec!["v2.0.0-beta.1"], "v1.2.9"),
        ("v1.0.0", vec!["v1.0.0"], ""),
        // ..<tag>
        (
            "..2.1.0",
            vec!["2.1.0", "v2.0.0-beta.1", "v1.2.9", "v1.0.0"],
            "",
        ),
        ("..v1.0.0", vec!["v1.0.0"], ""),
        // <tag>..
        (
            "v2.0.0-beta.1..",
            vec!["2.2.12-rc.12", "2.1.0", "v2.0.0-beta.1"],
            "v1.2.9",
        ),
        ("2.2.12-rc.12..", vec!["2.2.12-rc.12"], "2.1.0"),
        (
            "v1.0.0..",
            vec!["2.2.12-rc.12", "2.1.0", "v2.0.0-beta.1", "v1.2.9", "v1.0.0"],
            "",
        ),
        // <tag>..<tag>
        (
            "v1.0.0..2.2.12-rc.12",
            vec!["2.2.12-rc.12", "2.1.0", "v2.0.0-beta.1", "v1.2.9", "v1.0.0"],
            "",
        ),
        (
            "v1.0.0..v2.0.0-beta.1",
            vec!["v2.0.0-beta.1", "v1.2.9", "v1.0.0"],
            "",
        ),
        (
            "v1.2.9..2.1.0",
            vec!["2.1.0", "v2.0.0-beta.1", "v1.2.9"],
            "v1.0.0",
        ),
    ];

    for (query, expected, expected_from) in table {
        let (names, from) = run(query);
        assert_eq!(names, expected, "query {:?}", query);
        assert_eq!(from, expected_from, "boundary of query {:?}", query);
    }
}

#[test]
fn test_selection_is_never_out_of_range() {
    let tags = fixtures();
    let names: Vec<String> = tags.iter().map(|t| t.name.clone()).collect();

    for old in &names {
        for new in &names {
            let query = format!("{}..{}", old, new);
            match select(&tags, &query) {
                Ok((selected, from)) => {
                    assert!(!selected.is_empty(), "query {:?}", query);
                    assert!(from.is_empty() || names.contains(&from));
                }
                Err(err) => assert!(matches!(err, ChangelogError::NotFoundTag(_))),
            }
        }
    }
}

#[test]
fn test_unknown_range_bound_is_reported() {
    let err = select(&fixtures(), "v0.1.0..v0.2.0").unwrap_err();
    assert_eq!(
        err.to_string(),
        "could not find the tag: old: \"v0.1.0\", new: \"v0.2.0\""
    );
}
