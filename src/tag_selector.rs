//! Range queries over a newest-first tag list.
//!
//! | query        | selection                                   |
//! |--------------|---------------------------------------------|
//! | `""`, `".."` | nothing (callers treat it as "all tags")    |
//! | `new`        | that single tag, or nothing                 |
//! | `old..new`   | from `new` down to `old`, both inclusive    |
//! | `..new`      | `new` and every older tag                   |
//! | `old..`      | every tag newer than `old`, and `old`       |
//!
//! Alongside the selection, the name of the tag just older than the last
//! selected one is returned (empty at the end of the list). It bounds the
//! revision range of the oldest selected tag.

use crate::domain::Tag;
use crate::error::{ChangelogError, Result};

/// Select tags by query, returning the selection and its lower boundary
pub fn select(tags: &[Tag], query: &str) -> Result<(Vec<Tag>, String)> {
    let tokens: Vec<&str> = query.split("..").collect();

    match tokens.as_slice() {
        [name] => Ok(select_single(tags, name)),
        ["", ""] => Ok((Vec::new(), String::new())),
        ["", new] => select_before(tags, new),
        [old, ""] => select_after(tags, old),
        [old, new] => select_range(tags, old, new),
        _ => Err(ChangelogError::FailedQueryParse(query.to_string())),
    }
}

fn boundary_after(tags: &[Tag], index: usize) -> String {
    tags.get(index + 1)
        .map(|tag| tag.name.clone())
        .unwrap_or_default()
}

fn select_single(tags: &[Tag], name: &str) -> (Vec<Tag>, String) {
    match tags.iter().position(|tag| tag.name == name) {
        Some(i) => (vec![tags[i].clone()], boundary_after(tags, i)),
        None => (Vec::new(), String::new()),
    }
}

fn select_before(tags: &[Tag], new: &str) -> Result<(Vec<Tag>, String)> {
    let start = tags
        .iter()
        .position(|tag| tag.name == new)
        .ok_or_else(|| ChangelogError::NotFoundTag(format!("new: {:?}", new)))?;

    Ok((tags[start..].to_vec(), String::new()))
}

fn select_after(tags: &[Tag], old: &str) -> Result<(Vec<Tag>, String)> {
    let end = tags
        .iter()
        .position(|tag| tag.name == old)
        .ok_or_else(|| ChangelogError::NotFoundTag(format!("old: {:?}", old)))?;

    Ok((tags[..=end].to_vec(), boundary_after(tags, end)))
}

fn select_range(tags: &[Tag], old: &str, new: &str) -> Result<(Vec<Tag>, String)> {
    let mut selected = Vec::new();
    let mut from = String::new();
    let mut enabled = false;

    for (i, tag) in tags.iter().enumerate() {
        if tag.name == new {
            enabled = true;
        }

        if enabled {
            selected.push(tag.clone());
            from = boundary_after(tags, i);
        }

        if tag.name == old {
            enabled = false;
        }
    }

    if selected.is_empty() {
        return Err(ChangelogError::NotFoundTag(format!(
            "old: {:?}, new: {:?}",
            old, new
        )));
    }

    Ok((selected, from))
}
