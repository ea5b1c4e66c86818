//! Changelog generation from git history.
//!
//! Tags are read and selected by query, commits between them parsed and
//! grouped, and release branches aggregated across repositories into data
//! ready for a template renderer.

pub mod boundary;
pub mod commit_extractor;
pub mod commit_parser;
pub mod config;
pub mod domain;
pub mod error;
pub mod field;
pub mod generator;
pub mod git;
pub mod global;
pub mod output;
pub mod processor;
pub mod tag_reader;
pub mod tag_selector;
pub mod ui;

pub use error::{ChangelogError, Result};
