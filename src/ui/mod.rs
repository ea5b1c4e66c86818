//! Terminal output for the CLI.
//!
//! Everything here writes to stderr; stdout carries the rendered data only.

pub mod formatter;

pub use formatter::{
    display_config_path, display_error, display_release_summary, display_status, display_success,
};
