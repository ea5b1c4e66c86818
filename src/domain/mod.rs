//! Domain model - tags, commits, versions and aggregated release data

pub mod branch;
pub mod commit;
pub mod release;
pub mod tag;
pub mod version;

pub use branch::ReleaseBranch;
pub use commit::{
    Commit, CommitHash, CommitKind, CommitMerge, CommitNote, CommitRef, CommitRevert,
    CommitSignature,
};
pub use release::{
    GlobalRenderData, GlobalResult, GlobalVersionRenderData, ReleaseRenderData, ReleaseResult,
    RepoResult, RepoVersionRenderData,
};
pub use tag::{assign_previous_and_next, RelateTag, Tag};
pub use version::{CommitGroup, CommitNoteGroup, Extraction, Unreleased, Version};
