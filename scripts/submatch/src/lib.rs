//! Pairs subtitle files with video files by normalized-token overlap.
//!
//! [`matcher::match_paths`] is a pure function over path strings; [`scan`]
//! and [`report`] are the caller-side enumeration and output stages.

pub mod config;
pub mod error;
pub mod matcher;
pub mod normalize;
pub mod report;
pub mod scan;

pub use error::MatchError;
pub use matcher::{match_paths, AssignMode, MatchCandidate, MatchOptions, MatchReport};
pub use normalize::{NormalizedName, PathEntry};
