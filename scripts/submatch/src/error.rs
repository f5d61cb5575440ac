//! Error types for the matcher.

use thiserror::Error;

/// Errors raised by [`crate::matcher::match_paths`].
///
/// Both variants point at a programming error on the caller side. A subtitle
/// without a match is not an error and never shows up here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("invalid input: empty path in {list} list at index {index}")]
    InvalidInput { list: &'static str, index: usize },

    #[error("invalid option: {0}")]
    InvalidOption(String),
}
