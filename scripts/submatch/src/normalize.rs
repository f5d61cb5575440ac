//! Base-name extraction and token normalization.
//!
//! The transformation is total: lowercase (after NFKC folding), replace
//! every character that is not a letter, combining mark, digit or
//! whitespace by a space, collapse whitespace, split into tokens and drop
//! short ones.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{M}\p{N}\s]+").unwrap());

/// A path as supplied by the caller plus its extension-stripped base name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathEntry {
    pub path: String,
    pub base_name: String,
}

impl PathEntry {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let base_name = base_name(&path).to_string();
        Self { path, base_name }
    }
}

/// Normalized form of a base name and its scoring tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    /// Full normalized string, short tokens included. Substring checks run on this.
    pub text: String,
    /// Unique tokens longer than the minimum length, in first-seen order.
    pub tokens: Vec<String>,
}

impl NormalizedName {
    pub fn from_base_name(base: &str, min_token_length: usize) -> Self {
        let text = normalize_text(base);
        let mut tokens: Vec<String> = Vec::new();
        for tok in text.split(' ') {
            if tok.chars().count() <= min_token_length {
                continue;
            }
            if !tokens.iter().any(|t| t == tok) {
                tokens.push(tok.to_string());
            }
        }
        Self { text, tokens }
    }
}

/// Last path component with its final extension removed.
///
/// Accepts `/` and `\` as separators so Windows listings work on any host.
/// A leading dot is part of the name, not an extension.
pub fn base_name(path: &str) -> &str {
    let file = path
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(path);
    match file.rfind('.') {
        Some(idx) if idx > 0 => &file[..idx],
        _ => file,
    }
}

/// Lowercase, punctuation to spaces, single-spaced, trimmed.
pub fn normalize_text(s: &str) -> String {
    let folded: String = s.nfkc().collect::<String>().to_lowercase();
    let spaced = NON_WORD_RE.replace_all(&folded, " ");
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Length used for scoring, in characters.
pub fn token_len(token: &str) -> usize {
    token.chars().count()
}
