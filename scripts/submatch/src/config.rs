//! JSON configuration (`submatch.json`). Every key is optional.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::matcher::{AssignMode, MatchOptions, DEFAULT_MIN_TOKEN_LENGTH, DEFAULT_THRESHOLD};

pub const DEFAULT_CONFIG_FILE: &str = "submatch.json";

pub const DEFAULT_SUBTITLE_EXTENSIONS: &[&str] = &[
    ".srt", ".ass", ".ssa", ".vtt", ".sub", ".sup", ".idx", ".smi", ".lrc",
];

pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &[
    ".mp4", ".avi", ".mkv", ".wmv", ".mov", ".flv", ".webm", ".m4v", ".ts", ".mts", ".mpeg",
    ".mpg", ".m2ts",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub subtitle_extensions: Vec<String>,
    pub video_extensions: Vec<String>,
    /// Directory keywords to skip (case-insensitive substring of the path).
    pub blacklist: Vec<String>,
    pub threshold: u32,
    pub min_token_length: usize,
    pub mode: AssignMode,
    pub recursive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            subtitle_extensions: to_owned(DEFAULT_SUBTITLE_EXTENSIONS),
            video_extensions: to_owned(DEFAULT_VIDEO_EXTENSIONS),
            blacklist: Vec::new(),
            threshold: DEFAULT_THRESHOLD,
            min_token_length: DEFAULT_MIN_TOKEN_LENGTH,
            mode: AssignMode::Shared,
            recursive: false,
        }
    }
}

fn to_owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Config {
    /// Reads `path`, which must exist.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("Read config {:?}", path))?;
        let cfg: Config =
            serde_json::from_str(&text).with_context(|| format!("Parse config {:?}", path))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Like [`Config::load`], but a missing file means defaults. Used for the
    /// implicit `submatch.json`, not for a path the user named.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_token_length == 0 {
            return Err(anyhow!("min_token_length must be at least 1"));
        }
        Ok(())
    }

    pub fn match_options(&self, parallel: bool) -> MatchOptions {
        MatchOptions {
            threshold: self.threshold,
            min_token_length: self.min_token_length,
            mode: self.mode,
            parallel,
        }
    }
}

/// Lowercase, leading-dot form used for extension comparisons.
pub fn normalize_ext(ext: &str) -> String {
    format!(".{}", ext.trim().trim_start_matches('.').to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_or_default(&dir.path().join("nope.json")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.threshold, 5);
        assert_eq!(cfg.min_token_length, 2);
    }

    #[test]
    fn named_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(format!("{err:#}").contains("Read config"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submatch.json");
        let mut f = fs::File::create(&path).unwrap();
        write!(f, r#"{{"threshold": 8, "mode": "exclusive", "blacklist": ["Trash"]}}"#).unwrap();
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.threshold, 8);
        assert_eq!(cfg.mode, AssignMode::Exclusive);
        assert_eq!(cfg.blacklist, vec!["Trash".to_string()]);
        assert_eq!(cfg.video_extensions, Config::default().video_extensions);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submatch.json");
        fs::write(&path, "{ not json").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Parse config"));
    }

    #[test]
    fn zero_min_token_length_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submatch.json");
        fs::write(&path, r#"{"min_token_length": 0}"#).unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn extension_forms_are_normalized() {
        assert_eq!(normalize_ext("SRT"), ".srt");
        assert_eq!(normalize_ext(".Mkv"), ".mkv");
    }
}
