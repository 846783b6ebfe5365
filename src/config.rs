//! Optional defaults file at `<config_dir>/study-timer/config.json`.
//!
//! Every field is optional; command-line flags take precedence.

use crate::cue::CueKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    #[serde(with = "humantime_serde")]
    pub work: Option<Duration>,
    #[serde(rename = "break", with = "humantime_serde")]
    pub break_duration: Option<Duration>,
    pub title: Option<String>,
    pub session_type: Option<String>,
    pub cue: Option<CueKind>,
    pub cue_command: Option<String>,
}

pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("study-timer").join("config.json"))
}

/// Load `path`, or the default location when `None`. A missing file yields defaults.
pub fn load(path: Option<&Path>) -> Result<FileConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_path() {
            Some(p) => p,
            None => return Ok(FileConfig::default()),
        },
    };
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let text =
        std::fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load(Some(&dir.path().join("absent.json"))).unwrap();
        assert_eq!(cfg, FileConfig::default());
    }

    #[test]
    fn parses_humantime_durations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"work": "50m", "break": "10m", "session_type": "Reading", "cue": "command", "cue_command": "paplay /tmp/ding.wav"}"#,
        )
        .unwrap();
        let cfg = load(Some(&path)).unwrap();
        assert_eq!(cfg.work, Some(Duration::from_secs(50 * 60)));
        assert_eq!(cfg.break_duration, Some(Duration::from_secs(600)));
        assert_eq!(cfg.session_type.as_deref(), Some("Reading"));
        assert_eq!(cfg.cue, Some(CueKind::Command));
        assert_eq!(cfg.title, None);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ work: ").unwrap();
        let err = load(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("parse"));
    }
}
