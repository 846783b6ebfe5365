use crate::model::SessionRecord;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Default export file name: timestamp plus the first eight characters of the id.
pub fn default_export_name(r: &SessionRecord, ext: &str) -> String {
    format!(
        "study-session-{}-{}.{}",
        r.timestamp_utc.replace(':', "-").replace('T', "_"),
        r.session_id.chars().take(8).collect::<String>(),
        ext
    )
}

/// Export JSON into the current directory.
/// Returns the absolute path of the exported file.
pub fn export_result_json(r: &SessionRecord) -> Result<PathBuf> {
    let current_dir = std::env::current_dir().context("get current directory")?;
    let path = current_dir.join(default_export_name(r, "json"));
    crate::storage::export_json(&path, r)?;
    Ok(path)
}

/// Export CSV into the current directory.
/// Returns the absolute path of the exported file.
pub fn export_result_csv(r: &SessionRecord) -> Result<PathBuf> {
    let current_dir = std::env::current_dir().context("get current directory")?;
    let path = current_dir.join(default_export_name(r, "csv"));
    crate::storage::export_csv(&path, r)?;
    Ok(path)
}
