//! Local session history and exports.
//!
//! Each saved session is one pretty-printed JSON file under
//! `<data_dir>/study-timer/sessions/`, named so that lexical order is
//! chronological order.

use crate::model::SessionRecord;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const CSV_HEADER: &str = "session_id,timestamp_utc,title,session_type,started_at_utc,ended_at_utc,duration_seconds,is_pomodoro,work_seconds,break_seconds,segments_completed,focus_score,distractions,plan,reflection";

pub fn sessions_dir() -> Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(dirs::home_dir)
        .context("could not determine a data directory")?;
    Ok(base.join("study-timer").join("sessions"))
}

fn file_name_for(record: &SessionRecord) -> String {
    format!(
        "{}-{}.json",
        record.timestamp_utc.replace(':', "-"),
        record.session_id
    )
}

pub fn save_session(record: &SessionRecord) -> Result<PathBuf> {
    save_session_in(&sessions_dir()?, record)
}

pub fn save_session_in(dir: &Path, record: &SessionRecord) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(file_name_for(record));
    let json = serde_json::to_string_pretty(record)?;
    fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

/// Newest first, at most `limit` records. Unreadable files are skipped.
pub fn load_recent(limit: usize) -> Result<Vec<SessionRecord>> {
    load_recent_in(&sessions_dir()?, limit)
}

pub fn load_recent_in(dir: &Path, limit: usize) -> Result<Vec<SessionRecord>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("read {}", dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();
    paths.reverse();

    let mut out = Vec::new();
    for p in paths {
        if out.len() >= limit {
            break;
        }
        let Ok(text) = fs::read_to_string(&p) else {
            continue;
        };
        match serde_json::from_str::<SessionRecord>(&text) {
            Ok(r) => out.push(r),
            Err(e) => tracing::debug!(path = %p.display(), error = %e, "skipping unreadable session file"),
        }
    }
    Ok(out)
}

pub fn delete_session(record: &SessionRecord) -> Result<()> {
    delete_session_in(&sessions_dir()?, record)
}

pub fn delete_session_in(dir: &Path, record: &SessionRecord) -> Result<()> {
    let path = dir.join(file_name_for(record));
    fs::remove_file(&path).with_context(|| format!("delete {}", path.display()))
}

pub fn export_json(path: &Path, record: &SessionRecord) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(record)?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))
}

pub fn export_csv(path: &Path, record: &SessionRecord) -> Result<()> {
    ensure_parent(path)?;
    let body = format!("{CSV_HEADER}\n{}\n", csv_row(record));
    fs::write(path, body).with_context(|| format!("write {}", path.display()))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    Ok(())
}

fn csv_row(r: &SessionRecord) -> String {
    let opt = |v: Option<u64>| v.map(|n| n.to_string()).unwrap_or_default();
    [
        csv_escape(&r.session_id),
        csv_escape(&r.timestamp_utc),
        csv_escape(&r.title),
        csv_escape(&r.session_type),
        csv_escape(&r.started_at_utc),
        csv_escape(&r.ended_at_utc),
        r.duration_seconds.to_string(),
        r.is_pomodoro.to_string(),
        opt(r.work_seconds),
        opt(r.break_seconds),
        r.segments_completed.to_string(),
        r.focus_score.to_string(),
        csv_escape(&r.distractions.join("; ")),
        csv_escape(r.plan.as_deref().unwrap_or("")),
        csv_escape(r.reflection.as_deref().unwrap_or("")),
    ]
    .join(",")
}

fn csv_escape(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
