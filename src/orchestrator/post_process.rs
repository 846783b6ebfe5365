//! Post-save processing utilities.
//!
//! Handles auto-save, exports, and history refresh after a session is confirmed.

use crate::model::SessionRecord;
use crate::storage;
use std::path::Path;

/// Result of post-save processing, ready for presentation layers.
pub(crate) struct ProcessedSession {
    pub messages: Vec<String>,
    pub history: Vec<SessionRecord>,
}

/// Persist a confirmed session, run any requested exports, and reload history.
pub(crate) fn process_saved_session(
    record: &SessionRecord,
    auto_save: bool,
    export_json: Option<&Path>,
    export_csv: Option<&Path>,
    history_load: usize,
) -> ProcessedSession {
    let mut messages = Vec::new();

    if auto_save {
        match storage::save_session(record) {
            Ok(p) => {
                tracing::info!(path = %p.display(), "session saved");
                messages.push(format!("Saved: {}", p.display()));
            }
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "session save failed");
                messages.push(format!("Save failed: {e:#}"));
            }
        }
    }

    if let Some(export_path) = export_json {
        match storage::export_json(export_path, record) {
            Ok(_) => messages.push(format!("Exported JSON: {}", export_path.display())),
            Err(e) => messages.push(format!("Export JSON failed: {e:#}")),
        }
    }
    if let Some(export_path) = export_csv {
        match storage::export_csv(export_path, record) {
            Ok(_) => messages.push(format!("Exported CSV: {}", export_path.display())),
            Err(e) => messages.push(format!("Export CSV failed: {e:#}")),
        }
    }

    let history = storage::load_recent(history_load).unwrap_or_default();

    ProcessedSession { messages, history }
}
