//! Text summary builder for CLI output.
//!
//! Formats the saved session and a history roll-up as human-readable lines.

use crate::format::{format_duration, format_minutes};
use crate::metrics;
use crate::model::SessionRecord;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary for `record`; `history` should already include it if it was saved.
pub(crate) fn build_text_summary(record: &SessionRecord, history: &[SessionRecord]) -> TextSummary {
    let mut lines = Vec::new();

    lines.push(format!("Subject: {} ({})", record.title, record.session_type));
    lines.push(format!(
        "Duration: {} ({} min)",
        format_duration(record.duration_seconds),
        format_minutes(record.duration_seconds)
    ));
    if record.is_pomodoro {
        lines.push(format!(
            "Pomodoro: {} work / {} break, {} segment change(s)",
            format_duration(record.work_seconds.unwrap_or_default()),
            format_duration(record.break_seconds.unwrap_or_default()),
            record.segments_completed
        ));
    }
    if let Some(plan) = record.plan.as_deref() {
        lines.push(format!("Plan: {plan}"));
    }
    lines.push(format!("Focus: {}/10", record.focus_score));
    if !record.distractions.is_empty() {
        lines.push(format!("Distractions: {}", record.distractions.join(", ")));
    }
    if let Some(reflection) = record.reflection.as_deref() {
        lines.push(format!("Reflection: {reflection}"));
    }

    let summary = metrics::summarize_history(history);
    if summary.sessions > 0 {
        lines.push(format!(
            "History: {} session(s), {} total, {} Pomodoro",
            summary.sessions,
            format_duration(summary.total_seconds),
            summary.pomodoro_sessions
        ));
        if let (Some(mean), Some(median)) = (summary.mean_seconds, summary.median_seconds) {
            lines.push(format!(
                "Session length: avg {} med {}",
                format_duration(mean.round() as u64),
                format_duration(median.round() as u64)
            ));
        }
    }

    TextSummary { lines }
}
