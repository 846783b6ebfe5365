use crate::model::SessionRecord;

/// Compute (mean, median, 25th percentile, 75th percentile) from samples
pub fn compute_metrics(samples: &[f64]) -> Option<(f64, f64, f64, f64)> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    let mean = samples.iter().sum::<f64>() / n as f64;
    let median = sorted[n / 2];
    let p25 = sorted[n / 4];
    let p75 = sorted[3 * n / 4];
    Some((mean, median, p25, p75))
}

/// Aggregate view over saved sessions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistorySummary {
    pub sessions: usize,
    pub total_seconds: u64,
    pub pomodoro_sessions: usize,
    pub mean_seconds: Option<f64>,
    pub median_seconds: Option<f64>,
    pub mean_focus: Option<f64>,
}

pub fn summarize_history(history: &[SessionRecord]) -> HistorySummary {
    let durations: Vec<f64> = history.iter().map(|r| r.duration_seconds as f64).collect();
    let focus: Vec<f64> = history.iter().map(|r| r.focus_score as f64).collect();
    let metrics = compute_metrics(&durations);
    HistorySummary {
        sessions: history.len(),
        total_seconds: history.iter().map(|r| r.duration_seconds).sum(),
        pomodoro_sessions: history.iter().filter(|r| r.is_pomodoro).count(),
        mean_seconds: metrics.map(|m| m.0),
        median_seconds: metrics.map(|m| m.1),
        mean_focus: compute_metrics(&focus).map(|m| m.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(secs: u64, pomodoro: bool, focus: u8) -> SessionRecord {
        SessionRecord {
            session_id: "x".into(),
            timestamp_utc: String::new(),
            title: "Physics".into(),
            session_type: "Quiz".into(),
            plan: None,
            reflection: None,
            focus_score: focus,
            distractions: Vec::new(),
            started_at_utc: String::new(),
            ended_at_utc: String::new(),
            duration_seconds: secs,
            is_pomodoro: pomodoro,
            work_seconds: None,
            break_seconds: None,
            segments_completed: 0,
        }
    }

    #[test]
    fn empty_history_has_no_averages() {
        let s = summarize_history(&[]);
        assert_eq!(s.sessions, 0);
        assert_eq!(s.mean_seconds, None);
        assert_eq!(compute_metrics(&[]), None);
    }

    #[test]
    fn summary_totals() {
        let s = summarize_history(&[rec(60, true, 4), rec(120, false, 6), rec(300, true, 8)]);
        assert_eq!(s.sessions, 3);
        assert_eq!(s.total_seconds, 480);
        assert_eq!(s.pomodoro_sessions, 2);
        assert_eq!(s.mean_seconds, Some(160.0));
        assert_eq!(s.median_seconds, Some(120.0));
        assert_eq!(s.mean_focus, Some(6.0));
    }
}
