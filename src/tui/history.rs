use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::state::UiState;
use crate::format::format_duration;
use crate::metrics;
use crate::model::SessionRecord;

/// Rows available for history entries inside a bordered list of `height`.
pub fn visible_rows(height: u16) -> usize {
    height.saturating_sub(2) as usize
}

fn history_line(r: &SessionRecord, selected: bool) -> Line<'static> {
    // "2026-01-02T10:00:00Z" -> "2026-01-02 10:00"
    let when: String = r.started_at_utc.replace('T', " ").chars().take(16).collect();
    let style = if selected {
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let mut spans = vec![
        Span::styled(format!("{when:<17}"), style.fg(Color::Gray)),
        Span::styled(format!("{:>10}  ", format_duration(r.duration_seconds)), style),
        Span::styled(format!("{} ({})", r.title, r.session_type), style),
        Span::styled(format!("  focus {}/10", r.focus_score), style.fg(Color::Cyan)),
    ];
    if r.is_pomodoro {
        spans.push(Span::styled("  pomodoro", style.fg(Color::LightRed)));
    }
    Line::from(spans)
}

pub fn draw_history(area: Rect, f: &mut Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(3)].as_ref())
        .split(area);

    let summary = metrics::summarize_history(&state.history);
    let avg = summary
        .mean_seconds
        .map(|m| format_duration(m.round() as u64))
        .unwrap_or_else(|| "-".into());
    let focus = summary
        .mean_focus
        .map(|m| format!("{m:.1}"))
        .unwrap_or_else(|| "-".into());
    let header = Paragraph::new(vec![
        Line::from(format!(
            "{} session(s), {} total, {} Pomodoro",
            summary.sessions,
            format_duration(summary.total_seconds),
            summary.pomodoro_sessions
        )),
        Line::from(format!("Average length {avg}, average focus {focus}")),
    ])
    .block(Block::default().borders(Borders::ALL).title("Summary"));
    f.render_widget(header, chunks[0]);

    let rows = visible_rows(chunks[1].height);
    let lines: Vec<Line> = if state.history.is_empty() {
        vec![Line::from("No saved sessions yet.")]
    } else {
        state
            .history
            .iter()
            .enumerate()
            .skip(state.history_scroll_offset)
            .take(rows)
            .map(|(i, r)| history_line(r, i == state.history_selected))
            .collect()
    };
    let list = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("History ({})", state.history.len())),
    );
    f.render_widget(list, chunks[1]);
}
