use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

fn key_line(key: &str, pad: usize, what: &str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key.to_string(), Style::default().fg(Color::Magenta)),
        Span::raw(format!("{}{}", " ".repeat(pad.saturating_sub(key.chars().count())), what)),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    const PAD: usize = 12;
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        key_line("q / Ctrl-C", PAD, "Quit"),
        key_line("tab", PAD, "Switch tabs"),
        key_line("?", PAD, "Show this help"),
        Line::from(""),
        Line::from("Before a session:"),
        key_line("s", PAD, "Start recording"),
        key_line("p", PAD, "Toggle Pomodoro mode"),
        key_line("w / W", PAD, "Work length +1 / -1 min"),
        key_line("b / B", PAD, "Break length +1 / -1 min"),
        key_line("t", PAD, "Edit subject"),
        key_line("y", PAD, "Edit session type"),
        key_line("l", PAD, "Edit plan"),
        Line::from(""),
        Line::from("While recording:"),
        key_line("x", PAD, "Stop"),
        key_line("d", PAD, "Discard"),
        Line::from(""),
        Line::from("After stopping:"),
        key_line("enter", PAD, "Save"),
        key_line("+ / -", PAD, "Focus score"),
        key_line("←/→", PAD, "Pick distraction"),
        key_line("space", PAD, "Toggle distraction"),
        key_line("f", PAD, "Edit reflection"),
        key_line("a", PAD, "Toggle auto-save"),
        key_line("d", PAD, "Discard"),
        Line::from(""),
        Line::from("History tab:"),
        key_line("↑/↓ or j/k", PAD, "Navigate"),
        key_line("e", PAD, "Export selected as JSON"),
        key_line("c", PAD, "Export selected as CSV"),
        key_line("D", PAD, "Delete selected"),
        key_line("r", PAD, "Refresh history"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}
