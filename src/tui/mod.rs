mod clock;
mod export;
mod help;
mod history;
mod state;

use crate::cli::{Cli, HISTORY_LOAD};
use crate::cue::CuePlayer;
use crate::format::{format_clock, format_duration};
use crate::model::{
    InfoEvent, SessionConfig, Stage, TimerEvent, PREDEFINED_DISTRACTIONS,
};
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Terminal,
};
use state::{step_minutes, EditField, UiState};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli, cfg: SessionConfig, cue: Arc<dyn CuePlayer>) -> Result<()> {
    // Unbounded channels avoid backpressure between the UI thread and the controller.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<TimerEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_args = args.clone();
    let ui_cfg = cfg.clone();
    let ui_handle =
        std::thread::spawn(move || run_threaded(ui_args, ui_cfg, event_rx, cmd_tx));

    let res = orchestrator::run_controller(&cfg, cue, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    args: Cli,
    cfg: SessionConfig,
    mut event_rx: UnboundedReceiver<TimerEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState {
        details: cfg.details.clone(),
        pomodoro: cfg.pomodoro,
        start_as_pomodoro: cfg.pomodoro_by_default,
        auto_save: args.auto_save,
        export_json: args.export_json.clone(),
        export_csv: args.export_csv.clone(),
        ..Default::default()
    };
    state.set_history(crate::storage::load_recent(HISTORY_LOAD).unwrap_or_default());
    state.info = "Press s to start, p for Pomodoro, ? for help".into();

    let tick_rate = Duration::from_millis(100);
    let mut last_draw = Instant::now() - tick_rate;
    let mut history_rows = 20;

    let res = loop {
        // Drain events without blocking to keep the UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            apply_event(&mut state, ev);
        }

        if last_draw.elapsed() >= tick_rate {
            terminal
                .draw(|f| {
                    history_rows = draw(f.area(), f, &state);
                })
                .ok();
            last_draw = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if !event::poll(Duration::from_millis(10)).unwrap_or(false) {
            continue;
        }
        let Ok(Event::Key(k)) = event::read() else {
            continue;
        };
        if k.kind != KeyEventKind::Press {
            continue;
        }
        // Force a redraw after any key.
        last_draw = Instant::now() - tick_rate;

        if state.editing.is_some() {
            handle_edit_key(&mut state, &cmd_tx, k.code);
            continue;
        }

        match (k.modifiers, k.code) {
            (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                if state.stage == Stage::Idle || state.quit_armed {
                    let _ = cmd_tx.send(UiCommand::Quit);
                    break Ok(());
                }
                state.quit_armed = true;
                state.info = "Session not saved. Press q again to quit and lose it.".into();
                continue;
            }
            (_, KeyCode::Char('?')) => state.show_help = !state.show_help,
            (_, KeyCode::Esc) => state.show_help = false,
            (_, KeyCode::Tab) => state.tab = (state.tab + 1) % 2,
            (_, KeyCode::BackTab) => state.tab = (state.tab + 1) % 2,
            _ if state.tab == 1 => handle_history_key(&mut state, k.code, history_rows),
            _ => handle_session_key(&mut state, &cmd_tx, k.code),
        }
        state.quit_armed = false;
    };

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();
    res
}

fn handle_edit_key(state: &mut UiState, cmd_tx: &UnboundedSender<UiCommand>, code: KeyCode) {
    match code {
        KeyCode::Enter => {
            if let Some(field) = state.commit_edit() {
                if field != EditField::Reflection {
                    let _ = cmd_tx.send(UiCommand::SetDetails(state.details.clone()));
                }
            }
        }
        KeyCode::Esc => state.cancel_edit(),
        KeyCode::Backspace => {
            state.input.pop();
        }
        KeyCode::Char(c) => state.input.push(c),
        _ => {}
    }
}

fn handle_session_key(state: &mut UiState, cmd_tx: &UnboundedSender<UiCommand>, code: KeyCode) {
    match state.stage {
        Stage::Idle => match code {
            KeyCode::Char('s') => {
                let _ = cmd_tx.send(UiCommand::Start {
                    pomodoro: state.start_as_pomodoro,
                });
            }
            KeyCode::Char('p') => {
                state.start_as_pomodoro = !state.start_as_pomodoro;
                state.info = if state.start_as_pomodoro {
                    "Next session: Pomodoro".into()
                } else {
                    "Next session: plain timer".into()
                };
            }
            KeyCode::Char(c @ ('w' | 'W' | 'b' | 'B')) => {
                let delta = if c.is_lowercase() { 1 } else { -1 };
                let (mut work, mut brk) =
                    (state.pomodoro.work_seconds(), state.pomodoro.break_seconds());
                if c.eq_ignore_ascii_case(&'w') {
                    work = step_minutes(work, delta);
                } else {
                    brk = step_minutes(brk, delta);
                }
                let _ = cmd_tx.send(UiCommand::ConfigurePomodoro {
                    work_seconds: work,
                    break_seconds: brk,
                });
            }
            KeyCode::Char('t') => state.begin_edit(EditField::Title),
            KeyCode::Char('y') => state.begin_edit(EditField::SessionType),
            KeyCode::Char('l') => state.begin_edit(EditField::Plan),
            _ => {}
        },
        Stage::Recording => match code {
            KeyCode::Char('x') => {
                let _ = cmd_tx.send(UiCommand::Stop);
            }
            KeyCode::Char('d') => {
                let _ = cmd_tx.send(UiCommand::Discard);
            }
            _ => {}
        },
        Stage::Confirming => match code {
            KeyCode::Enter => {
                let _ = cmd_tx.send(UiCommand::Save(state.reflection.clone()));
            }
            KeyCode::Char('d') => {
                let _ = cmd_tx.send(UiCommand::Discard);
            }
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Up => state.adjust_focus(1),
            KeyCode::Char('-') | KeyCode::Down => state.adjust_focus(-1),
            KeyCode::Left => state.move_distraction_cursor(-1),
            KeyCode::Right => state.move_distraction_cursor(1),
            KeyCode::Char(' ') => state.toggle_selected_distraction(),
            KeyCode::Char('f') => state.begin_edit(EditField::Reflection),
            KeyCode::Char('a') => {
                state.auto_save = !state.auto_save;
                state.info = format!("Auto-save {}", if state.auto_save { "on" } else { "off" });
            }
            _ => {}
        },
    }
}

fn handle_history_key(state: &mut UiState, code: KeyCode, rows: usize) {
    match code {
        KeyCode::Up | KeyCode::Char('k') => state.select_history(-1, rows),
        KeyCode::Down | KeyCode::Char('j') => state.select_history(1, rows),
        KeyCode::PageUp => state.select_history(-(rows as isize), rows),
        KeyCode::PageDown => state.select_history(rows as isize, rows),
        KeyCode::Char('r') => match crate::storage::load_recent(HISTORY_LOAD) {
            Ok(h) => {
                let old = state.history.len();
                state.set_history(h);
                state.info = match state.history.len().cmp(&old) {
                    std::cmp::Ordering::Greater => {
                        format!("Refreshed: {} new session(s)", state.history.len() - old)
                    }
                    std::cmp::Ordering::Less => {
                        format!("Refreshed: {} session(s) removed", old - state.history.len())
                    }
                    std::cmp::Ordering::Equal => "Refreshed".into(),
                };
            }
            Err(e) => state.info = format!("Refresh failed: {e:#}"),
        },
        KeyCode::Char('e') => {
            if let Some(r) = state.selected_history() {
                state.info = match export::export_result_json(r) {
                    Ok(p) => format!("Exported JSON: {}", p.display()),
                    Err(e) => format!("Export failed: {e:#}"),
                };
            }
        }
        KeyCode::Char('c') => {
            if let Some(r) = state.selected_history() {
                state.info = match export::export_result_csv(r) {
                    Ok(p) => format!("Exported CSV: {}", p.display()),
                    Err(e) => format!("Export failed: {e:#}"),
                };
            }
        }
        KeyCode::Char('D') | KeyCode::Delete => {
            if let Some(r) = state.selected_history().cloned() {
                match crate::storage::delete_session(&r) {
                    Ok(()) => {
                        let mut h = state.history.clone();
                        h.retain(|x| x.session_id != r.session_id);
                        state.set_history(h);
                        state.info = format!("Deleted {} ({})", r.title, format_duration(r.duration_seconds));
                    }
                    Err(e) => state.info = format!("Delete failed: {e:#}"),
                }
            }
        }
        _ => {}
    }
}

fn apply_event(state: &mut UiState, ev: TimerEvent) {
    match ev {
        TimerEvent::StageChanged { stage } => state.stage = stage,
        TimerEvent::SessionStarted { details, pomodoro } => {
            state.details = details;
            state.info = match pomodoro {
                Some(_) => "Pomodoro started. x to stop, d to discard".into(),
                None => "Recording. x to stop, d to discard".into(),
            };
        }
        TimerEvent::Tick(s) => state.snapshot = s,
        TimerEvent::SegmentBoundary { entered, .. } => {
            state.info = format!("{} time!", entered.label());
        }
        TimerEvent::SessionStopped { draft } => {
            state.info = format!(
                "Stopped at {}. Enter to save, d to discard",
                format_duration(draft.duration_seconds)
            );
            state.draft = Some(*draft);
        }
        TimerEvent::SessionSaved { record } => {
            let processed = orchestrator::process_saved_session(
                &record,
                state.auto_save,
                state.export_json.as_deref(),
                state.export_csv.as_deref(),
                HISTORY_LOAD,
            );
            state.set_history(processed.history);
            state.info = if processed.messages.is_empty() {
                format!("Session recorded ({}), not saved to disk", format_duration(record.duration_seconds))
            } else {
                processed.messages.join(" | ")
            };
            state.clear_session();
        }
        TimerEvent::SessionDiscarded => {
            state.info = "Session discarded".into();
            state.clear_session();
        }
        TimerEvent::Info(InfoEvent::PomodoroConfigured {
            work_seconds,
            break_seconds,
        }) => {
            if let Ok(p) = crate::timer::PomodoroConfig::new(work_seconds, break_seconds) {
                state.pomodoro = p;
            }
            state.info = InfoEvent::PomodoroConfigured {
                work_seconds,
                break_seconds,
            }
            .to_message();
        }
        TimerEvent::Info(info) => state.info = info.to_message(),
    }
}

/// Draw the frame; returns the number of history rows visible for paging.
fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) -> usize {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);

    let tabs = Tabs::new(vec!["Session", "History"])
        .select(state.tab)
        .block(Block::default().borders(Borders::ALL).title("study-timer"))
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    let mut rows = 0;
    match state.tab {
        0 => draw_session(chunks[1], f, state),
        _ => {
            history::draw_history(chunks[1], f, state);
            rows = history::visible_rows(chunks[1].height.saturating_sub(4));
        }
    }

    let footer = match state.editing {
        Some(field) => Line::from(vec![
            Span::styled(format!("{}: ", field.label()), Style::default().fg(Color::Gray)),
            Span::raw(state.input.clone()),
            Span::styled("█", Style::default().fg(Color::Gray)),
        ]),
        None => Line::from(state.info.clone()),
    };
    f.render_widget(
        Paragraph::new(footer).block(Block::default().borders(Borders::ALL)),
        chunks[2],
    );

    if state.show_help {
        let w = area.width.min(60);
        let h = area.height.min(38);
        let popup = Rect {
            x: area.x + (area.width - w) / 2,
            y: area.y + (area.height - h) / 2,
            width: w,
            height: h,
        };
        help::draw_help(popup, f);
    }
    rows
}

fn draw_session(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(area);

    clock::draw_clock(f, clock::square_area(cols[0]), &state.snapshot);

    let lines = match state.stage {
        Stage::Confirming => confirm_lines(state),
        _ => status_lines(state),
    };
    let title = match state.stage {
        Stage::Idle => "Ready",
        Stage::Recording => "Recording",
        Stage::Confirming => "Confirm session",
    };
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, cols[1]);
}

fn kv(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(Color::Gray)),
        Span::raw(value),
    ])
}

fn or_unset(s: &str) -> String {
    if s.trim().is_empty() {
        "(not set)".into()
    } else {
        s.to_string()
    }
}

fn status_lines(state: &UiState) -> Vec<Line<'static>> {
    let big = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);
    let mut out = vec![Line::from(Span::styled(
        format_clock(state.snapshot.elapsed_seconds),
        big,
    ))];

    match state.snapshot.pomodoro {
        Some(p) => {
            out.push(kv(
                p.mode.label(),
                format!(
                    "{} left of {}",
                    format_clock(p.segment_remaining_seconds),
                    format_clock(p.segment_total_seconds)
                ),
            ));
            out.push(kv("Segments changed", p.boundaries_crossed.to_string()));
        }
        None if state.stage == Stage::Idle => {
            let mode = if state.start_as_pomodoro {
                format!(
                    "Pomodoro {} / {}",
                    format_duration(state.pomodoro.work_seconds()),
                    format_duration(state.pomodoro.break_seconds())
                )
            } else {
                "Plain timer".into()
            };
            out.push(kv("Mode", mode));
        }
        None => {}
    }

    out.push(Line::from(""));
    out.push(kv("Subject", or_unset(&state.details.title)));
    out.push(kv("Session type", or_unset(&state.details.session_type)));
    if let Some(plan) = state.details.plan.as_deref() {
        out.push(kv("Plan", plan.to_string()));
    }
    out
}

fn confirm_lines(state: &UiState) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    if let Some(d) = state.draft.as_ref() {
        out.push(kv("Subject", format!("{} ({})", d.title, d.session_type)));
        out.push(kv("Duration", format_duration(d.duration_seconds)));
        if d.is_pomodoro {
            out.push(kv("Segments changed", d.segments_completed.to_string()));
        }
    }
    out.push(kv("Focus", format!("{}/10", state.reflection.focus_score)));
    out.push(Line::from(""));
    out.push(Line::from(Span::styled(
        "Distractions",
        Style::default().fg(Color::Gray),
    )));
    for (i, label) in PREDEFINED_DISTRACTIONS.iter().enumerate() {
        let checked = state.reflection.distractions.iter().any(|d| d == label);
        let mark = if checked { "[x]" } else { "[ ]" };
        let style = if i == state.distraction_cursor {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        out.push(Line::from(Span::styled(format!("  {mark} {label}"), style)));
    }
    out.push(Line::from(""));
    out.push(kv(
        "Reflection",
        state
            .reflection
            .reflection
            .clone()
            .unwrap_or_else(|| "(f to write)".into()),
    ));
    out.push(kv(
        "Auto-save",
        if state.auto_save { "on" } else { "off" }.into(),
    ));
    out
}
