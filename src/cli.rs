use crate::config::FileConfig;
use crate::cue::{self, CueKind, CuePlayer};
use crate::model::{InfoEvent, Reflection, SessionConfig, SessionDetails, SessionRecord, TimerEvent};
use crate::orchestrator::{self, UiCommand};
use crate::timer::{PomodoroConfig, DEFAULT_BREAK_SECONDS, DEFAULT_WORK_SECONDS};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// How many saved sessions to load for history views and summaries.
pub(crate) const HISTORY_LOAD: usize = 200;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let mut out = std::io::LineWriter::new(stdout.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    // Lock per line: the tracing subscriber writes to stderr too.
                    let _ = writeln!(std::io::stderr().lock(), "{}", msg);
                }
            }
        }

        let _ = out.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "study-timer",
    version,
    about = "Record study sessions, optionally as Pomodoro work/break cycles"
)]
pub struct Cli {
    /// Subject being studied (e.g. Maths)
    #[arg(long)]
    pub title: Option<String>,

    /// Session type (e.g. Reading, Exam Practice)
    #[arg(long)]
    pub session_type: Option<String>,

    /// What you plan to get done
    #[arg(long)]
    pub plan: Option<String>,

    /// Run the session as alternating work/break segments
    #[arg(long)]
    pub pomodoro: bool,

    /// Pomodoro work segment length
    #[arg(long)]
    pub work: Option<humantime::Duration>,

    /// Pomodoro break segment length
    #[arg(long = "break")]
    pub break_duration: Option<humantime::Duration>,

    /// Record without the TUI and print a text summary on stop
    #[arg(long)]
    pub text: bool,

    /// Record without the TUI and print the session as JSON on stop
    #[arg(long)]
    pub json: bool,

    /// Stop automatically after this long (text/JSON modes; otherwise Ctrl-C stops)
    #[arg(long)]
    pub duration: Option<humantime::Duration>,

    /// Start recording as soon as the TUI opens
    #[arg(long)]
    pub start_on_launch: bool,

    /// Focus score stored with the session in text/JSON modes
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub focus_score: u8,

    /// Reflection stored with the session in text/JSON modes
    #[arg(long)]
    pub reflection: Option<String>,

    /// Distraction to record (repeatable)
    #[arg(long)]
    pub distraction: Vec<String>,

    /// Audible cue on start and at each segment boundary
    #[arg(long, value_enum)]
    pub cue: Option<CueKind>,

    /// Shell command used by --cue command
    #[arg(long)]
    pub cue_command: Option<String>,

    /// Use --auto-save true or --auto-save false to override
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub auto_save: bool,

    /// Export the saved session as JSON
    #[arg(long)]
    pub export_json: Option<std::path::PathBuf>,

    /// Export the saved session as CSV
    #[arg(long)]
    pub export_csv: Option<std::path::PathBuf>,

    /// Defaults file (default: <config dir>/study-timer/config.json)
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,

    /// Write logs to this file (the only log output in TUI mode)
    #[arg(long)]
    pub log_file: Option<std::path::PathBuf>,
}

impl Cli {
    fn is_headless(&self) -> bool {
        self.text || self.json || !cfg!(feature = "tui")
    }
}

pub async fn run(args: Cli) -> Result<()> {
    if args.text && args.json {
        return Err(anyhow::anyhow!("--text and --json cannot be used together"));
    }

    crate::logging::init(args.log_file.as_deref(), args.is_headless())?;
    let file = crate::config::load(args.config.as_deref())?;
    let cfg = build_config(&args, &file)?;
    let cue = cue::build_cue(
        args.cue.or(file.cue).unwrap_or(CueKind::Bell),
        args.cue_command.as_deref().or(file.cue_command.as_deref()),
    );
    tracing::debug!(cue = cue.name(), "audible cue selected");

    if !args.is_headless() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args, cfg, cue).await;
        }
    }

    run_headless(args, cfg, cue).await
}

fn non_empty(s: Option<&String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Build a `SessionConfig` from CLI arguments layered over the defaults file.
pub fn build_config(args: &Cli, file: &FileConfig) -> Result<SessionConfig> {
    let work = args
        .work
        .map(Duration::from)
        .or(file.work)
        .unwrap_or(Duration::from_secs(DEFAULT_WORK_SECONDS));
    let brk = args
        .break_duration
        .map(Duration::from)
        .or(file.break_duration)
        .unwrap_or(Duration::from_secs(DEFAULT_BREAK_SECONDS));
    let pomodoro =
        PomodoroConfig::from_durations(work, brk).context("invalid Pomodoro durations")?;

    Ok(SessionConfig {
        details: SessionDetails {
            title: non_empty(args.title.as_ref())
                .or_else(|| non_empty(file.title.as_ref()))
                .unwrap_or_default(),
            session_type: non_empty(args.session_type.as_ref())
                .or_else(|| non_empty(file.session_type.as_ref()))
                .unwrap_or_default(),
            plan: non_empty(args.plan.as_ref()),
        },
        pomodoro,
        pomodoro_by_default: args.pomodoro,
        tick_interval: Duration::from_secs(1),
        start_on_launch: args.start_on_launch || args.is_headless(),
    })
}

fn reflection_from_args(args: &Cli) -> Reflection {
    Reflection {
        reflection: non_empty(args.reflection.as_ref()),
        focus_score: args.focus_score,
        distractions: args
            .distraction
            .iter()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect(),
    }
}

/// Print the outcome of a headless recording: JSON or text summary on stdout,
/// save and export messages on stderr.
async fn run_headless(args: Cli, cfg: SessionConfig, cue: Arc<dyn CuePlayer>) -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();

    let result = match record_headless(&args, cfg, cue, &out_tx).await {
        Err(e) => Err(e),
        Ok(record) => {
            let processed = orchestrator::process_saved_session(
                &record,
                args.auto_save,
                args.export_json.as_deref(),
                args.export_csv.as_deref(),
                HISTORY_LOAD,
            );
            if args.json {
                let out = serde_json::to_string_pretty(&record)?;
                let _ = out_tx.send(OutputLine::Stdout(out));
            } else {
                let summary = crate::text_summary::build_text_summary(&record, &processed.history);
                for line in summary.lines {
                    let _ = out_tx.send(OutputLine::Stdout(line));
                }
            }
            for msg in processed.messages {
                let _ = out_tx.send(OutputLine::Stderr(msg));
            }
            Ok(())
        }
    };

    drop(out_tx);
    let _ = out_handle.await;
    result
}

/// Record one session without the TUI: start now, stop on Ctrl-C or after
/// `--duration`, save with the reflection given on the command line.
async fn record_headless(
    args: &Cli,
    cfg: SessionConfig,
    cue: Arc<dyn CuePlayer>,
    out_tx: &mpsc::UnboundedSender<OutputLine>,
) -> Result<SessionRecord> {
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<TimerEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let handle = tokio::spawn(async move {
        orchestrator::run_controller(&cfg, cue, evt_tx, cmd_rx).await
    });

    let deadline = args
        .duration
        .map(|d| tokio::time::Instant::now() + Duration::from(d));
    let auto_stop = async move {
        match deadline {
            Some(d) => tokio::time::sleep_until(d).await,
            None => futures::future::pending::<()>().await,
        }
    };
    tokio::pin!(auto_stop);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut stop_sent = false;
    let mut saved: Option<SessionRecord> = None;
    let mut rejected: Option<String> = None;

    loop {
        tokio::select! {
            ev = evt_rx.recv() => {
                let Some(ev) = ev else { break };
                match ev {
                    TimerEvent::SessionStarted { details, pomodoro } => {
                        let mode = match pomodoro {
                            Some(p) => format!(
                                " as Pomodoro ({} work / {} break)",
                                crate::format::format_duration(p.work_seconds()),
                                crate::format::format_duration(p.break_seconds())
                            ),
                            None => String::new(),
                        };
                        let _ = out_tx.send(OutputLine::Stderr(format!(
                            "Recording {} ({}){mode}. Press Ctrl-C to stop.",
                            details.title, details.session_type
                        )));
                    }
                    TimerEvent::Tick(s) => {
                        if s.running && s.elapsed_seconds > 0 && s.elapsed_seconds % 60 == 0 {
                            let mut line = format!("Elapsed {}", crate::format::format_clock(s.elapsed_seconds));
                            if let Some(p) = s.pomodoro {
                                line.push_str(&format!(
                                    " | {} {} left",
                                    p.mode.label(),
                                    crate::format::format_clock(p.segment_remaining_seconds)
                                ));
                            }
                            let _ = out_tx.send(OutputLine::Stderr(line));
                        }
                    }
                    TimerEvent::SegmentBoundary { entered, elapsed_seconds } => {
                        let _ = out_tx.send(OutputLine::Stderr(format!(
                            "== {} == (at {})",
                            entered.label(),
                            crate::format::format_clock(elapsed_seconds)
                        )));
                    }
                    TimerEvent::SessionStopped { .. } => {
                        let _ = cmd_tx.send(UiCommand::Save(reflection_from_args(args)));
                    }
                    TimerEvent::SessionSaved { record } => {
                        saved = Some(*record);
                        let _ = cmd_tx.send(UiCommand::Quit);
                    }
                    TimerEvent::Info(InfoEvent::Rejected(reason)) => {
                        rejected = Some(reason);
                        let _ = cmd_tx.send(UiCommand::Quit);
                    }
                    TimerEvent::Info(info) => {
                        let _ = out_tx.send(OutputLine::Stderr(info.to_message()));
                    }
                    TimerEvent::StageChanged { .. } | TimerEvent::SessionDiscarded => {}
                }
            }
            _ = &mut ctrl_c, if !stop_sent => {
                stop_sent = true;
                let _ = cmd_tx.send(UiCommand::Stop);
            }
            _ = &mut auto_stop, if !stop_sent => {
                stop_sent = true;
                let _ = cmd_tx.send(UiCommand::Stop);
            }
        }
    }

    handle.await.context("session controller task failed")??;

    match (rejected, saved) {
        (Some(reason), _) => Err(anyhow::anyhow!(reason)),
        (None, None) => Err(anyhow::anyhow!("session ended without being saved")),
        (None, Some(record)) => Ok(record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("study-timer").chain(argv.iter().copied()))
    }

    #[test]
    fn defaults_are_25_and_5_minutes() {
        let cfg = build_config(&parse(&[]), &FileConfig::default()).unwrap();
        assert_eq!(cfg.pomodoro.work_seconds(), 1500);
        assert_eq!(cfg.pomodoro.break_seconds(), 300);
        assert_eq!(cfg.tick_interval, Duration::from_secs(1));
    }

    #[test]
    fn flags_override_file() {
        let file = FileConfig {
            work: Some(Duration::from_secs(3000)),
            break_duration: Some(Duration::from_secs(600)),
            title: Some("History".into()),
            session_type: Some("Reading".into()),
            ..Default::default()
        };
        let args = parse(&["--work", "50s", "--title", "Maths", "--text", "--pomodoro"]);
        let cfg = build_config(&args, &file).unwrap();
        assert_eq!(cfg.pomodoro.work_seconds(), 50);
        assert_eq!(cfg.pomodoro.break_seconds(), 600);
        assert_eq!(cfg.details.title, "Maths");
        assert_eq!(cfg.details.session_type, "Reading");
        assert!(cfg.pomodoro_by_default);
        assert!(cfg.start_on_launch);
    }

    #[test]
    fn zero_length_segment_is_rejected() {
        let args = parse(&["--break", "0s"]);
        assert!(build_config(&args, &FileConfig::default()).is_err());
    }

    #[test]
    fn focus_score_is_range_checked() {
        let argv = ["study-timer", "--focus-score", "11"];
        assert!(Cli::try_parse_from(argv).is_err());
        let r = reflection_from_args(&parse(&["--distraction", "Emails", "--distraction", " "]));
        assert_eq!(r.distractions, vec!["Emails".to_string()]);
        assert_eq!(r.focus_score, 5);
    }

    async fn record(argv: &[&str]) -> Result<SessionRecord> {
        // Logs on stderr alongside the writer thread, as in a real headless run.
        let _ = crate::logging::init(None, true);
        let args = parse(argv);
        let cfg = build_config(&args, &FileConfig::default()).unwrap();
        let cue = cue::build_cue(CueKind::None, None);
        let (out_tx, out_handle) = spawn_output_writer();
        let res = tokio::time::timeout(
            Duration::from_secs(10),
            record_headless(&args, cfg, cue, &out_tx),
        )
        .await
        .expect("headless recording did not finish");
        drop(out_tx);
        out_handle.await.unwrap();
        res
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn headless_run_stops_after_duration_and_saves() {
        let record = record(&[
            "--text",
            "--title",
            "Maths",
            "--session-type",
            "Reading",
            "--duration",
            "2s",
            "--cue",
            "none",
            "--auto-save",
            "false",
            "--focus-score",
            "8",
            "--distraction",
            "Phone",
        ])
        .await
        .unwrap();
        assert_eq!(record.title, "Maths");
        assert_eq!(record.session_type, "Reading");
        assert!((1..=2).contains(&record.duration_seconds));
        assert_eq!(record.focus_score, 8);
        assert_eq!(record.distractions, vec!["Phone".to_string()]);
        assert!(!record.is_pomodoro);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn headless_run_reports_missing_subject() {
        let err = record(&["--json", "--session-type", "Reading", "--cue", "none"])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("subject"), "{err}");
    }
}
