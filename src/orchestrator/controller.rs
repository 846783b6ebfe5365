//! Session lifecycle controller.
//!
//! Owns the timer state and the 1-second tick source for the active session,
//! handles start/stop/save/discard, and emits events for presentation layers.

use crate::cue::{self, CuePlayer};
use crate::error::TimerError;
use crate::model::{
    InfoEvent, Reflection, SessionConfig, SessionDetails, SessionRecord, Stage, TimerEvent,
};
use crate::timer::{PomodoroController, SessionTimer, TickOutcome};
use anyhow::Result;
use rand::RngCore;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Commands emitted by UI layers to drive the session.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    SetDetails(SessionDetails),
    ConfigurePomodoro { work_seconds: u64, break_seconds: u64 },
    Start { pomodoro: bool },
    Stop,
    Save(Reflection),
    Discard,
    Quit,
}

/// A recording in progress. Dropping it cancels its tick source.
struct ActiveSession {
    timer: SessionTimer,
    details: SessionDetails,
    ticker: Interval,
}

/// Fixed-period tick source whose first tick is one period after start.
/// Late ticks are delayed rather than bursted, so each still counts as one second.
fn new_ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Generate a random identifier for a session record.
fn gen_session_id() -> String {
    let mut b = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut b);
    format!("{:016x}", u64::from_le_bytes(b))
}

fn rfc3339(at: SystemTime) -> String {
    time::OffsetDateTime::from(at)
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "now".into())
}

/// Lifecycle state machine: Idle -> Recording -> Confirming -> Idle.
pub(crate) struct SessionController {
    details: SessionDetails,
    /// Segment lengths for the next Pomodoro start; never started itself.
    pomodoro: PomodoroController,
    tick_interval: Duration,
    cue: Arc<dyn CuePlayer>,
    event_tx: UnboundedSender<TimerEvent>,
    active: Option<ActiveSession>,
    pending: Option<SessionRecord>,
}

impl SessionController {
    pub(crate) fn new(
        cfg: &SessionConfig,
        cue: Arc<dyn CuePlayer>,
        event_tx: UnboundedSender<TimerEvent>,
    ) -> Self {
        Self {
            details: cfg.details.clone(),
            pomodoro: PomodoroController::new(cfg.pomodoro),
            tick_interval: cfg.tick_interval,
            cue,
            event_tx,
            active: None,
            pending: None,
        }
    }

    pub(crate) fn stage(&self) -> Stage {
        if self.active.is_some() {
            Stage::Recording
        } else if self.pending.is_some() {
            Stage::Confirming
        } else {
            Stage::Idle
        }
    }

    fn emit(&self, ev: TimerEvent) {
        let _ = self.event_tx.send(ev);
    }

    fn set_stage(&self) {
        self.emit(TimerEvent::StageChanged {
            stage: self.stage(),
        });
    }

    pub(crate) fn set_details(&mut self, details: SessionDetails) -> Result<(), TimerError> {
        if self.active.is_some() {
            return Err(TimerError::AlreadyRecording);
        }
        self.details = details;
        Ok(())
    }

    pub(crate) fn configure_pomodoro(
        &mut self,
        work_seconds: u64,
        break_seconds: u64,
    ) -> Result<(), TimerError> {
        if self.active.is_some() {
            return Err(TimerError::AlreadyRecording);
        }
        self.pomodoro.configure(work_seconds, break_seconds)?;
        self.emit(TimerEvent::Info(InfoEvent::PomodoroConfigured {
            work_seconds,
            break_seconds,
        }));
        Ok(())
    }

    pub(crate) fn start(&mut self, pomodoro: bool) -> Result<(), TimerError> {
        if self.active.is_some() {
            return Err(TimerError::AlreadyRecording);
        }
        if self.pending.is_some() {
            return Err(TimerError::AwaitingConfirmation);
        }
        if self.details.title.trim().is_empty() {
            return Err(TimerError::MissingDetail("subject"));
        }
        if self.details.session_type.trim().is_empty() {
            return Err(TimerError::MissingDetail("session type"));
        }

        let pomodoro = pomodoro.then(|| self.pomodoro.config());
        self.active = Some(ActiveSession {
            timer: SessionTimer::start(pomodoro),
            details: self.details.clone(),
            ticker: new_ticker(self.tick_interval),
        });
        tracing::info!(
            title = %self.details.title,
            session_type = %self.details.session_type,
            pomodoro = pomodoro.is_some(),
            "session started"
        );
        cue::dispatch(&self.cue);
        self.emit(TimerEvent::SessionStarted {
            details: self.details.clone(),
            pomodoro,
        });
        self.set_stage();
        if let Some(a) = &self.active {
            self.emit(TimerEvent::Tick(a.timer.snapshot()));
        }
        Ok(())
    }

    /// Apply one tick to the active session. Called only by the tick source.
    fn on_tick(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let outcome = active.timer.tick();
        let snapshot = active.timer.snapshot();
        if let TickOutcome::SegmentBoundaryCrossed { entered } = outcome {
            tracing::debug!(entered = ?entered, elapsed = snapshot.elapsed_seconds, "segment boundary");
            cue::dispatch(&self.cue);
            self.emit(TimerEvent::SegmentBoundary {
                entered,
                elapsed_seconds: snapshot.elapsed_seconds,
            });
        }
        self.emit(TimerEvent::Tick(snapshot));
    }

    /// Cancel the tick source and hold the result for confirmation.
    pub(crate) fn stop(&mut self) -> Result<SessionRecord, TimerError> {
        let Some(mut active) = self.active.take() else {
            return Err(TimerError::NotRecording);
        };
        active.timer.stop();
        let draft = build_record(&active);
        tracing::info!(
            duration_seconds = draft.duration_seconds,
            segments = draft.segments_completed,
            "session stopped"
        );
        self.emit(TimerEvent::SessionStopped {
            draft: Box::new(draft.clone()),
        });
        self.pending = Some(draft.clone());
        self.set_stage();
        self.emit(TimerEvent::Tick(active.timer.snapshot()));
        Ok(draft)
    }

    pub(crate) fn save(&mut self, reflection: &Reflection) -> Result<SessionRecord, TimerError> {
        if !(1..=10).contains(&reflection.focus_score) {
            return Err(TimerError::InvalidFocusScore(reflection.focus_score));
        }
        let Some(mut record) = self.pending.take() else {
            return Err(TimerError::NothingToConfirm);
        };
        record.apply_reflection(reflection);
        tracing::info!(session_id = %record.session_id, "session confirmed");
        self.emit(TimerEvent::SessionSaved {
            record: Box::new(record.clone()),
        });
        self.set_stage();
        Ok(record)
    }

    /// Drop the live session or the stopped draft, whichever exists.
    pub(crate) fn discard(&mut self) -> Result<(), TimerError> {
        if self.active.take().is_none() && self.pending.take().is_none() {
            return Err(TimerError::NotRecording);
        }
        tracing::info!("session discarded");
        self.emit(TimerEvent::SessionDiscarded);
        self.set_stage();
        Ok(())
    }

    fn handle(&mut self, cmd: UiCommand) {
        let res = match cmd {
            UiCommand::SetDetails(d) => self.set_details(d),
            UiCommand::ConfigurePomodoro {
                work_seconds,
                break_seconds,
            } => self.configure_pomodoro(work_seconds, break_seconds),
            UiCommand::Start { pomodoro } => self.start(pomodoro),
            UiCommand::Stop => self.stop().map(|_| ()),
            UiCommand::Save(r) => self.save(&r).map(|_| ()),
            UiCommand::Discard => self.discard(),
            UiCommand::Quit => Ok(()),
        };
        if let Err(e) = res {
            tracing::debug!(error = %e, "command rejected");
            self.emit(TimerEvent::Info(InfoEvent::Rejected(e.to_string())));
        }
    }
}

fn build_record(active: &ActiveSession) -> SessionRecord {
    let ended = SystemTime::now();
    let started = active.timer.started_at().unwrap_or(ended);
    let pomodoro = active.timer.pomodoro();
    SessionRecord {
        session_id: gen_session_id(),
        timestamp_utc: rfc3339(ended),
        title: active.details.title.trim().to_string(),
        session_type: active.details.session_type.trim().to_string(),
        plan: active.details.plan.clone().filter(|p| !p.trim().is_empty()),
        reflection: None,
        focus_score: crate::model::DEFAULT_FOCUS_SCORE,
        distractions: Vec::new(),
        started_at_utc: rfc3339(started),
        ended_at_utc: rfc3339(ended),
        duration_seconds: active.timer.elapsed_seconds(),
        is_pomodoro: pomodoro.is_some(),
        work_seconds: pomodoro.map(|p| p.config().work_seconds()),
        break_seconds: pomodoro.map(|p| p.config().break_seconds()),
        segments_completed: pomodoro.map(|p| p.boundaries_crossed()).unwrap_or(0),
    }
}

/// Drive the session from UI commands and the active tick source until quit.
pub(crate) async fn run_controller(
    cfg: &SessionConfig,
    cue: Arc<dyn CuePlayer>,
    event_tx: UnboundedSender<TimerEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut ctl = SessionController::new(cfg, cue, event_tx);
    if cfg.start_on_launch {
        ctl.handle(UiCommand::Start {
            pomodoro: cfg.pomodoro_by_default,
        });
    }

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Quit) | None => {
                        if ctl.stage() != Stage::Idle {
                            tracing::warn!("quitting with an unsaved session");
                        }
                        break;
                    }
                    Some(cmd) => ctl.handle(cmd),
                }
            }
            // Pending while idle; the interval lives and dies with the active session,
            // so no tick can arrive after a stop or discard.
            _ = async {
                match ctl.active.as_mut() {
                    Some(a) => {
                        a.ticker.tick().await;
                    }
                    None => futures::future::pending::<()>().await,
                }
            } => {
                ctl.on_tick();
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::Silent;
    use crate::model::TimerSnapshot;
    use crate::timer::{PomodoroConfig, PomodoroMode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    struct CountingCue(Arc<AtomicUsize>);

    impl CuePlayer for CountingCue {
        fn play(&self) -> Result<(), crate::error::CueError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn config(pomodoro: PomodoroConfig) -> SessionConfig {
        SessionConfig {
            details: SessionDetails {
                title: "Maths".into(),
                session_type: "Exam Practice".into(),
                plan: None,
            },
            pomodoro,
            pomodoro_by_default: false,
            tick_interval: Duration::from_secs(1),
            start_on_launch: false,
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<TimerEvent>) -> Vec<TimerEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    fn last_tick(events: &[TimerEvent]) -> Option<TimerSnapshot> {
        events.iter().rev().find_map(|e| match e {
            TimerEvent::Tick(s) => Some(*s),
            _ => None,
        })
    }

    #[tokio::test]
    async fn start_requires_subject_and_type() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut cfg = config(PomodoroConfig::default());
        cfg.details.title = "  ".into();
        let mut ctl = SessionController::new(&cfg, Arc::new(Silent), tx);
        assert_eq!(ctl.start(false), Err(TimerError::MissingDetail("subject")));

        ctl.set_details(SessionDetails {
            title: "Maths".into(),
            session_type: String::new(),
            plan: None,
        })
        .unwrap();
        assert_eq!(
            ctl.start(false),
            Err(TimerError::MissingDetail("session type"))
        );
        assert_eq!(ctl.stage(), Stage::Idle);
    }

    #[tokio::test]
    async fn lifecycle_stop_then_save() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ctl = SessionController::new(&config(PomodoroConfig::default()), Arc::new(Silent), tx);

        ctl.start(false).unwrap();
        assert_eq!(ctl.stage(), Stage::Recording);
        assert_eq!(ctl.start(false), Err(TimerError::AlreadyRecording));
        for _ in 0..5 {
            ctl.on_tick();
        }
        let draft = ctl.stop().unwrap();
        assert_eq!(draft.duration_seconds, 5);
        assert!(!draft.is_pomodoro);
        assert_eq!(ctl.stage(), Stage::Confirming);
        assert_eq!(ctl.start(false), Err(TimerError::AwaitingConfirmation));

        let bad = Reflection {
            focus_score: 11,
            ..Default::default()
        };
        assert_eq!(ctl.save(&bad), Err(TimerError::InvalidFocusScore(11)));

        let mut reflection = Reflection::default();
        reflection.toggle_distraction("Emails");
        reflection.reflection = Some("solid".into());
        let saved = ctl.save(&reflection).unwrap();
        assert_eq!(saved.duration_seconds, 5);
        assert_eq!(saved.distractions, vec!["Emails".to_string()]);
        assert_eq!(saved.session_id, draft.session_id);
        assert_eq!(ctl.stage(), Stage::Idle);

        let events = drain(&mut rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, TimerEvent::SessionSaved { .. })));
    }

    #[tokio::test]
    async fn pomodoro_boundaries_emit_events_and_cue() {
        let plays = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ctl = SessionController::new(
            &config(PomodoroConfig::new(3, 2).unwrap()),
            Arc::new(CountingCue(plays.clone())),
            tx,
        );
        ctl.start(true).unwrap();
        for _ in 0..3 {
            ctl.on_tick();
        }
        let events = drain(&mut rx);
        let snap = last_tick(&events).unwrap();
        let p = snap.pomodoro.unwrap();
        assert_eq!(snap.elapsed_seconds, 3);
        assert_eq!(p.mode, PomodoroMode::Break);
        assert_eq!(p.segment_remaining_seconds, 2);
        assert!(events.iter().any(|e| matches!(
            e,
            TimerEvent::SegmentBoundary {
                entered: PomodoroMode::Break,
                elapsed_seconds: 3
            }
        )));

        ctl.on_tick();
        ctl.on_tick();
        let snap = last_tick(&drain(&mut rx)).unwrap();
        assert_eq!(snap.pomodoro.unwrap().mode, PomodoroMode::Work);
        assert_eq!(snap.pomodoro.unwrap().segment_remaining_seconds, 3);

        let draft = ctl.stop().unwrap();
        assert!(draft.is_pomodoro);
        assert_eq!(draft.segments_completed, 2);
        assert_eq!(draft.work_seconds, Some(3));

        // Cues run on the blocking pool; give them a moment to land.
        for _ in 0..50 {
            if plays.load(Ordering::SeqCst) >= 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        // Start cue plus two boundaries.
        assert_eq!(plays.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn reconfigure_only_before_start() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut ctl = SessionController::new(&config(PomodoroConfig::default()), Arc::new(Silent), tx);
        ctl.configure_pomodoro(120, 60).unwrap();
        assert!(ctl.configure_pomodoro(0, 45).is_err());
        ctl.start(true).unwrap();
        assert_eq!(
            ctl.configure_pomodoro(60, 60),
            Err(TimerError::AlreadyRecording)
        );
        let p = ctl.active.as_ref().unwrap().timer.pomodoro().unwrap();
        assert_eq!(p.segment_remaining_seconds(), 120);
        assert_eq!(p.config().break_seconds(), 60);
    }

    #[tokio::test]
    async fn discard_while_recording_resets_everything() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut ctl = SessionController::new(
            &config(PomodoroConfig::new(3, 2).unwrap()),
            Arc::new(Silent),
            tx,
        );
        ctl.start(true).unwrap();
        for _ in 0..4 {
            ctl.on_tick();
        }
        ctl.discard().unwrap();
        assert_eq!(ctl.stage(), Stage::Idle);
        assert_eq!(ctl.discard(), Err(TimerError::NotRecording));

        ctl.start(true).unwrap();
        let snap = ctl.active.as_ref().unwrap().timer.snapshot();
        assert_eq!(snap.elapsed_seconds, 0);
        let p = snap.pomodoro.unwrap();
        assert_eq!(p.mode, PomodoroMode::Work);
        assert_eq!(p.segment_remaining_seconds, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn tick_source_drives_clock_and_stops_with_session() {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let cfg = config(PomodoroConfig::default());
        let handle = tokio::spawn(async move {
            run_controller(&cfg, Arc::new(Silent), event_tx, cmd_rx).await
        });

        cmd_tx.send(UiCommand::Start { pomodoro: false }).unwrap();
        tokio::time::sleep(Duration::from_millis(3500)).await;
        cmd_tx.send(UiCommand::Stop).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let events = drain(&mut event_rx);
        let draft = events
            .iter()
            .find_map(|e| match e {
                TimerEvent::SessionStopped { draft } => Some(draft.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(draft.duration_seconds, 3);

        // No tick may fire once the stop has been handled.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(drain(&mut event_rx)
            .iter()
            .all(|e| !matches!(e, TimerEvent::Tick(_))));

        cmd_tx.send(UiCommand::Quit).unwrap();
        handle.await.unwrap().unwrap();
    }
}
