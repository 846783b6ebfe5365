//! Session timer core: a second counter with an optional Pomodoro countdown
//! and the clock-face mapping used to display either.

mod face;
mod pomodoro;
mod session_clock;

pub use face::{elapsed_face, hand_angles, hand_tip, HandAngles};
pub use pomodoro::{
    PomodoroConfig, PomodoroController, PomodoroMode, TickOutcome, DEFAULT_BREAK_SECONDS,
    DEFAULT_WORK_SECONDS,
};
pub use session_clock::SessionClock;

use crate::model::{PomodoroSnapshot, TimerSnapshot};
use std::time::SystemTime;

/// State of one recording: created on start, dropped on stop or discard.
///
/// The clock and the Pomodoro countdown advance together in [`SessionTimer::tick`];
/// Pomodoro flips never touch the clock's total.
#[derive(Debug, Clone)]
pub struct SessionTimer {
    clock: SessionClock,
    pomodoro: Option<PomodoroController>,
}

impl SessionTimer {
    /// Build and start a fresh timer.
    pub fn start(pomodoro: Option<PomodoroConfig>) -> Self {
        let mut clock = SessionClock::new();
        clock.start();
        let pomodoro = pomodoro.map(|cfg| {
            let mut p = PomodoroController::new(cfg);
            p.start();
            p
        });
        Self { clock, pomodoro }
    }

    pub fn tick(&mut self) -> TickOutcome {
        self.clock.tick();
        match self.pomodoro.as_mut() {
            Some(p) => p.tick(),
            None => TickOutcome::Continued,
        }
    }

    pub fn stop(&mut self) {
        self.clock.stop();
        if let Some(p) = self.pomodoro.as_mut() {
            p.stop();
        }
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.clock.elapsed_seconds()
    }

    pub fn started_at(&self) -> Option<SystemTime> {
        self.clock.started_at()
    }

    pub fn pomodoro(&self) -> Option<&PomodoroController> {
        self.pomodoro.as_ref()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            elapsed_seconds: self.clock.elapsed_seconds(),
            running: self.clock.is_running(),
            pomodoro: self.pomodoro.as_ref().map(|p| PomodoroSnapshot {
                mode: p.mode(),
                segment_remaining_seconds: p.segment_remaining_seconds(),
                segment_total_seconds: p.segment_total_seconds(),
                boundaries_crossed: p.boundaries_crossed(),
            }),
        }
    }
}

impl TimerSnapshot {
    /// Face for this reading: segment countdown in Pomodoro mode, elapsed time otherwise.
    pub fn face(&self) -> HandAngles {
        match &self.pomodoro {
            Some(p) => hand_angles(p.segment_remaining_seconds, true, p.segment_total_seconds),
            None => elapsed_face(self.elapsed_seconds),
        }
    }
}
