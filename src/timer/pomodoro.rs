use crate::error::TimerError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_WORK_SECONDS: u64 = 25 * 60;
pub const DEFAULT_BREAK_SECONDS: u64 = 5 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PomodoroMode {
    Work,
    Break,
}

impl PomodoroMode {
    pub fn flipped(self) -> Self {
        match self {
            PomodoroMode::Work => PomodoroMode::Break,
            PomodoroMode::Break => PomodoroMode::Work,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PomodoroMode::Work => "Work",
            PomodoroMode::Break => "Break",
        }
    }
}

/// Result of one tick, inspected by the owner to decide whether to play the cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continued,
    SegmentBoundaryCrossed { entered: PomodoroMode },
}

/// Validated work/break lengths, fixed for one Pomodoro run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroConfig {
    work_seconds: u64,
    break_seconds: u64,
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            work_seconds: DEFAULT_WORK_SECONDS,
            break_seconds: DEFAULT_BREAK_SECONDS,
        }
    }
}

impl PomodoroConfig {
    pub fn new(work_seconds: u64, break_seconds: u64) -> Result<Self, TimerError> {
        if work_seconds == 0 {
            return Err(TimerError::InvalidDuration {
                segment: PomodoroMode::Work,
                seconds: work_seconds,
            });
        }
        if break_seconds == 0 {
            return Err(TimerError::InvalidDuration {
                segment: PomodoroMode::Break,
                seconds: break_seconds,
            });
        }
        Ok(Self {
            work_seconds,
            break_seconds,
        })
    }

    /// Sub-second precision is dropped; anything shorter than a second is rejected.
    pub fn from_durations(work: Duration, brk: Duration) -> Result<Self, TimerError> {
        Self::new(work.as_secs(), brk.as_secs())
    }

    pub fn work_seconds(&self) -> u64 {
        self.work_seconds
    }

    pub fn break_seconds(&self) -> u64 {
        self.break_seconds
    }

    pub fn duration_of(&self, mode: PomodoroMode) -> u64 {
        match mode {
            PomodoroMode::Work => self.work_seconds,
            PomodoroMode::Break => self.break_seconds,
        }
    }
}

/// Countdown layered over the session clock, alternating work and break
/// segments until stopped.
#[derive(Debug, Clone)]
pub struct PomodoroController {
    config: PomodoroConfig,
    mode: PomodoroMode,
    segment_remaining_seconds: u64,
    active: bool,
    boundaries_crossed: u64,
}

impl PomodoroController {
    pub fn new(config: PomodoroConfig) -> Self {
        Self {
            config,
            mode: PomodoroMode::Work,
            segment_remaining_seconds: config.work_seconds,
            active: false,
            boundaries_crossed: 0,
        }
    }

    /// Replace segment lengths. Only meaningful before `start`.
    pub fn configure(&mut self, work_seconds: u64, break_seconds: u64) -> Result<(), TimerError> {
        self.config = PomodoroConfig::new(work_seconds, break_seconds)?;
        self.segment_remaining_seconds = self.config.duration_of(self.mode);
        Ok(())
    }

    pub fn start(&mut self) {
        self.mode = PomodoroMode::Work;
        self.segment_remaining_seconds = self.config.work_seconds;
        self.boundaries_crossed = 0;
        self.active = true;
    }

    /// Advance one second. A segment flips on the tick that would take the
    /// countdown to zero, so a displayed remaining time of 0 never appears.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.active {
            return TickOutcome::Continued;
        }
        if self.segment_remaining_seconds > 1 {
            self.segment_remaining_seconds -= 1;
            return TickOutcome::Continued;
        }
        self.mode = self.mode.flipped();
        self.segment_remaining_seconds = self.config.duration_of(self.mode);
        self.boundaries_crossed += 1;
        TickOutcome::SegmentBoundaryCrossed { entered: self.mode }
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    pub fn mode(&self) -> PomodoroMode {
        self.mode
    }

    pub fn segment_remaining_seconds(&self) -> u64 {
        self.segment_remaining_seconds
    }

    pub fn segment_total_seconds(&self) -> u64 {
        self.config.duration_of(self.mode)
    }

    pub fn config(&self) -> PomodoroConfig {
        self.config
    }

    pub fn boundaries_crossed(&self) -> u64 {
        self.boundaries_crossed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(work: u64, brk: u64) -> PomodoroController {
        let mut p = PomodoroController::new(PomodoroConfig::new(work, brk).unwrap());
        p.start();
        p
    }

    #[test]
    fn rejects_non_positive_durations() {
        assert!(matches!(
            PomodoroConfig::new(0, 5),
            Err(TimerError::InvalidDuration {
                segment: PomodoroMode::Work,
                ..
            })
        ));
        assert!(matches!(
            PomodoroConfig::new(5, 0),
            Err(TimerError::InvalidDuration {
                segment: PomodoroMode::Break,
                ..
            })
        ));
        let mut p = PomodoroController::new(PomodoroConfig::default());
        assert!(p.configure(0, 1).is_err());
        assert_eq!(p.config(), PomodoroConfig::default());
    }

    #[test]
    fn sub_second_durations_are_rejected() {
        assert!(
            PomodoroConfig::from_durations(Duration::from_millis(500), Duration::from_secs(1))
                .is_err()
        );
    }

    #[test]
    fn start_enters_work_with_full_segment() {
        let p = started(3, 2);
        assert_eq!(p.mode(), PomodoroMode::Work);
        assert_eq!(p.segment_remaining_seconds(), 3);
    }

    #[test]
    fn flips_work_to_break_and_back() {
        let mut p = started(3, 2);
        assert_eq!(p.tick(), TickOutcome::Continued);
        assert_eq!(p.tick(), TickOutcome::Continued);
        assert_eq!(
            p.tick(),
            TickOutcome::SegmentBoundaryCrossed {
                entered: PomodoroMode::Break
            }
        );
        assert_eq!(p.mode(), PomodoroMode::Break);
        assert_eq!(p.segment_remaining_seconds(), 2);

        assert_eq!(p.tick(), TickOutcome::Continued);
        assert_eq!(
            p.tick(),
            TickOutcome::SegmentBoundaryCrossed {
                entered: PomodoroMode::Work
            }
        );
        assert_eq!(p.mode(), PomodoroMode::Work);
        assert_eq!(p.segment_remaining_seconds(), 3);
        assert_eq!(p.boundaries_crossed(), 2);
    }

    #[test]
    fn remaining_stays_within_segment_bounds() {
        let mut p = started(4, 1);
        for _ in 0..500 {
            p.tick();
            let remaining = p.segment_remaining_seconds();
            assert!(remaining >= 1);
            assert!(remaining <= p.segment_total_seconds());
        }
    }

    #[test]
    fn one_second_segments_flip_every_tick() {
        let mut p = started(1, 1);
        for i in 0..6 {
            assert!(matches!(
                p.tick(),
                TickOutcome::SegmentBoundaryCrossed { .. }
            ));
            assert_eq!(p.boundaries_crossed(), i + 1);
        }
    }

    #[test]
    fn boundary_count_over_full_cycles() {
        let mut p = started(3, 2);
        let boundaries = (0..25)
            .filter(|_| p.tick() != TickOutcome::Continued)
            .count();
        // 25 ticks = five full 3+2 cycles.
        assert_eq!(boundaries, 10);
        assert_eq!(p.mode(), PomodoroMode::Work);
    }

    #[test]
    fn inactive_controller_does_not_count_down() {
        let mut p = PomodoroController::new(PomodoroConfig::new(3, 2).unwrap());
        assert_eq!(p.tick(), TickOutcome::Continued);
        assert_eq!(p.segment_remaining_seconds(), 3);
        p.start();
        p.stop();
        p.tick();
        assert_eq!(p.segment_remaining_seconds(), 3);
    }
}
