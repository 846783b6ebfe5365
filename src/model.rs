use crate::timer::{PomodoroConfig, PomodoroMode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const PREDEFINED_DISTRACTIONS: [&str; 5] = [
    "Social Media",
    "Messaging",
    "Emails",
    "Loud Noises",
    "People",
];

pub const DEFAULT_FOCUS_SCORE: u8 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub details: SessionDetails,
    /// Pomodoro lengths used when a session starts in Pomodoro mode.
    pub pomodoro: PomodoroConfig,
    /// Start in Pomodoro mode when the session launches without an explicit choice.
    pub pomodoro_by_default: bool,
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,
    pub start_on_launch: bool,
}

/// What the user is studying. Subject and session type are required to start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionDetails {
    pub title: String,
    pub session_type: String,
    #[serde(default)]
    pub plan: Option<String>,
}

/// Post-session answers collected while confirming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reflection {
    #[serde(default)]
    pub reflection: Option<String>,
    pub focus_score: u8,
    #[serde(default)]
    pub distractions: Vec<String>,
}

impl Default for Reflection {
    fn default() -> Self {
        Self {
            reflection: None,
            focus_score: DEFAULT_FOCUS_SCORE,
            distractions: Vec::new(),
        }
    }
}

impl Reflection {
    /// Add the distraction if absent, remove it otherwise.
    pub fn toggle_distraction(&mut self, label: &str) {
        if let Some(pos) = self.distractions.iter().position(|d| d == label) {
            self.distractions.remove(pos);
        } else {
            self.distractions.push(label.to_string());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Idle,
    Recording,
    Confirming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroSnapshot {
    pub mode: PomodoroMode,
    pub segment_remaining_seconds: u64,
    pub segment_total_seconds: u64,
    pub boundaries_crossed: u64,
}

/// Display reading emitted on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub elapsed_seconds: u64,
    pub running: bool,
    pub pomodoro: Option<PomodoroSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TimerEvent {
    StageChanged {
        stage: Stage,
    },
    SessionStarted {
        details: SessionDetails,
        pomodoro: Option<PomodoroConfig>,
    },
    Tick(TimerSnapshot),
    SegmentBoundary {
        entered: PomodoroMode,
        elapsed_seconds: u64,
    },
    /// Stopped and awaiting save or discard.
    SessionStopped {
        // Boxed to keep TimerEvent small; the draft carries several strings.
        draft: Box<SessionRecord>,
    },
    SessionSaved {
        record: Box<SessionRecord>,
    },
    SessionDiscarded,
    Info(InfoEvent),
}

/// Structured info events emitted by the controller and consumed by UI/CLI layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InfoEvent {
    Rejected(String),
    PomodoroConfigured { work_seconds: u64, break_seconds: u64 },
}

impl InfoEvent {
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Rejected(reason) => format!("Cannot do that: {reason}"),
            InfoEvent::PomodoroConfigured {
                work_seconds,
                break_seconds,
            } => format!(
                "Pomodoro set to {} work / {} break",
                crate::format::format_duration(*work_seconds),
                crate::format::format_duration(*break_seconds)
            ),
        }
    }
}

/// Immutable result of one session, handed to persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    #[serde(default)]
    pub timestamp_utc: String,
    pub title: String,
    pub session_type: String,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub reflection: Option<String>,
    pub focus_score: u8,
    #[serde(default)]
    pub distractions: Vec<String>,
    pub started_at_utc: String,
    pub ended_at_utc: String,
    pub duration_seconds: u64,
    pub is_pomodoro: bool,
    #[serde(default)]
    pub work_seconds: Option<u64>,
    #[serde(default)]
    pub break_seconds: Option<u64>,
    #[serde(default)]
    pub segments_completed: u64,
}

impl SessionRecord {
    pub fn apply_reflection(&mut self, r: &Reflection) {
        self.reflection = r.reflection.clone();
        self.focus_score = r.focus_score;
        self.distractions = r.distractions.clone();
    }
}
