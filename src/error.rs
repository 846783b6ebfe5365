use crate::timer::PomodoroMode;
use thiserror::Error;

/// Errors raised while configuring or starting a session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    #[error("{} duration must be at least one second (got {seconds}s)", .segment.label())]
    InvalidDuration { segment: PomodoroMode, seconds: u64 },

    #[error("please set a {0} before starting")]
    MissingDetail(&'static str),

    #[error("a session is already being recorded")]
    AlreadyRecording,

    #[error("no session is being recorded")]
    NotRecording,

    #[error("no stopped session is awaiting confirmation")]
    NothingToConfirm,

    #[error("save or discard the stopped session first")]
    AwaitingConfirmation,

    #[error("focus score must be between 1 and 10 (got {0})")]
    InvalidFocusScore(u8),
}

/// Audible cue could not be played. Logged by the caller, never propagated.
#[derive(Error, Debug)]
pub enum CueError {
    #[error("audio output not available: {0}")]
    OutputUnavailable(#[from] std::io::Error),

    #[error("cue command exited with {0}")]
    CommandFailed(std::process::ExitStatus),
}
