//! Audible cue played when a session starts and at each Pomodoro segment boundary.
//!
//! Playback is best-effort: failures are logged and dropped so timer
//! progress never depends on audio output.

use crate::error::CueError;
use std::io::Write;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

/// Gap between the two notes of the cue.
pub const NOTE_GAP: Duration = Duration::from_millis(200);

/// Something that can play the two-note cue. Implementations may block.
pub trait CuePlayer: Send + Sync {
    fn play(&self) -> Result<(), CueError>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueKind {
    /// Two terminal bells
    Bell,
    /// Run a shell command (see --cue-command)
    Command,
    /// No sound
    None,
}

/// Two BEL characters on stderr, which the TUI never draws to.
pub struct TerminalBell;

impl CuePlayer for TerminalBell {
    fn play(&self) -> Result<(), CueError> {
        let mut err = std::io::stderr();
        err.write_all(b"\x07")?;
        err.flush()?;
        std::thread::sleep(NOTE_GAP);
        err.write_all(b"\x07")?;
        err.flush()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "bell"
    }
}

/// Runs a user command through `sh -c` and waits for it.
pub struct CommandCue {
    command: String,
}

impl CommandCue {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl CuePlayer for CommandCue {
    fn play(&self) -> Result<(), CueError> {
        let status = Command::new("sh").arg("-c").arg(&self.command).status()?;
        if !status.success() {
            return Err(CueError::CommandFailed(status));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "command"
    }
}

pub struct Silent;

impl CuePlayer for Silent {
    fn play(&self) -> Result<(), CueError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Pick a cue implementation. A command cue with no usable command falls back to the bell.
pub fn build_cue(kind: CueKind, command: Option<&str>) -> Arc<dyn CuePlayer> {
    match kind {
        CueKind::Bell => Arc::new(TerminalBell),
        CueKind::None => Arc::new(Silent),
        CueKind::Command => match command.map(str::trim) {
            Some(cmd) if !cmd.is_empty() && !cmd.starts_with('#') => Arc::new(CommandCue::new(cmd)),
            _ => {
                tracing::warn!("cue command missing or commented out, using terminal bell");
                Arc::new(TerminalBell)
            }
        },
    }
}

/// Play the cue off the async runtime. Errors are logged, never returned.
pub fn dispatch(cue: &Arc<dyn CuePlayer>) {
    let cue = Arc::clone(cue);
    tokio::task::spawn_blocking(move || play_logged(cue.as_ref()));
}

/// Play synchronously, logging any failure. Returns whether playback succeeded.
pub fn play_logged(cue: &dyn CuePlayer) -> bool {
    match cue.play() {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(cue = cue.name(), error = %e, "cue playback failed");
            false
        }
    }
}
