use crate::model::{
    Reflection, SessionDetails, SessionRecord, Stage, TimerSnapshot, PREDEFINED_DISTRACTIONS,
};
use crate::timer::PomodoroConfig;

/// Text field currently being typed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Title,
    SessionType,
    Plan,
    Reflection,
}

impl EditField {
    pub fn label(self) -> &'static str {
        match self {
            EditField::Title => "Subject",
            EditField::SessionType => "Session type",
            EditField::Plan => "Plan",
            EditField::Reflection => "Reflection",
        }
    }
}

pub struct UiState {
    pub tab: usize,
    pub show_help: bool,
    pub stage: Stage,
    pub snapshot: TimerSnapshot,
    pub info: String,

    pub details: SessionDetails,
    pub pomodoro: PomodoroConfig,
    pub start_as_pomodoro: bool,

    pub editing: Option<EditField>,
    pub input: String,

    // Confirming stage
    pub draft: Option<SessionRecord>,
    pub reflection: Reflection,
    pub distraction_cursor: usize,

    pub history: Vec<SessionRecord>,
    pub history_selected: usize, // Index of selected history item (0 = most recent)
    pub history_scroll_offset: usize,

    pub auto_save: bool,
    pub export_json: Option<std::path::PathBuf>,
    pub export_csv: Option<std::path::PathBuf>,
    // Second q while a session is unsaved actually quits.
    pub quit_armed: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tab: 0,
            show_help: false,
            stage: Stage::Idle,
            snapshot: TimerSnapshot {
                elapsed_seconds: 0,
                running: false,
                pomodoro: None,
            },
            info: String::new(),
            details: SessionDetails::default(),
            pomodoro: PomodoroConfig::default(),
            start_as_pomodoro: false,
            editing: None,
            input: String::new(),
            draft: None,
            reflection: Reflection::default(),
            distraction_cursor: 0,
            history: Vec::new(),
            history_selected: 0,
            history_scroll_offset: 0,
            auto_save: true,
            export_json: None,
            export_csv: None,
            quit_armed: false,
        }
    }
}

/// Step a whole-minute segment length, never below one minute.
pub fn step_minutes(seconds: u64, delta: i64) -> u64 {
    let minutes = (seconds / 60).max(1) as i64;
    (minutes + delta).max(1) as u64 * 60
}

impl UiState {
    pub fn begin_edit(&mut self, field: EditField) {
        self.input = match field {
            EditField::Title => self.details.title.clone(),
            EditField::SessionType => self.details.session_type.clone(),
            EditField::Plan => self.details.plan.clone().unwrap_or_default(),
            EditField::Reflection => self.reflection.reflection.clone().unwrap_or_default(),
        };
        self.editing = Some(field);
    }

    /// Apply the input buffer to the edited field. Returns the field that changed.
    pub fn commit_edit(&mut self) -> Option<EditField> {
        let field = self.editing.take()?;
        let value = std::mem::take(&mut self.input).trim().to_string();
        let opt = (!value.is_empty()).then(|| value.clone());
        match field {
            EditField::Title => self.details.title = value,
            EditField::SessionType => self.details.session_type = value,
            EditField::Plan => self.details.plan = opt,
            EditField::Reflection => self.reflection.reflection = opt,
        }
        Some(field)
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.input.clear();
    }

    pub fn adjust_focus(&mut self, delta: i8) {
        let next = self.reflection.focus_score as i16 + delta as i16;
        self.reflection.focus_score = next.clamp(1, 10) as u8;
    }

    pub fn move_distraction_cursor(&mut self, delta: isize) {
        let n = PREDEFINED_DISTRACTIONS.len() as isize;
        self.distraction_cursor = (self.distraction_cursor as isize + delta).rem_euclid(n) as usize;
    }

    pub fn toggle_selected_distraction(&mut self) {
        let label = PREDEFINED_DISTRACTIONS[self.distraction_cursor];
        self.reflection.toggle_distraction(label);
    }

    pub fn select_history(&mut self, delta: isize, visible_rows: usize) {
        if self.history.is_empty() {
            self.history_selected = 0;
            self.history_scroll_offset = 0;
            return;
        }
        let max = self.history.len() as isize - 1;
        self.history_selected = (self.history_selected as isize + delta).clamp(0, max) as usize;
        let rows = visible_rows.max(1);
        if self.history_selected < self.history_scroll_offset {
            self.history_scroll_offset = self.history_selected;
        } else if self.history_selected >= self.history_scroll_offset + rows {
            self.history_scroll_offset = self.history_selected + 1 - rows;
        }
    }

    pub fn set_history(&mut self, history: Vec<SessionRecord>) {
        self.history = history;
        if self.history_selected >= self.history.len() {
            self.history_selected = self.history.len().saturating_sub(1);
        }
        if self.history_scroll_offset > self.history_selected {
            self.history_scroll_offset = self.history_selected;
        }
    }

    pub fn selected_history(&self) -> Option<&SessionRecord> {
        self.history.get(self.history_selected)
    }

    /// Reset per-session inputs after the session is saved or discarded.
    pub fn clear_session(&mut self) {
        self.draft = None;
        self.reflection = Reflection::default();
        self.distraction_cursor = 0;
        self.snapshot = TimerSnapshot {
            elapsed_seconds: 0,
            running: false,
            pomodoro: None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str) -> SessionRecord {
        SessionRecord {
            session_id: id.into(),
            timestamp_utc: String::new(),
            title: "Music".into(),
            session_type: "Free Session".into(),
            plan: None,
            reflection: None,
            focus_score: 5,
            distractions: Vec::new(),
            started_at_utc: String::new(),
            ended_at_utc: String::new(),
            duration_seconds: 60,
            is_pomodoro: false,
            work_seconds: None,
            break_seconds: None,
            segments_completed: 0,
        }
    }

    #[test]
    fn minutes_never_drop_below_one() {
        assert_eq!(step_minutes(25 * 60, 1), 26 * 60);
        assert_eq!(step_minutes(60, -1), 60);
        assert_eq!(step_minutes(30, 1), 120);
    }

    #[test]
    fn edit_commit_trims_and_clears_optional() {
        let mut s = UiState::default();
        s.begin_edit(EditField::Title);
        s.input = "  Economics ".into();
        assert_eq!(s.commit_edit(), Some(EditField::Title));
        assert_eq!(s.details.title, "Economics");

        s.details.plan = Some("old".into());
        s.begin_edit(EditField::Plan);
        assert_eq!(s.input, "old");
        s.input = "   ".into();
        s.commit_edit();
        assert_eq!(s.details.plan, None);
        assert_eq!(s.commit_edit(), None);
    }

    #[test]
    fn focus_and_distractions() {
        let mut s = UiState::default();
        for _ in 0..20 {
            s.adjust_focus(1);
        }
        assert_eq!(s.reflection.focus_score, 10);
        s.adjust_focus(-15);
        assert_eq!(s.reflection.focus_score, 1);

        s.move_distraction_cursor(-1);
        assert_eq!(s.distraction_cursor, PREDEFINED_DISTRACTIONS.len() - 1);
        s.toggle_selected_distraction();
        assert_eq!(s.reflection.distractions, vec!["People".to_string()]);
        s.toggle_selected_distraction();
        assert!(s.reflection.distractions.is_empty());
    }

    #[test]
    fn history_selection_scrolls() {
        let mut s = UiState::default();
        s.set_history((0..10).map(|i| rec(&i.to_string())).collect());
        s.select_history(5, 3);
        assert_eq!(s.history_selected, 5);
        assert_eq!(s.history_scroll_offset, 3);
        s.select_history(100, 3);
        assert_eq!(s.history_selected, 9);
        s.select_history(-9, 3);
        assert_eq!(s.history_scroll_offset, 0);

        s.history_selected = 9;
        s.set_history(vec![rec("a")]);
        assert_eq!(s.history_selected, 0);
        assert_eq!(s.selected_history().unwrap().session_id, "a");
    }
}
