//! Interactive setup screen.
//!
//! The screen edits three fields: wake time, sunrise duration and final color
//! temperature. Its behavior lives in [`SetupState`], a small state machine
//! over the selected field and an index into each field's option list, so it
//! can be tested without a terminal. [`run_setup_screen`] is the crossterm
//! driver around it.

use anyhow::Result;
use chrono::{Duration as ChronoDuration, NaiveTime};
use crossterm::{
    ExecutableCommand,
    cursor::{Hide, MoveUp, Show},
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    style::{Print, Stylize},
    terminal::{self, Clear, ClearType},
};
use std::io::{Write, stdout};

use crate::constants::{
    DEFAULT_PROFILE, SETUP_DEFAULT_DURATION_INDEX, SETUP_DEFAULT_END_TEMP_INDEX,
    SETUP_DEFAULT_WAKE_TIME, SETUP_DURATION_OPTIONS, SETUP_END_TEMP_OPTIONS,
    SETUP_WAKE_STEP_MINUTES,
};
use crate::profiles::profile_for_duration;
use crate::schedule::{Anchor, ScheduleRequest, parse_clock_time};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    WakeTime,
    Duration,
    EndTemp,
}

impl Field {
    const ALL: [Field; 3] = [Field::WakeTime, Field::Duration, Field::EndTemp];

    fn position(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    fn label(self) -> &'static str {
        match self {
            Field::WakeTime => "Wake Time",
            Field::Duration => "Duration",
            Field::EndTemp => "End Temp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupAction {
    Up,
    Down,
    Left,
    Right,
    Confirm,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupEvent {
    Changed,
    Confirmed,
    Quit,
}

/// Move `index` by `delta` within `0..len`, stopping at either end.
fn step_bounded(index: usize, delta: isize, len: usize) -> usize {
    index
        .saturating_add_signed(delta)
        .min(len.saturating_sub(1))
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetupState {
    pub selected: Field,
    pub wake_time: NaiveTime,
    pub duration_index: usize,
    pub end_temp_index: usize,
}

impl Default for SetupState {
    fn default() -> Self {
        Self {
            selected: Field::WakeTime,
            wake_time: parse_clock_time(SETUP_DEFAULT_WAKE_TIME)
                .unwrap_or(NaiveTime::MIN),
            duration_index: SETUP_DEFAULT_DURATION_INDEX,
            end_temp_index: SETUP_DEFAULT_END_TEMP_INDEX,
        }
    }
}

impl SetupState {
    pub fn with_wake_time(wake_time: NaiveTime) -> Self {
        Self {
            wake_time,
            ..Self::default()
        }
    }

    pub fn apply(&mut self, action: SetupAction) -> SetupEvent {
        match action {
            SetupAction::Up => self.move_selection(-1),
            SetupAction::Down => self.move_selection(1),
            SetupAction::Left => self.adjust(-1),
            SetupAction::Right => self.adjust(1),
            SetupAction::Confirm => return SetupEvent::Confirmed,
            SetupAction::Quit => return SetupEvent::Quit,
        }
        SetupEvent::Changed
    }

    fn move_selection(&mut self, delta: isize) {
        let index = step_bounded(self.selected.position(), delta, Field::ALL.len());
        self.selected = Field::ALL[index];
    }

    fn adjust(&mut self, delta: isize) {
        match self.selected {
            Field::WakeTime => {
                let minutes = SETUP_WAKE_STEP_MINUTES * delta as i64;
                // NaiveTime arithmetic wraps over midnight
                self.wake_time = self.wake_time + ChronoDuration::minutes(minutes);
            }
            Field::Duration => {
                self.duration_index =
                    step_bounded(self.duration_index, delta, SETUP_DURATION_OPTIONS.len());
            }
            Field::EndTemp => {
                self.end_temp_index =
                    step_bounded(self.end_temp_index, delta, SETUP_END_TEMP_OPTIONS.len());
            }
        }
    }

    pub fn duration_minutes(&self) -> u32 {
        SETUP_DURATION_OPTIONS[self.duration_index]
    }

    pub fn end_temperature(&self) -> u16 {
        SETUP_END_TEMP_OPTIONS[self.end_temp_index]
    }

    /// When the light starts rising.
    pub fn start_time(&self) -> NaiveTime {
        self.wake_time - ChronoDuration::minutes(i64::from(self.duration_minutes()))
    }

    pub fn profile_name(&self) -> &'static str {
        profile_for_duration(self.duration_minutes()).unwrap_or(DEFAULT_PROFILE)
    }

    /// The sunrise this screen describes, finishing at the wake time.
    pub fn to_request(&self, address: &str) -> ScheduleRequest {
        ScheduleRequest::new(
            address,
            self.profile_name(),
            Anchor::CompleteAt(self.wake_time.format("%H:%M").to_string()),
        )
        .with_end_temperature(Some(self.end_temperature()))
    }

    fn field_value(&self, field: Field) -> String {
        match field {
            Field::WakeTime => self.wake_time.format("%H:%M").to_string(),
            Field::Duration => format!("{} min", self.duration_minutes()),
            Field::EndTemp => format!("{}K", self.end_temperature()),
        }
    }
}

fn action_for_key(code: KeyCode, modifiers: KeyModifiers) -> Option<SetupAction> {
    match code {
        KeyCode::Up | KeyCode::Char('k') => Some(SetupAction::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(SetupAction::Down),
        KeyCode::Left | KeyCode::Char('h') => Some(SetupAction::Left),
        KeyCode::Right | KeyCode::Char('l') => Some(SetupAction::Right),
        KeyCode::Enter => Some(SetupAction::Confirm),
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(SetupAction::Quit),
        KeyCode::Esc | KeyCode::Char('q') => Some(SetupAction::Quit),
        _ => None,
    }
}

const SCREEN_LINES: u16 = 8;

fn draw(state: &SetupState, lamp_status: &str) -> Result<()> {
    let mut stdout = stdout();
    stdout.execute(Clear(ClearType::FromCursorDown))?;
    stdout.execute(Print("┃\r\n"))?;

    for field in Field::ALL {
        let value = state.field_value(field);
        if field == state.selected {
            stdout.execute(Print(format!(
                "┃ ▶ {:<10} ◀ {} ▶\r\n",
                field.label(),
                value.as_str().yellow().bold()
            )))?;
        } else {
            stdout.execute(Print(format!("┃   {:<10}   {}\r\n", field.label(), value)))?;
        }
    }

    stdout.execute(Print("┃\r\n"))?;
    stdout.execute(Print(format!(
        "┃ Sunrise {} → {} ({})\r\n",
        state.start_time().format("%H:%M"),
        state.wake_time.format("%H:%M"),
        state.profile_name()
    )))?;
    stdout.execute(Print(format!("┃ Lamp: {lamp_status}\r\n")))?;
    stdout.execute(Print("┃ ↑/↓ select, ←/→ adjust, Enter start, q quit\r\n"))?;
    stdout.flush()?;
    stdout.execute(MoveUp(SCREEN_LINES))?;
    Ok(())
}

/// Run the screen until the user confirms or quits.
///
/// Returns the final state on confirm, `None` on quit.
pub fn run_setup_screen(initial: SetupState, lamp_status: &str) -> Result<Option<SetupState>> {
    let mut state = initial;
    let mut stdout = stdout();
    stdout.flush()?;
    terminal::enable_raw_mode()?;
    stdout.execute(Hide)?;

    let result = loop {
        if let Err(e) = draw(&state, lamp_status) {
            break Err(e);
        }

        let key = match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => key,
            Ok(_) => continue,
            Err(e) => break Err(e.into()),
        };

        let Some(action) = action_for_key(key.code, key.modifiers) else {
            continue;
        };
        match state.apply(action) {
            SetupEvent::Changed => {}
            SetupEvent::Confirmed => break Ok(Some(state.clone())),
            SetupEvent::Quit => break Ok(None),
        }
    };

    let _ = stdout.execute(Clear(ClearType::FromCursorDown));
    terminal::disable_raw_mode()?;
    stdout.execute(Show)?;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_defaults() {
        let state = SetupState::default();
        assert_eq!(state.selected, Field::WakeTime);
        assert_eq!(state.wake_time, time(7, 0));
        assert_eq!(state.duration_minutes(), 30);
        assert_eq!(state.end_temperature(), 4000);
        assert_eq!(state.start_time(), time(6, 30));
        assert_eq!(state.profile_name(), "standard");
    }

    #[test]
    fn test_selection_is_clamped() {
        let mut state = SetupState::default();
        state.apply(SetupAction::Up);
        assert_eq!(state.selected, Field::WakeTime);

        state.apply(SetupAction::Down);
        state.apply(SetupAction::Down);
        state.apply(SetupAction::Down);
        assert_eq!(state.selected, Field::EndTemp);
    }

    #[test]
    fn test_wake_time_wraps_over_midnight() {
        let mut state = SetupState::with_wake_time(time(23, 55));
        state.apply(SetupAction::Right);
        assert_eq!(state.wake_time, time(0, 0));
        state.apply(SetupAction::Left);
        state.apply(SetupAction::Left);
        assert_eq!(state.wake_time, time(23, 50));
    }

    #[test]
    fn test_duration_options_and_profile_mapping() {
        let mut state = SetupState::default();
        state.apply(SetupAction::Down);

        state.apply(SetupAction::Left);
        assert_eq!(state.duration_minutes(), 20);
        assert_eq!(state.profile_name(), "quick");
        state.apply(SetupAction::Left);
        assert_eq!(state.duration_minutes(), 20);

        state.apply(SetupAction::Right);
        state.apply(SetupAction::Right);
        assert_eq!(state.duration_minutes(), 45);
        assert_eq!(state.profile_name(), "gentle");
        assert_eq!(state.start_time(), time(6, 15));
        state.apply(SetupAction::Right);
        assert_eq!(state.duration_minutes(), 45);
    }

    #[test]
    fn test_end_temperature_clamped_at_ends() {
        let mut state = SetupState::default();
        state.apply(SetupAction::Down);
        state.apply(SetupAction::Down);

        state.apply(SetupAction::Left);
        assert_eq!(state.end_temperature(), 4000);
        for _ in 0..10 {
            state.apply(SetupAction::Right);
        }
        assert_eq!(state.end_temperature(), 6500);
    }

    #[test]
    fn test_start_time_wraps_before_midnight() {
        let state = SetupState::with_wake_time(time(0, 10));
        assert_eq!(state.start_time(), time(23, 40));
    }

    #[test]
    fn test_confirm_and_quit() {
        let mut state = SetupState::default();
        assert_eq!(state.apply(SetupAction::Confirm), SetupEvent::Confirmed);
        assert_eq!(state.apply(SetupAction::Quit), SetupEvent::Quit);
        assert_eq!(state.apply(SetupAction::Right), SetupEvent::Changed);
    }

    #[test]
    fn test_to_request() {
        let mut state = SetupState::with_wake_time(time(6, 45));
        state.apply(SetupAction::Down);
        state.apply(SetupAction::Down);
        state.apply(SetupAction::Right);

        let request = state.to_request("10.0.0.4");
        assert_eq!(request.address, "10.0.0.4");
        assert_eq!(request.profile, "standard");
        assert_eq!(request.anchor, Anchor::CompleteAt("06:45".into()));
        assert_eq!(request.end_temperature, Some(4500));
    }

    #[test]
    fn test_key_bindings() {
        let none = KeyModifiers::NONE;
        assert_eq!(action_for_key(KeyCode::Up, none), Some(SetupAction::Up));
        assert_eq!(action_for_key(KeyCode::Char('l'), none), Some(SetupAction::Right));
        assert_eq!(action_for_key(KeyCode::Enter, none), Some(SetupAction::Confirm));
        assert_eq!(action_for_key(KeyCode::Esc, none), Some(SetupAction::Quit));
        assert_eq!(
            action_for_key(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(SetupAction::Quit)
        );
        assert_eq!(action_for_key(KeyCode::Char('c'), none), None);
    }
}
