//! User-tunable timer settings.
//!
//! The same struct travels over the wire (camelCase JSON), into the local
//! cache, and into the engine. Missing fields fall back to the built-in
//! defaults so a partial payload from the server is still usable.

use serde::{Deserialize, Serialize};

use super::TimerMode;
use crate::error::ValidationError;

pub const DEFAULT_FOCUS_MIN: u32 = 25;
pub const DEFAULT_SHORT_BREAK_MIN: u32 = 5;
pub const DEFAULT_LONG_BREAK_MIN: u32 = 15;
pub const DEFAULT_LONG_BREAK_INTERVAL: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSettings {
    /// Minutes.
    #[serde(default = "default_focus_duration")]
    pub focus_duration: u32,
    /// Minutes.
    #[serde(default = "default_short_break")]
    pub short_break_duration: u32,
    /// Minutes.
    #[serde(default = "default_long_break")]
    pub long_break_duration: u32,
    /// Focus sessions before a long break.
    #[serde(default = "default_long_break_interval")]
    pub long_break_interval: u32,
    #[serde(default)]
    pub auto_start_breaks: bool,
    #[serde(default)]
    pub auto_start_pomodoros: bool,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    /// 0-100.
    #[serde(default = "default_volume")]
    pub sound_volume: u8,
}

fn default_focus_duration() -> u32 {
    DEFAULT_FOCUS_MIN
}
fn default_short_break() -> u32 {
    DEFAULT_SHORT_BREAK_MIN
}
fn default_long_break() -> u32 {
    DEFAULT_LONG_BREAK_MIN
}
fn default_long_break_interval() -> u32 {
    DEFAULT_LONG_BREAK_INTERVAL
}
fn default_true() -> bool {
    true
}
fn default_volume() -> u8 {
    50
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus_duration: DEFAULT_FOCUS_MIN,
            short_break_duration: DEFAULT_SHORT_BREAK_MIN,
            long_break_duration: DEFAULT_LONG_BREAK_MIN,
            long_break_interval: DEFAULT_LONG_BREAK_INTERVAL,
            auto_start_breaks: false,
            auto_start_pomodoros: false,
            sound_enabled: true,
            sound_volume: 50,
        }
    }
}

impl TimerSettings {
    /// Configured duration of `mode` in minutes.
    pub fn duration_min(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Focus => self.focus_duration,
            TimerMode::ShortBreak => self.short_break_duration,
            TimerMode::LongBreak => self.long_break_duration,
        }
    }

    /// Configured duration of `mode` in seconds.
    pub fn duration_secs(&self, mode: TimerMode) -> u64 {
        u64::from(self.duration_min(mode)).saturating_mul(60)
    }

    /// Whether entering `mode` after a completion should start it automatically.
    pub fn auto_starts(&self, mode: TimerMode) -> bool {
        if mode.is_break() {
            self.auto_start_breaks
        } else {
            self.auto_start_pomodoros
        }
    }

    /// # Errors
    ///
    /// Returns the first field that violates its range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("focusDuration", self.focus_duration),
            ("shortBreakDuration", self.short_break_duration),
            ("longBreakDuration", self.long_break_duration),
        ] {
            if value == 0 {
                return Err(ValidationError::invalid(field, "must be at least 1 minute"));
            }
        }
        if self.long_break_interval < 2 {
            return Err(ValidationError::invalid(
                "longBreakInterval",
                format!("must be at least 2, got {}", self.long_break_interval),
            ));
        }
        if self.sound_volume > 100 {
            return Err(ValidationError::invalid(
                "soundVolume",
                format!("must be between 0 and 100, got {}", self.sound_volume),
            ));
        }
        Ok(())
    }
}
