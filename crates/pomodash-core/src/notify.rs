//! Completion side effects (sound, desktop notifications).
//!
//! Kept outside the engine: the controller calls the notifier after a
//! completion has already been applied.

use std::io::Write;

use crate::timer::{TimerMode, TimerSettings};

pub trait Notifier: Send + Sync {
    /// `finished` just ran out; the engine is now in `next`.
    fn mode_completed(&self, finished: TimerMode, next: TimerMode, settings: &TimerSettings);
}

/// Prints a line to stderr and rings the terminal bell when sound is on.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl TerminalNotifier {
    fn message(finished: TimerMode, next: TimerMode) -> String {
        match finished {
            TimerMode::Focus => format!("Focus session done. Time for a {}.", next.label().to_lowercase()),
            TimerMode::ShortBreak | TimerMode::LongBreak => "Break over. Back to focus.".to_string(),
        }
    }
}

impl Notifier for TerminalNotifier {
    fn mode_completed(&self, finished: TimerMode, next: TimerMode, settings: &TimerSettings) {
        let mut stderr = std::io::stderr().lock();
        let bell = if settings.sound_enabled && settings.sound_volume > 0 {
            "\x07"
        } else {
            ""
        };
        // Nothing useful to do if stderr is gone.
        let _ = writeln!(stderr, "{bell}{}", Self::message(finished, next));
    }
}
