//! Timer engine implementation.
//!
//! The engine is a synchronous, single-owner state machine. It keeps no
//! clock and spawns nothing: the owner calls `tick()` once per elapsed
//! second while the timer is active and forwards the returned events.
//!
//! ## State Transitions
//!
//! ```text
//! (Focus | ShortBreak | LongBreak) x (Active | Paused)
//!
//! Paused --start--> Active --pause--> Paused
//! Active --tick(0)--> complete --> next mode, Paused (auto-start optional)
//! any    --skip--> next mode, Paused
//! any    --reset--> same mode, Paused, full time
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerSettings::default());
//! let events = engine.start();
//! // once per second:
//! let events = engine.tick(); // contains TimerCompleted when the mode ends
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::{TimerMode, TimerSettings};
use crate::events::Event;

/// The session record currently open against the running mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSession {
    pub local_id: Uuid,
    pub mode: TimerMode,
    pub start_time: DateTime<Utc>,
}

/// Immutable view of the engine handed to front ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub mode: TimerMode,
    pub is_active: bool,
    pub time_left: u64,
    pub total_time: u64,
    pub session_count: u32,
    pub sessions_until_long_break: u32,
    pub interruptions: u32,
    /// 0.0 .. 1.0 progress within the current mode.
    pub progress: f64,
}

/// Core timer engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    settings: TimerSettings,
    mode: TimerMode,
    is_active: bool,
    /// Seconds.
    time_left: u64,
    /// Seconds.
    total_time: u64,
    session_count: u32,
    sessions_until_long_break: u32,
    interruptions: u32,
    current_session: Option<OpenSession>,
    /// Bumped by every transition except plain ticks.
    epoch: u64,
}

impl TimerEngine {
    /// Create an engine in `Focus`, paused, with the full focus duration left.
    pub fn new(settings: TimerSettings) -> Self {
        let total_time = settings.duration_secs(TimerMode::Focus);
        let sessions_until_long_break = settings.long_break_interval;
        Self {
            settings,
            mode: TimerMode::Focus,
            is_active: false,
            time_left: total_time,
            total_time,
            session_count: 0,
            sessions_until_long_break,
            interruptions: 0,
            current_session: None,
            epoch: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn time_left(&self) -> u64 {
        self.time_left
    }

    pub fn total_time(&self) -> u64 {
        self.total_time
    }

    pub fn session_count(&self) -> u32 {
        self.session_count
    }

    pub fn sessions_until_long_break(&self) -> u32 {
        self.sessions_until_long_break
    }

    pub fn interruptions(&self) -> u32 {
        self.interruptions
    }

    pub fn current_session(&self) -> Option<&OpenSession> {
        self.current_session.as_ref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether `start()` would be accepted right now.
    pub fn can_start(&self) -> bool {
        !self.is_active && self.time_left > 0
    }

    /// 0.0 .. 1.0 progress within the current mode.
    pub fn progress(&self) -> f64 {
        if self.total_time == 0 {
            return 0.0;
        }
        1.0 - (self.time_left as f64 / self.total_time as f64)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            mode: self.mode,
            is_active: self.is_active,
            time_left: self.time_left,
            total_time: self.total_time,
            session_count: self.session_count,
            sessions_until_long_break: self.sessions_until_long_break,
            interruptions: self.interruptions,
            progress: self.progress(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start the current mode and open a session record.
    ///
    /// Returns no events when the timer is already active or has no time left.
    pub fn start(&mut self) -> Vec<Event> {
        if !self.can_start() {
            debug!(
                mode = %self.mode,
                active = self.is_active,
                time_left = self.time_left,
                "start rejected"
            );
            return Vec::new();
        }

        let now = Utc::now();
        self.is_active = true;
        self.epoch += 1;
        let session = OpenSession {
            local_id: Uuid::new_v4(),
            mode: self.mode,
            start_time: now,
        };
        let opened = Event::SessionOpened {
            local_id: session.local_id,
            mode: session.mode,
            start_time: session.start_time,
            interruptions: self.interruptions,
        };
        self.current_session = Some(session);
        debug!(mode = %self.mode, time_left = self.time_left, "timer started");

        vec![
            opened,
            Event::TimerStarted {
                mode: self.mode,
                time_left_secs: self.time_left,
                at: now,
            },
        ]
    }

    /// Pause the running mode and close its session as incomplete.
    ///
    /// Pausing a focus session counts as one interruption.
    pub fn pause(&mut self) -> Vec<Event> {
        if !self.is_active {
            return Vec::new();
        }

        self.is_active = false;
        self.epoch += 1;
        if self.mode == TimerMode::Focus {
            self.interruptions += 1;
        }

        let mut events = Vec::with_capacity(2);
        events.extend(self.close_session(false));
        events.push(Event::TimerPaused {
            mode: self.mode,
            time_left_secs: self.time_left,
            at: Utc::now(),
        });
        debug!(mode = %self.mode, time_left = self.time_left, "timer paused");
        events
    }

    /// Stop, refill the current mode, and drop the interruption count.
    pub fn reset(&mut self) -> Vec<Event> {
        self.is_active = false;
        self.epoch += 1;

        let mut events = Vec::with_capacity(2);
        events.extend(self.close_session(false));

        self.total_time = self.settings.duration_secs(self.mode);
        self.time_left = self.total_time;
        self.interruptions = 0;

        events.push(Event::TimerReset {
            mode: self.mode,
            time_left_secs: self.time_left,
            at: Utc::now(),
        });
        debug!(mode = %self.mode, "timer reset");
        events
    }

    /// Abandon the current mode and move on to the next one, paused.
    pub fn skip(&mut self) -> Vec<Event> {
        let from_mode = self.mode;
        self.is_active = false;
        self.epoch += 1;

        let mut events = Vec::with_capacity(2);
        events.extend(self.close_session(false));

        self.switch_to_next_mode();
        self.interruptions = 0;

        events.push(Event::TimerSkipped {
            from_mode,
            to_mode: self.mode,
            at: Utc::now(),
        });
        debug!(from = %from_mode, to = %self.mode, "timer skipped");
        events
    }

    /// Call once per elapsed second. Completes the mode when time runs out.
    ///
    /// A tick while paused does nothing, so a late tick from a cancelled
    /// ticker cannot advance the engine twice.
    pub fn tick(&mut self) -> Vec<Event> {
        if !self.is_active {
            return Vec::new();
        }

        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            self.is_active = false;
            return self.complete();
        }
        Vec::new()
    }

    /// Close the session as completed and advance to the next mode.
    pub fn complete(&mut self) -> Vec<Event> {
        let finished = self.mode;
        self.is_active = false;

        let mut events = Vec::with_capacity(2);
        events.extend(self.close_session(true));

        self.switch_to_next_mode();
        self.interruptions = 0;
        self.epoch += 1;

        let auto_start = self.settings.auto_starts(self.mode);
        events.push(Event::TimerCompleted {
            mode: finished,
            next_mode: self.mode,
            session_count: self.session_count,
            auto_start,
            epoch: self.epoch,
            at: Utc::now(),
        });
        debug!(
            finished = %finished,
            next = %self.mode,
            session_count = self.session_count,
            auto_start,
            "mode completed"
        );
        events
    }

    /// Start the current mode on behalf of a delayed auto-start.
    ///
    /// Ignored when any transition happened since `epoch` was observed.
    pub fn auto_start(&mut self, epoch: u64) -> Vec<Event> {
        if self.epoch != epoch {
            debug!(expected = epoch, actual = self.epoch, "stale auto-start ignored");
            return Vec::new();
        }
        self.start()
    }

    /// Count an interruption against the running session without pausing it.
    pub fn interrupt(&mut self) -> Option<Event> {
        if !self.is_active {
            return None;
        }
        self.interruptions += 1;
        Some(Event::InterruptionRecorded {
            mode: self.mode,
            interruptions: self.interruptions,
            at: Utc::now(),
        })
    }

    /// Replace the settings.
    ///
    /// A paused timer picks up the new duration for its current mode at
    /// once. A running timer keeps its remaining time; the new durations
    /// apply from the next mode entry.
    pub fn apply_settings(&mut self, settings: TimerSettings) {
        self.settings = settings;
        let interval = self.settings.long_break_interval;
        if self.sessions_until_long_break > interval {
            self.sessions_until_long_break = interval;
        }
        if !self.is_active {
            self.total_time = self.settings.duration_secs(self.mode);
            self.time_left = self.total_time;
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn close_session(&mut self, completed: bool) -> Option<Event> {
        let session = self.current_session.take()?;
        Some(Event::SessionClosed {
            local_id: session.local_id,
            mode: session.mode,
            end_time: Utc::now(),
            completed,
            interruptions: self.interruptions,
        })
    }

    fn switch_to_next_mode(&mut self) {
        let interval = self.settings.long_break_interval.max(1);
        self.mode = match self.mode {
            TimerMode::Focus => {
                self.session_count += 1;
                if self.session_count % interval == 0 {
                    self.sessions_until_long_break = interval;
                    TimerMode::LongBreak
                } else {
                    self.sessions_until_long_break = self.sessions_until_long_break.saturating_sub(1);
                    TimerMode::ShortBreak
                }
            }
            TimerMode::ShortBreak | TimerMode::LongBreak => TimerMode::Focus,
        };
        self.total_time = self.settings.duration_secs(self.mode);
        self.time_left = self.total_time;
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(TimerSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(focus: u32, short: u32, long: u32, interval: u32) -> TimerSettings {
        TimerSettings {
            focus_duration: focus,
            short_break_duration: short,
            long_break_duration: long,
            long_break_interval: interval,
            ..TimerSettings::default()
        }
    }

    fn run_out(engine: &mut TimerEngine) -> Vec<Event> {
        engine.start();
        let mut all = Vec::new();
        while engine.is_active() {
            all.extend(engine.tick());
        }
        all
    }

    #[test]
    fn initial_state_is_paused_focus() {
        let engine = TimerEngine::default();
        assert_eq!(engine.mode(), TimerMode::Focus);
        assert!(!engine.is_active());
        assert_eq!(engine.time_left(), 25 * 60);
        assert_eq!(engine.total_time(), 25 * 60);
        assert_eq!(engine.sessions_until_long_break(), 4);
        assert!(engine.current_session().is_none());
    }

    #[test]
    fn start_opens_session_and_rejects_double_start() {
        let mut engine = TimerEngine::default();
        let events = engine.start();
        assert!(matches!(events[0], Event::SessionOpened { mode: TimerMode::Focus, .. }));
        assert!(matches!(events[1], Event::TimerStarted { .. }));
        assert!(engine.is_active());
        assert!(engine.current_session().is_some());

        assert!(engine.start().is_empty());
    }

    #[test]
    fn start_with_no_time_left_is_a_noop() {
        let mut engine = TimerEngine::new(settings(0, 5, 15, 4));
        assert_eq!(engine.time_left(), 0);
        assert!(!engine.can_start());

        assert!(engine.start().is_empty());
        assert!(!engine.is_active());
        assert!(engine.current_session().is_none());
        assert_eq!(engine.epoch(), 0);
    }

    #[test]
    fn pause_closes_session_as_incomplete() {
        let mut engine = TimerEngine::default();
        engine.start();
        let events = engine.pause();
        assert!(matches!(
            events[0],
            Event::SessionClosed { completed: false, interruptions: 1, .. }
        ));
        assert!(!engine.is_active());
        assert!(engine.current_session().is_none());
    }

    #[test]
    fn pause_while_paused_is_a_noop() {
        let mut engine = TimerEngine::default();
        let before = engine.snapshot();
        assert!(engine.pause().is_empty());
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn reset_refills_and_clears_interruptions() {
        let mut engine = TimerEngine::new(settings(1, 1, 1, 2));
        engine.start();
        engine.tick();
        engine.interrupt();
        let events = engine.reset();
        assert!(matches!(events[0], Event::SessionClosed { completed: false, .. }));
        assert_eq!(engine.time_left(), engine.total_time());
        assert_eq!(engine.interruptions(), 0);
        assert!(!engine.is_active());
    }

    #[test]
    fn reset_without_session_emits_only_reset() {
        let mut engine = TimerEngine::default();
        let events = engine.reset();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::TimerReset { .. }));
    }

    #[test]
    fn skip_advances_without_completing() {
        let mut engine = TimerEngine::default();
        engine.start();
        let events = engine.skip();
        assert!(matches!(events[0], Event::SessionClosed { completed: false, .. }));
        assert!(matches!(
            events[1],
            Event::TimerSkipped { from_mode: TimerMode::Focus, to_mode: TimerMode::ShortBreak, .. }
        ));
        assert_eq!(engine.mode(), TimerMode::ShortBreak);
        assert_eq!(engine.time_left(), 5 * 60);
        assert!(!engine.is_active());
    }

    #[test]
    fn tick_at_one_second_completes_exactly_once() {
        let mut engine = TimerEngine::new(settings(1, 5, 15, 4));
        engine.start();
        for _ in 0..59 {
            assert!(engine.tick().is_empty());
        }
        assert_eq!(engine.time_left(), 1);

        let events = engine.tick();
        let completions = events
            .iter()
            .filter(|e| matches!(e, Event::TimerCompleted { .. }))
            .count();
        assert_eq!(completions, 1);
        assert!(matches!(events[0], Event::SessionClosed { completed: true, .. }));
        assert_eq!(engine.mode(), TimerMode::ShortBreak);

        // A stale tick after completion must not advance again.
        assert!(engine.tick().is_empty());
        assert_eq!(engine.mode(), TimerMode::ShortBreak);
        assert_eq!(engine.session_count(), 1);
    }

    #[test]
    fn four_focus_sessions_end_in_long_break() {
        let mut engine = TimerEngine::new(settings(25, 5, 15, 4));
        let mut breaks = Vec::new();
        for _ in 0..4 {
            run_out(&mut engine);
            breaks.push(engine.mode());
            engine.skip();
        }
        assert_eq!(
            breaks,
            vec![
                TimerMode::ShortBreak,
                TimerMode::ShortBreak,
                TimerMode::ShortBreak,
                TimerMode::LongBreak
            ]
        );
        assert_eq!(engine.sessions_until_long_break(), 4);
        assert_eq!(engine.session_count(), 4);
    }

    #[test]
    fn sessions_until_long_break_counts_down() {
        let mut engine = TimerEngine::new(settings(1, 1, 1, 4));
        run_out(&mut engine);
        assert_eq!(engine.sessions_until_long_break(), 3);
        engine.skip();
        run_out(&mut engine);
        assert_eq!(engine.sessions_until_long_break(), 2);
    }

    #[test]
    fn completion_reports_auto_start_for_breaks() {
        let mut engine = TimerEngine::new(TimerSettings {
            focus_duration: 1,
            auto_start_breaks: true,
            ..TimerSettings::default()
        });
        let events = run_out(&mut engine);
        let auto = events.iter().find_map(|e| match e {
            Event::TimerCompleted { auto_start, epoch, .. } => Some((*auto_start, *epoch)),
            _ => None,
        });
        let (auto_start, epoch) = auto.expect("completion event");
        assert!(auto_start);
        assert_eq!(epoch, engine.epoch());

        let started = engine.auto_start(epoch);
        assert!(!started.is_empty());
        assert!(engine.is_active());
        assert_eq!(engine.mode(), TimerMode::ShortBreak);
    }

    #[test]
    fn stale_auto_start_is_ignored() {
        let mut engine = TimerEngine::new(TimerSettings {
            focus_duration: 1,
            auto_start_breaks: true,
            ..TimerSettings::default()
        });
        run_out(&mut engine);
        let epoch = engine.epoch();
        engine.skip();
        assert!(engine.auto_start(epoch).is_empty());
        assert!(!engine.is_active());
        assert_eq!(engine.mode(), TimerMode::Focus);
    }

    #[test]
    fn settings_change_while_paused_recomputes_time() {
        let mut engine = TimerEngine::default();
        engine.apply_settings(settings(50, 5, 15, 4));
        assert_eq!(engine.total_time(), 50 * 60);
        assert_eq!(engine.time_left(), 50 * 60);
    }

    #[test]
    fn settings_change_while_running_keeps_time_left() {
        let mut engine = TimerEngine::default();
        engine.start();
        engine.tick();
        engine.apply_settings(settings(10, 2, 3, 2));
        assert_eq!(engine.time_left(), 25 * 60 - 1);
        assert_eq!(engine.total_time(), 25 * 60);
        assert_eq!(engine.sessions_until_long_break(), 2);

        engine.skip();
        assert_eq!(engine.total_time(), 2 * 60);
    }

    #[test]
    fn interrupt_requires_running_timer() {
        let mut engine = TimerEngine::default();
        assert!(engine.interrupt().is_none());
        engine.start();
        assert!(matches!(
            engine.interrupt(),
            Some(Event::InterruptionRecorded { interruptions: 1, .. })
        ));
        assert_eq!(engine.snapshot().interruptions, 1);
    }

    #[test]
    fn snapshot_reports_progress() {
        let mut engine = TimerEngine::new(settings(1, 1, 1, 2));
        engine.start();
        for _ in 0..30 {
            engine.tick();
        }
        let snap = engine.snapshot();
        assert!(snap.is_active);
        assert_eq!(snap.time_left, 30);
        assert!((snap.progress - 0.5).abs() < f64::EPSILON);
    }
}
