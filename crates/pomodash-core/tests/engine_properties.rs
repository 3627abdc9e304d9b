//! Property tests for the timer engine's arithmetic and mode sequencing.

use pomodash_core::{Event, TimerEngine, TimerMode, TimerSettings};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Start,
    Pause,
    Reset,
    Skip,
    Tick(u16),
    Interrupt,
    Complete,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Start),
        Just(Op::Pause),
        Just(Op::Reset),
        Just(Op::Skip),
        (1u16..400).prop_map(Op::Tick),
        Just(Op::Interrupt),
        Just(Op::Complete),
    ]
}

fn settings() -> impl Strategy<Value = TimerSettings> {
    (1u32..=90, 1u32..=30, 1u32..=60, 2u32..=8, any::<bool>(), any::<bool>()).prop_map(
        |(focus, short, long, interval, auto_breaks, auto_pomodoros)| TimerSettings {
            focus_duration: focus,
            short_break_duration: short,
            long_break_duration: long,
            long_break_interval: interval,
            auto_start_breaks: auto_breaks,
            auto_start_pomodoros: auto_pomodoros,
            ..TimerSettings::default()
        },
    )
}

fn apply(engine: &mut TimerEngine, op: &Op) -> Vec<Event> {
    match op {
        Op::Start => engine.start(),
        Op::Pause => engine.pause(),
        Op::Reset => engine.reset(),
        Op::Skip => engine.skip(),
        Op::Tick(n) => (0..*n).flat_map(|_| engine.tick()).collect(),
        Op::Interrupt => engine.interrupt().into_iter().collect(),
        Op::Complete => engine.complete(),
    }
}

proptest! {
    #[test]
    fn total_time_matches_configured_minutes(s in settings(), skips in 0usize..12) {
        let mut engine = TimerEngine::new(s.clone());
        for _ in 0..skips {
            engine.skip();
        }
        let expected = u64::from(s.duration_min(engine.mode())) * 60;
        prop_assert_eq!(engine.total_time(), expected);
        prop_assert_eq!(engine.time_left(), expected);
    }

    #[test]
    fn every_nth_focus_completion_is_a_long_break(s in settings(), rounds in 1u32..25) {
        let interval = s.long_break_interval;
        let mut engine = TimerEngine::new(s);
        for k in 1..=rounds {
            prop_assert_eq!(engine.mode(), TimerMode::Focus);
            engine.start();
            engine.complete();
            let expected = if k % interval == 0 { TimerMode::LongBreak } else { TimerMode::ShortBreak };
            prop_assert_eq!(engine.mode(), expected);
            if expected == TimerMode::LongBreak {
                prop_assert_eq!(engine.sessions_until_long_break(), interval);
            }
            // Leave the break without counting a focus session.
            engine.skip();
        }
        prop_assert_eq!(engine.session_count(), rounds);
    }

    #[test]
    fn invariants_hold_under_any_sequence(s in settings(), ops in prop::collection::vec(op(), 0..60)) {
        let mut engine = TimerEngine::new(s);
        let mut last_count = 0;
        for op in &ops {
            apply(&mut engine, op);
            prop_assert!(engine.time_left() <= engine.total_time());
            if engine.time_left() == 0 {
                prop_assert!(!engine.is_active());
            }
            prop_assert!(engine.session_count() >= last_count);
            prop_assert_eq!(engine.is_active(), engine.current_session().is_some());
            last_count = engine.session_count();
        }
    }

    #[test]
    fn reset_always_restores_full_time(s in settings(), ops in prop::collection::vec(op(), 0..40)) {
        let mut engine = TimerEngine::new(s);
        for op in &ops {
            apply(&mut engine, op);
        }
        engine.reset();
        prop_assert!(!engine.is_active());
        prop_assert_eq!(engine.time_left(), engine.total_time());
        prop_assert_eq!(engine.interruptions(), 0);
    }

    #[test]
    fn start_is_rejected_while_running(s in settings(), ticks in 0u16..30) {
        let mut engine = TimerEngine::new(s);
        prop_assert!(!engine.start().is_empty());
        for _ in 0..ticks {
            engine.tick();
        }
        let before = engine.snapshot();
        prop_assert!(engine.start().is_empty());
        prop_assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn sessions_open_and_close_in_pairs(s in settings(), ops in prop::collection::vec(op(), 0..60)) {
        let mut engine = TimerEngine::new(s);
        let mut open = None;
        for op in &ops {
            for event in apply(&mut engine, op) {
                match event {
                    Event::SessionOpened { local_id, .. } => {
                        prop_assert!(open.is_none());
                        open = Some(local_id);
                    }
                    Event::SessionClosed { local_id, .. } => {
                        prop_assert_eq!(open.take(), Some(local_id));
                    }
                    _ => {}
                }
            }
        }
    }
}

#[test]
fn classic_four_session_cycle() {
    let mut engine = TimerEngine::new(TimerSettings::default());
    let mut seen = Vec::new();
    for _ in 0..4 {
        engine.start();
        while engine.is_active() {
            engine.tick();
        }
        seen.push((engine.mode(), engine.sessions_until_long_break()));
        engine.skip();
    }
    assert_eq!(
        seen,
        vec![
            (TimerMode::ShortBreak, 3),
            (TimerMode::ShortBreak, 2),
            (TimerMode::ShortBreak, 1),
            (TimerMode::LongBreak, 4),
        ]
    );
}
