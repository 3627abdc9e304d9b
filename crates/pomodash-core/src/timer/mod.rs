mod engine;
mod mode;
mod settings;

pub use engine::{OpenSession, TimerEngine, TimerSnapshot};
pub use mode::TimerMode;
pub use settings::{
    TimerSettings, DEFAULT_FOCUS_MIN, DEFAULT_LONG_BREAK_INTERVAL, DEFAULT_LONG_BREAK_MIN,
    DEFAULT_SHORT_BREAK_MIN,
};
