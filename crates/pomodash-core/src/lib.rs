//! # Pomodash Core Library
//!
//! Core logic for the Pomodash focus timer: the Focus / Short Break /
//! Long Break state machine, settings resolution against a remote store,
//! and mirroring of session records to a remote session service.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a synchronous state machine; the owner calls
//!   `tick()` once per second while it is active
//! - **Timer Controller**: the engine's single async owner; runs the
//!   ticker, schedules auto-starts, and fans out events
//! - **Settings Resolver**: remote settings, then the local cache, then
//!   built-in defaults; optimistic saves with rollback
//! - **Session Recorder**: fire-and-forget create/update calls for each
//!   session the engine opens and closes
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TimerController`]: Ticker and event fan-out
//! - [`SettingsResolver`]: Settings reconciliation
//! - [`SessionRecorder`]: Remote session mirroring
//! - [`Config`]: Local application configuration

pub mod controller;
pub mod error;
pub mod events;
pub mod logging;
pub mod notify;
pub mod recorder;
pub mod remote;
pub mod settings_resolver;
pub mod storage;
pub mod timer;

pub use controller::{ControllerOptions, TimerController, TimerControllerBuilder};
pub use error::{ApiError, ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use notify::{Notifier, TerminalNotifier};
pub use recorder::{RecorderStats, SessionRecorder};
pub use remote::{ApiClient, SessionApi, SessionMetadata, SettingsApi};
pub use settings_resolver::{ResolvedSettings, SettingsResolver, SettingsSource};
pub use storage::{Config, LocalCache};
pub use timer::{TimerEngine, TimerMode, TimerSettings, TimerSnapshot};
