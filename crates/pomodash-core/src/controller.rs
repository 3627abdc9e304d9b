//! Async driver around [`TimerEngine`].
//!
//! The controller is the engine's only owner. It runs the one-second
//! ticker while the timer is active, schedules delayed auto-starts after a
//! completion, and fans engine events out to the session recorder, the
//! notifier and any subscribers.
//!
//! Exactly one ticker task exists at a time. Every transition away from
//! active aborts it while holding the engine lock, and each ticker carries
//! a generation number so a tick that slipped past an abort is ignored.
//!
//! Background tasks only hold a weak reference: once the last
//! [`TimerController`] handle is dropped they stop on their next wake-up.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info};

use crate::error::Result;
use crate::events::Event;
use crate::notify::Notifier;
use crate::recorder::{RecorderStats, SessionRecorder};
use crate::remote::SessionMetadata;
use crate::settings_resolver::{ResolvedSettings, SettingsResolver};
use crate::storage::TimerConfig;
use crate::timer::{TimerEngine, TimerSettings, TimerSnapshot};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub tick_interval: Duration,
    pub auto_start_delay: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            auto_start_delay: Duration::from_millis(500),
        }
    }
}

impl From<&TimerConfig> for ControllerOptions {
    fn from(config: &TimerConfig) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            auto_start_delay: config.auto_start_delay(),
        }
    }
}

struct Inner {
    engine: TimerEngine,
    ticker: Option<JoinHandle<()>>,
    ticker_generation: u64,
    auto_start: Option<JoinHandle<()>>,
    recorder: Option<SessionRecorder>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl Inner {
    fn stop_ticker(&mut self) {
        self.ticker_generation += 1;
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }

    fn cancel_auto_start(&mut self) {
        if let Some(handle) = self.auto_start.take() {
            handle.abort();
        }
    }
}

pub struct TimerControllerBuilder {
    engine: TimerEngine,
    options: ControllerOptions,
    recorder: Option<SessionRecorder>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl TimerControllerBuilder {
    pub fn options(mut self, options: ControllerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn recorder(mut self, recorder: SessionRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn build(self) -> TimerController {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        TimerController {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    engine: self.engine,
                    ticker: None,
                    ticker_generation: 0,
                    auto_start: None,
                    recorder: self.recorder,
                    notifier: self.notifier,
                }),
                events,
                options: self.options,
            }),
        }
    }
}

struct Shared {
    inner: Mutex<Inner>,
    events: broadcast::Sender<Event>,
    options: ControllerOptions,
}

#[derive(Clone)]
pub struct TimerController {
    shared: Arc<Shared>,
}

impl TimerController {
    pub fn builder(engine: TimerEngine) -> TimerControllerBuilder {
        TimerControllerBuilder {
            engine,
            options: ControllerOptions::default(),
            recorder: None,
            notifier: None,
        }
    }

    pub fn new(engine: TimerEngine, options: ControllerOptions) -> Self {
        Self::builder(engine).options(options).build()
    }

    /// Receive every event the engine emits from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.events.subscribe()
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        self.shared.inner.lock().await.engine.snapshot()
    }

    pub async fn settings(&self) -> TimerSettings {
        self.shared.inner.lock().await.engine.settings().clone()
    }

    /// Returns false when the engine refused to start.
    pub async fn start(&self) -> bool {
        let mut inner = self.shared.inner.lock().await;
        inner.cancel_auto_start();
        let events = inner.engine.start();
        let started = !events.is_empty();
        if started {
            self.spawn_ticker(&mut inner);
        }
        self.dispatch(&inner, events);
        started
    }

    /// Returns false when the timer was not running. A pending auto-start
    /// is cancelled either way.
    pub async fn pause(&self) -> bool {
        let mut inner = self.shared.inner.lock().await;
        inner.stop_ticker();
        inner.cancel_auto_start();
        let events = inner.engine.pause();
        let paused = !events.is_empty();
        self.dispatch(&inner, events);
        paused
    }

    pub async fn reset(&self) {
        let mut inner = self.shared.inner.lock().await;
        inner.stop_ticker();
        inner.cancel_auto_start();
        let events = inner.engine.reset();
        self.dispatch(&inner, events);
    }

    pub async fn skip(&self) {
        let mut inner = self.shared.inner.lock().await;
        inner.stop_ticker();
        inner.cancel_auto_start();
        let events = inner.engine.skip();
        self.dispatch(&inner, events);
    }

    /// Returns false when there was no running session to interrupt.
    pub async fn interrupt(&self) -> bool {
        let mut inner = self.shared.inner.lock().await;
        match inner.engine.interrupt() {
            Some(event) => {
                self.dispatch(&inner, vec![event]);
                true
            }
            None => false,
        }
    }

    /// Broadcast the current state to subscribers and return it.
    pub async fn announce_state(&self) -> TimerSnapshot {
        let inner = self.shared.inner.lock().await;
        let snapshot = inner.engine.snapshot();
        let event = Event::StateSnapshot {
            snapshot: snapshot.clone(),
            at: Utc::now(),
        };
        self.dispatch(&inner, vec![event]);
        snapshot
    }

    pub async fn apply_settings(&self, settings: TimerSettings) {
        self.shared.inner.lock().await.engine.apply_settings(settings);
    }

    pub async fn set_session_metadata(&self, metadata: SessionMetadata) {
        if let Some(recorder) = self.shared.inner.lock().await.recorder.as_mut() {
            recorder.set_metadata(metadata);
        }
    }

    /// Save settings through `resolver`, applying them to the engine first
    /// and restoring the previous state if the save fails.
    ///
    /// A paused timer gets its remaining time back on failure, unless the
    /// engine moved on while the save was in flight.
    ///
    /// # Errors
    ///
    /// Propagates validation and rollback errors from the resolver.
    pub async fn save_settings(
        &self,
        resolver: &mut SettingsResolver,
        settings: TimerSettings,
    ) -> Result<ResolvedSettings> {
        settings.validate()?;

        let previous = {
            let mut inner = self.shared.inner.lock().await;
            let previous = inner.engine.clone();
            inner.engine.apply_settings(settings.clone());
            previous
        };

        let outcome = resolver.save(settings).await;

        let mut inner = self.shared.inner.lock().await;
        match &outcome {
            Ok(resolved) => inner.engine.apply_settings(resolved.settings.clone()),
            Err(_) if !inner.engine.is_active() && inner.engine.epoch() == previous.epoch() => {
                inner.engine = previous;
            }
            Err(_) => inner.engine.apply_settings(previous.settings().clone()),
        }
        outcome
    }

    /// Stop all background work. An active session is paused first so its
    /// record gets closed; queued remote calls are flushed before returning.
    pub async fn shutdown(&self) -> Option<RecorderStats> {
        let recorder = {
            let mut inner = self.shared.inner.lock().await;
            inner.stop_ticker();
            inner.cancel_auto_start();
            let events = inner.engine.pause();
            self.dispatch(&inner, events);
            inner.recorder.take()
        };
        info!("timer controller shut down");
        match recorder {
            Some(recorder) => Some(recorder.finish().await),
            None => None,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn downgrade(&self) -> Weak<Shared> {
        Arc::downgrade(&self.shared)
    }

    fn upgrade(shared: &Weak<Shared>) -> Option<Self> {
        shared.upgrade().map(|shared| Self { shared })
    }

    fn spawn_ticker(&self, inner: &mut Inner) {
        inner.stop_ticker();
        let generation = inner.ticker_generation;
        let period = self.shared.options.tick_interval;
        let weak = self.downgrade();

        inner.ticker = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                let Some(controller) = Self::upgrade(&weak) else {
                    debug!("controller dropped, ticker exiting");
                    break;
                };
                if !controller.on_tick(generation).await {
                    break;
                }
            }
        }));
    }

    /// Returns whether the ticker should keep running.
    async fn on_tick(&self, generation: u64) -> bool {
        let mut inner = self.shared.inner.lock().await;
        if inner.ticker_generation != generation {
            return false;
        }

        let events = inner.engine.tick();
        let running = inner.engine.is_active();
        if !running {
            // This task is the ticker; drop our own handle and exit.
            inner.ticker = None;
        }

        for event in &events {
            if let Event::TimerCompleted {
                auto_start: true,
                epoch,
                ..
            } = event
            {
                self.schedule_auto_start(&mut inner, *epoch);
            }
        }
        self.dispatch(&inner, events);
        running
    }

    fn schedule_auto_start(&self, inner: &mut Inner, epoch: u64) {
        inner.cancel_auto_start();
        let delay = self.shared.options.auto_start_delay;
        let weak = self.downgrade();
        debug!(epoch, ?delay, "auto-start scheduled");

        inner.auto_start = Some(tokio::spawn(async move {
            time::sleep(delay).await;
            if let Some(controller) = Self::upgrade(&weak) {
                controller.run_auto_start(epoch).await;
            }
        }));
    }

    async fn run_auto_start(&self, epoch: u64) {
        let mut inner = self.shared.inner.lock().await;
        let events = inner.engine.auto_start(epoch);
        if events.is_empty() {
            return;
        }
        inner.auto_start = None;
        self.spawn_ticker(&mut inner);
        self.dispatch(&inner, events);
    }

    fn dispatch(&self, inner: &Inner, events: Vec<Event>) {
        for event in events {
            debug!(kind = event.kind(), "timer event");
            if let Some(recorder) = &inner.recorder {
                recorder.observe(&event);
            }
            if let (Some(notifier), Event::TimerCompleted { mode, next_mode, .. }) = (&inner.notifier, &event) {
                notifier.mode_completed(*mode, *next_mode, inner.engine.settings());
            }
            // No subscribers is fine.
            let _ = self.shared.events.send(event);
        }
    }
}
