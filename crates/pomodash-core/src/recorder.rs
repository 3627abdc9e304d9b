//! Mirrors engine session lifecycle into the remote session service.
//!
//! The recorder is fire-and-forget from the engine's point of view: events
//! are queued on an unbounded channel and handled by one worker task, so a
//! slow or failing server never holds up the timer. A session stays local
//! until its create call returns a server id; the matching close becomes a
//! PATCH against that id. Failures are logged and dropped, with no retry.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::events::Event;
use crate::remote::{NewSession, SessionApi, SessionMetadata, SessionUpdate};

/// Counters returned when the recorder shuts down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecorderStats {
    pub created: u32,
    pub updated: u32,
    pub failed: u32,
    /// Closes dropped because the create never produced an id.
    pub skipped: u32,
}

#[derive(Debug)]
enum Job {
    Create { local_id: Uuid, session: NewSession },
    Update { local_id: Uuid, update: SessionUpdate },
}

pub struct SessionRecorder {
    tx: mpsc::UnboundedSender<Job>,
    worker: JoinHandle<RecorderStats>,
    metadata: SessionMetadata,
}

impl SessionRecorder {
    /// Spawn the worker on the current tokio runtime.
    pub fn spawn(api: Arc<dyn SessionApi>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(api, rx));
        Self {
            tx,
            worker,
            metadata: SessionMetadata::default(),
        }
    }

    /// Labels attached to sessions opened from now on.
    pub fn set_metadata(&mut self, metadata: SessionMetadata) {
        self.metadata = metadata;
    }

    pub fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }

    /// Queue the remote call matching `event`, if any.
    pub fn observe(&self, event: &Event) {
        let job = match event {
            Event::SessionOpened {
                local_id,
                mode,
                start_time,
                interruptions,
            } => Job::Create {
                local_id: *local_id,
                session: NewSession {
                    start_time: *start_time,
                    session_type: *mode,
                    metadata: self.metadata.clone(),
                    interruptions: *interruptions,
                },
            },
            Event::SessionClosed {
                local_id,
                end_time,
                completed,
                interruptions,
                ..
            } => Job::Update {
                local_id: *local_id,
                update: SessionUpdate {
                    end_time: *end_time,
                    completed: *completed,
                    interruptions: *interruptions,
                },
            },
            _ => return,
        };

        if self.tx.send(job).is_err() {
            warn!("session recorder worker is gone, dropping {}", event.kind());
        }
    }

    /// Close the queue and wait for queued calls to finish.
    pub async fn finish(self) -> RecorderStats {
        drop(self.tx);
        match self.worker.await {
            Ok(stats) => stats,
            Err(e) => {
                warn!("session recorder worker failed: {e}");
                RecorderStats::default()
            }
        }
    }
}

async fn run_worker(api: Arc<dyn SessionApi>, mut rx: mpsc::UnboundedReceiver<Job>) -> RecorderStats {
    // local id -> server id; `None` when the create failed.
    let mut server_ids: HashMap<Uuid, Option<String>> = HashMap::new();
    let mut stats = RecorderStats::default();

    while let Some(job) = rx.recv().await {
        match job {
            Job::Create { local_id, session } => match api.create_session(&session).await {
                Ok(remote) => {
                    debug!(%local_id, server_id = %remote.id, "session created");
                    stats.created += 1;
                    server_ids.insert(local_id, Some(remote.id));
                }
                Err(e) => {
                    warn!(%local_id, "failed to create session: {e}");
                    stats.failed += 1;
                    server_ids.insert(local_id, None);
                }
            },
            Job::Update { local_id, update } => match server_ids.remove(&local_id) {
                Some(Some(id)) => match api.update_session(&id, &update).await {
                    Ok(_) => {
                        debug!(%local_id, server_id = %id, completed = update.completed, "session updated");
                        stats.updated += 1;
                    }
                    Err(e) => {
                        warn!(%local_id, server_id = %id, "failed to update session: {e}");
                        stats.failed += 1;
                    }
                },
                Some(None) => {
                    warn!(%local_id, "session was never created remotely, dropping update");
                    stats.skipped += 1;
                }
                None => {
                    warn!(%local_id, "update for unknown session, dropping");
                    stats.skipped += 1;
                }
            },
        }
    }

    stats
}
