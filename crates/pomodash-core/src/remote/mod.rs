//! Remote settings and session services.
//!
//! The resolver and recorder only see the two traits below; [`ApiClient`]
//! is the HTTP implementation used outside of tests.

mod client;
mod types;

pub use client::ApiClient;
pub use types::{NewSession, RemoteSession, SessionMetadata, SessionUpdate};

use async_trait::async_trait;

use crate::error::ApiError;
use crate::timer::TimerSettings;

/// Settings service: `GET`/`PATCH` the account's timer settings.
#[async_trait]
pub trait SettingsApi: Send + Sync {
    async fn fetch_settings(&self) -> Result<TimerSettings, ApiError>;

    /// Persist `settings`; returns what the server stored.
    async fn update_settings(&self, settings: &TimerSettings) -> Result<TimerSettings, ApiError>;
}

/// Session service: create a record when a session starts, patch it when it closes.
#[async_trait]
pub trait SessionApi: Send + Sync {
    async fn create_session(&self, session: &NewSession) -> Result<RemoteSession, ApiError>;

    async fn update_session(&self, id: &str, update: &SessionUpdate) -> Result<RemoteSession, ApiError>;
}
