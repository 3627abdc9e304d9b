//! Settings resolution: remote store, local cache, built-in defaults.
//!
//! At startup the resolver asks the server first, then the offline cache,
//! then falls back to the defaults, so a timer can always be built. Saves
//! are optimistic: the new settings become current immediately and are
//! rolled back if the server rejects them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CoreError, Result};
use crate::remote::SettingsApi;
use crate::storage::LocalCache;
use crate::timer::TimerSettings;

/// Where the current settings came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsSource {
    Remote,
    Cache,
    /// Built-in values, or settings no store holds.
    Defaults,
}

impl fmt::Display for SettingsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SettingsSource::Remote => "remote",
            SettingsSource::Cache => "cache",
            SettingsSource::Defaults => "defaults",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSettings {
    pub settings: TimerSettings,
    pub source: SettingsSource,
}

pub struct SettingsResolver {
    api: Option<Arc<dyn SettingsApi>>,
    cache: Option<LocalCache>,
    current: TimerSettings,
    source: SettingsSource,
}

impl SettingsResolver {
    /// Either collaborator may be absent (offline mode, unwritable cache).
    pub fn new(api: Option<Arc<dyn SettingsApi>>, cache: Option<LocalCache>) -> Self {
        Self {
            api,
            cache,
            current: TimerSettings::default(),
            source: SettingsSource::Defaults,
        }
    }

    pub fn current(&self) -> &TimerSettings {
        &self.current
    }

    pub fn source(&self) -> SettingsSource {
        self.source
    }

    /// Resolve the startup settings. Never fails.
    pub async fn load(&mut self) -> ResolvedSettings {
        if let Some(settings) = fetch_remote(self.api.clone()).await {
            self.mirror(&settings);
            return self.adopt(settings, SettingsSource::Remote);
        }

        if let Some(settings) = self.read_cache() {
            return self.adopt(settings, SettingsSource::Cache);
        }

        info!("no stored settings available, using defaults");
        self.adopt(TimerSettings::default(), SettingsSource::Defaults)
    }

    /// Save `settings`, applying them optimistically.
    ///
    /// # Errors
    ///
    /// Returns a validation error without touching the current settings,
    /// or [`CoreError::SettingsRolledBack`] when the server rejected the
    /// save and the previous settings were restored.
    pub async fn save(&mut self, settings: TimerSettings) -> Result<ResolvedSettings> {
        settings.validate()?;

        let previous = std::mem::replace(&mut self.current, settings.clone());
        let previous_source = self.source;

        let Some(api) = self.api.clone() else {
            // Offline: the cache is the only store.
            self.source = if self.mirror(&settings) {
                SettingsSource::Cache
            } else {
                warn!("no settings cache available, saved settings last only for this run");
                SettingsSource::Defaults
            };
            return Ok(self.resolved());
        };

        match api.update_settings(&settings).await {
            Ok(saved) => {
                let saved = match saved.validate() {
                    Ok(()) => saved,
                    Err(e) => {
                        warn!("server echoed invalid settings ({e}), keeping submitted values");
                        settings
                    }
                };
                self.mirror(&saved);
                debug!("settings saved remotely");
                Ok(self.adopt(saved, SettingsSource::Remote))
            }
            Err(e) => {
                warn!("settings save failed, rolling back: {e}");
                self.current = previous;
                self.source = previous_source;
                Err(CoreError::SettingsRolledBack {
                    source: Box::new(e.into()),
                })
            }
        }
    }

    fn read_cache(&self) -> Option<TimerSettings> {
        let cache = self.cache.as_ref()?;
        match cache.load_settings() {
            Ok(Some(settings)) if settings.validate().is_ok() => Some(settings),
            Ok(Some(_)) => {
                warn!("ignoring invalid cached settings");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!("failed to read settings cache: {e}");
                None
            }
        }
    }

    /// Returns whether the settings reached the cache.
    fn mirror(&self, settings: &TimerSettings) -> bool {
        let Some(cache) = &self.cache else {
            return false;
        };
        match cache.store_settings(settings) {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to write settings cache: {e}");
                false
            }
        }
    }

    fn adopt(&mut self, settings: TimerSettings, source: SettingsSource) -> ResolvedSettings {
        debug!(%source, "settings resolved");
        self.current = settings;
        self.source = source;
        self.resolved()
    }

    fn resolved(&self) -> ResolvedSettings {
        ResolvedSettings {
            settings: self.current.clone(),
            source: self.source,
        }
    }
}

async fn fetch_remote(api: Option<Arc<dyn SettingsApi>>) -> Option<TimerSettings> {
    let api = api?;
    match api.fetch_settings().await {
        Ok(settings) => match settings.validate() {
            Ok(()) => Some(settings),
            Err(e) => {
                warn!("server returned invalid settings: {e}");
                None
            }
        },
        Err(e) => {
            warn!("failed to load remote settings: {e}");
            None
        }
    }
}
