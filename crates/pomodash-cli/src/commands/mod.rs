pub mod config;
pub mod run;
pub mod settings;

use std::sync::Arc;

use pomodash_core::{ApiClient, Config, LocalCache, SettingsApi, SettingsResolver};

/// Remote client, unless disabled in config or by `--offline`.
pub fn api_client(config: &Config, offline: bool) -> Result<Option<Arc<ApiClient>>, Box<dyn std::error::Error>> {
    if offline || !config.api.enabled {
        return Ok(None);
    }
    Ok(Some(Arc::new(ApiClient::from_config(&config.api)?)))
}

/// The cache is optional; a broken cache file only costs offline fallback.
pub fn open_cache(config: &Config) -> Option<LocalCache> {
    let opened = config.cache_path().and_then(|path| LocalCache::open(&path));
    match opened {
        Ok(cache) => Some(cache),
        Err(e) => {
            tracing::warn!("settings cache unavailable: {e}");
            None
        }
    }
}

pub fn resolver(config: &Config, api: Option<Arc<ApiClient>>) -> SettingsResolver {
    SettingsResolver::new(api.map(|a| a as Arc<dyn SettingsApi>), open_cache(config))
}
