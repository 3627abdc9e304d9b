//! HTTP client for the settings and session services.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

use super::{NewSession, RemoteSession, SessionApi, SessionUpdate, SettingsApi};
use crate::error::ApiError;
use crate::storage::ApiConfig;
use crate::timer::TimerSettings;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    /// Build a client rooted at `base_url` (e.g. `https://host/api`).
    ///
    /// # Errors
    /// Returns an error if the URL does not parse or the HTTP client
    /// cannot be constructed.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(base_url)?;
        // `Url::join` drops the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::new(&config.base_url, config.timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl SettingsApi for ApiClient {
    async fn fetch_settings(&self) -> Result<TimerSettings, ApiError> {
        let url = self.endpoint("settings")?;
        self.send_json(self.http.get(url)).await
    }

    async fn update_settings(&self, settings: &TimerSettings) -> Result<TimerSettings, ApiError> {
        let url = self.endpoint("settings")?;
        self.send_json(self.http.patch(url).json(settings)).await
    }
}

#[async_trait]
impl SessionApi for ApiClient {
    async fn create_session(&self, session: &NewSession) -> Result<RemoteSession, ApiError> {
        let url = self.endpoint("sessions")?;
        self.send_json(self.http.post(url).json(session)).await
    }

    async fn update_session(&self, id: &str, update: &SessionUpdate) -> Result<RemoteSession, ApiError> {
        let mut url = self.endpoint("sessions/")?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(id);
        self.send_json(self.http.patch(url).json(update)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_keeps_its_last_segment() {
        let client = ApiClient::new("http://localhost:3000/api", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.endpoint("settings").unwrap().as_str(),
            "http://localhost:3000/api/settings"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            ApiClient::new("not a url", Duration::from_secs(1)),
            Err(ApiError::InvalidUrl(_))
        ));
    }
}
