//! HTTP device backend

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response};
use tracing::{debug, error};
use url::Url;

use crate::backend::{DeviceBackend, RawDeviceState};
use crate::errors::{single_line, BackendError, ButlerError};
use crate::storage::settings::BackendSettings;

/// Device backend speaking to the home automation REST API
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
    status_path: String,
}

impl HttpBackend {
    /// Create a new HTTP backend
    pub fn new(settings: &BackendSettings) -> Result<Self, ButlerError> {
        Url::parse(&settings.base_url).map_err(|e| {
            ButlerError::ConfigError(format!("Invalid backend URL '{}': {}", settings.base_url, e))
        })?;

        let client = Client::builder().timeout(settings.timeout()).build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
            status_path: settings.status_path.trim_matches('/').to_string(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of `{base}/{path}/{device_id}`
    pub fn device_url(&self, path: &str, device_id: &str) -> String {
        format!("{}/{}/{}", self.base_url, path.trim_matches('/'), device_id)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn check(response: Response, method: &str) -> Result<Response, BackendError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = single_line(&response.text().await.unwrap_or_default());
        error!("HTTP {} failed: {} - {}", method, status, body);
        // Proxy error pages carry markup, not a message
        let message = match status.canonical_reason() {
            Some(reason) if body.is_empty() || body.starts_with('<') => reason.to_string(),
            _ => body,
        };
        Err(BackendError::status(status.as_u16(), message))
    }
}

#[async_trait]
impl DeviceBackend for HttpBackend {
    async fn get_state(&self, device_id: &str) -> Result<RawDeviceState, BackendError> {
        let url = self.device_url(&self.status_path, device_id);
        debug!("GET {}", url);

        let response = self.authorize(self.client.get(&url)).send().await?;
        let response = Self::check(response, "GET").await?;

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(BackendError::decode("empty status response"));
        }
        serde_json::from_slice(&bytes).map_err(|e| BackendError::decode(e.to_string()))
    }

    async fn activate(&self, device_id: &str, control_path: &str) -> Result<(), BackendError> {
        let url = self.device_url(control_path, device_id);
        debug!("POST {}", url);

        let response = self.authorize(self.client.post(&url)).send().await?;
        Self::check(response, "POST").await?;
        Ok(())
    }
}
