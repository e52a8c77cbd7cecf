//! Reqwest-backed client for the Q&A API.
//!
//! The client owns transport details only: endpoint building, bearer
//! authentication, throttling, status mapping and envelope decoding.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::dto::Envelope;
use super::throttle::RequestThrottle;
use crate::domain::RetrySleeper;
use crate::domain::ports::CollaboratorError;

/// Connection settings for [`QaHttpClient`].
pub struct QaHttpConfig {
    /// API root, e.g. `https://host/v1`.
    pub base_url: Url,
    /// Bearer key.
    pub api_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Minimum spacing between requests.
    pub min_request_interval: Duration,
}

/// HTTP adapter implementing every collaborator port.
pub struct QaHttpClient {
    client: Client,
    base_url: Url,
    api_key: String,
    throttle: RequestThrottle,
}

impl QaHttpClient {
    /// Build a client with an explicit request timeout.
    ///
    /// ```rust,ignore
    /// let client = QaHttpClient::new(config, clock, Arc::new(TokioSleeper));
    /// assert!(client.is_ok() || client.is_err());
    /// ```
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        config: QaHttpConfig,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn RetrySleeper>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url,
            api_key: config.api_key,
            throttle: RequestThrottle::new(config.min_request_interval, clock, sleeper),
        })
    }

    /// Endpoint under the API root; segments are percent-encoded.
    pub(super) fn endpoint<S: AsRef<str>>(&self, segments: &[S]) -> Result<Url, CollaboratorError> {
        build_endpoint(&self.base_url, segments)
    }

    pub(super) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, CollaboratorError> {
        self.envelope(Method::GET, url, None::<&()>)
            .await?
            .into_payload()
    }

    pub(super) async fn send<B, T>(
        &self,
        method: Method,
        url: Url,
        body: &B,
    ) -> Result<T, CollaboratorError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.envelope(method, url, Some(body)).await?.into_payload()
    }

    /// Raw envelope, for callers that read the success flag themselves.
    pub(super) async fn envelope<B, T>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Envelope<T>, CollaboratorError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.throttle.acquire().await;
        debug!(%method, path = url.path(), "collaborator request");

        let mut request: RequestBuilder = self
            .client
            .request(method, url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        serde_json::from_slice(body.as_ref()).map_err(|error| {
            CollaboratorError::decode(format!("invalid response payload: {error}"))
        })
    }
}

fn build_endpoint<S: AsRef<str>>(base: &Url, segments: &[S]) -> Result<Url, CollaboratorError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| {
            CollaboratorError::transport(format!("base url `{base}` cannot take a path"))
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn map_transport_error(error: reqwest::Error) -> CollaboratorError {
    if error.is_timeout() {
        CollaboratorError::timeout(error.to_string())
    } else if error.is_decode() {
        CollaboratorError::decode(error.to_string())
    } else {
        CollaboratorError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> CollaboratorError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::NOT_FOUND => CollaboratorError::not_found(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            CollaboratorError::unauthorized(message)
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            CollaboratorError::timeout(message)
        }
        StatusCode::TOO_MANY_REQUESTS => CollaboratorError::rate_limited(message),
        _ if status.is_client_error() => CollaboratorError::rejected(message),
        _ if status.is_server_error() => CollaboratorError::server(message),
        _ => CollaboratorError::decode(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
