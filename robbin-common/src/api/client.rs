use super::{paths, IncidentApi, Page};
use crate::config::DashboardConfig;
use crate::error::ApiError;
use crate::models::{CreateIncidentRequest, CreatedIncident, Event, Incident, Postmortem};
use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Request, Uri};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// HTTP client for the incident API (JSON over HTTP or HTTPS)
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    timeout: Duration,
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl ApiClient {
    /// Create a client rooted at `base_url`, e.g. `http://localhost:8000`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let connector = HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())
            .map_err(|e| ApiError::Network(format!("failed to initialise TLS: {e}")))?
            .https_or_http()
            .enable_http1()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self, ApiError> {
        Self::new(&config.api_base_url, config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a URI under the configured base URL
    fn build_uri(&self, path: &str) -> Result<Uri, ApiError> {
        let url = format!("{}{path}", self.base_url);
        url.parse::<Uri>()
            .map_err(|e| ApiError::InvalidUrl(format!("{url}: {e}")))
    }

    /// Send one request and return the body of a 2xx response
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Bytes, ApiError> {
        let uri = self.build_uri(path)?;

        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Accept", "application/json")
            .header("Cache-Control", "no-store");
        if body.is_some() {
            builder = builder.header("Content-Type", "application/json");
        }
        let request = builder
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|e| ApiError::InvalidUrl(format!("failed to build request: {e}")))?;

        let exchange = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| ApiError::Network(format!("failed to send request: {e}")))?;

            let status = response.status();
            let body_bytes = response
                .into_body()
                .collect()
                .await
                .map_err(|e| ApiError::Network(format!("failed to read response body: {e}")))?
                .to_bytes();

            Ok::<_, ApiError>((status, body_bytes))
        };

        let (status, body_bytes) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| ApiError::Timeout(self.timeout.as_secs()))??;

        debug!(status = status.as_u16(), bytes = body_bytes.len(), "response received");

        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body_bytes).into_owned(),
            });
        }

        Ok(body_bytes)
    }

    /// Make a GET request to the API
    #[tracing::instrument(name = "api.get", skip(self), fields(path = %path))]
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.send(Method::GET, path, None).await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Make a POST request to the API, with an optional JSON body
    #[tracing::instrument(name = "api.post", skip(self, payload), fields(path = %path))]
    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        payload: Option<&B>,
    ) -> Result<T, ApiError> {
        let json = payload
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| ApiError::Decode(format!("failed to serialize request body: {e}")))?;
        let body = self.send(Method::POST, path, json).await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl IncidentApi for ApiClient {
    async fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        self.get(paths::EVENTS).await
    }

    async fn list_incidents(&self, page: Option<Page>) -> Result<Vec<Incident>, ApiError> {
        self.get(&paths::incidents(page)).await
    }

    async fn get_incident(&self, id: &str) -> Result<Incident, ApiError> {
        self.get(&paths::incident(id)?).await
    }

    async fn create_incident_from_events(
        &self,
        event_ids: &[String],
    ) -> Result<CreatedIncident, ApiError> {
        let request = CreateIncidentRequest {
            event_ids: event_ids.to_vec(),
        };
        self.post(paths::INCIDENTS_FROM_EVENTS, Some(&request)).await
    }

    async fn generate_postmortem(&self, incident_id: &str) -> Result<Postmortem, ApiError> {
        self.post::<(), _>(&paths::incident_postmortem(incident_id)?, None)
            .await
    }

    async fn list_postmortems(&self) -> Result<Vec<Postmortem>, ApiError> {
        self.get(paths::POSTMORTEMS).await
    }

    async fn get_postmortem(&self, id: &str) -> Result<Postmortem, ApiError> {
        self.get(&paths::postmortem(id)?).await
    }
}
