mod client;

pub use client::ApiClient;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::{CreatedIncident, Event, Incident, Postmortem};

/// Remote incident-management API consumed by the dashboard.
///
/// [`ApiClient`] talks HTTP; tests substitute in-memory implementations.
#[async_trait]
pub trait IncidentApi: Send + Sync {
    /// `GET /api/events`
    async fn list_events(&self) -> Result<Vec<Event>, ApiError>;

    /// `GET /api/incidents`, optionally paged
    async fn list_incidents(&self, page: Option<Page>) -> Result<Vec<Incident>, ApiError>;

    /// `GET /api/incidents/{id}`
    async fn get_incident(&self, id: &str) -> Result<Incident, ApiError>;

    /// `POST /api/incidents/from-events`
    async fn create_incident_from_events(
        &self,
        event_ids: &[String],
    ) -> Result<CreatedIncident, ApiError>;

    /// `POST /api/incidents/{id}/postmortem`
    async fn generate_postmortem(&self, incident_id: &str) -> Result<Postmortem, ApiError>;

    /// `GET /api/postmortems`
    async fn list_postmortems(&self) -> Result<Vec<Postmortem>, ApiError>;

    /// `GET /api/postmortems/{id}`
    async fn get_postmortem(&self, id: &str) -> Result<Postmortem, ApiError>;
}

/// `skip`/`limit` query parameters of list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u32,
    pub limit: u32,
}

impl Page {
    pub fn first(limit: u32) -> Self {
        Self { skip: 0, limit }
    }
}

pub(crate) mod paths {
    use super::Page;
    use crate::error::ApiError;

    pub const EVENTS: &str = "/api/events";
    pub const INCIDENTS: &str = "/api/incidents";
    pub const INCIDENTS_FROM_EVENTS: &str = "/api/incidents/from-events";
    pub const POSTMORTEMS: &str = "/api/postmortems";

    pub fn incidents(page: Option<Page>) -> String {
        match page {
            Some(Page { skip, limit }) => format!("{INCIDENTS}?skip={skip}&limit={limit}"),
            None => INCIDENTS.to_string(),
        }
    }

    pub fn incident(id: &str) -> Result<String, ApiError> {
        Ok(format!("{INCIDENTS}/{}", segment(id)?))
    }

    pub fn incident_postmortem(id: &str) -> Result<String, ApiError> {
        Ok(format!("{INCIDENTS}/{}/postmortem", segment(id)?))
    }

    pub fn postmortem(id: &str) -> Result<String, ApiError> {
        Ok(format!("{POSTMORTEMS}/{}", segment(id)?))
    }

    /// Ids are opaque but must be usable verbatim as one path segment
    fn segment(id: &str) -> Result<&str, ApiError> {
        let valid = !matches!(id, "" | "." | "..")
            && id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~'));
        if valid {
            Ok(id)
        } else {
            Err(ApiError::InvalidUrl(format!("invalid id {id:?}")))
        }
    }

}
