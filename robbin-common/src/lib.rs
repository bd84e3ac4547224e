pub mod api;
pub mod calendar;
pub mod config;
pub mod drill;
pub mod error;
pub mod feed;
pub mod incidents;
pub mod models;
pub mod poller;
pub mod postmortem;
pub mod settings;
pub mod severity;

// Re-export commonly used types
pub use api::{ApiClient, IncidentApi};
pub use config::DashboardConfig;
pub use error::{ApiError, FeedError};
pub use models::{Event, Incident, Postmortem};

/// Default base URL of the incident API when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
