use thiserror::Error;

/// Failure talking to the incident API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, TLS, reset...)
    #[error("network error: {0}")]
    Network(String),

    /// No response within the configured request timeout
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The server answered with a non-2xx status
    #[error("request failed with status {status}: {body}")]
    Http { status: u16, body: String },

    /// A 2xx response whose body did not match the expected schema
    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Human-readable message for a failed one-shot action.
    ///
    /// For HTTP errors the server's `detail` or `message` field wins; every
    /// other case (and bodies without either field) yields `fallback`.
    pub fn remote_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Http { body, .. } => {
                serde_json::from_str::<serde_json::Value>(body)
                    .ok()
                    .and_then(|value| {
                        ["detail", "message"].iter().find_map(|key| {
                            value
                                .get(*key)
                                .and_then(serde_json::Value::as_str)
                                .map(str::to_string)
                        })
                    })
                    .unwrap_or_else(|| fallback.to_string())
            }
            _ => fallback.to_string(),
        }
    }

    /// Whether the failure happened before any HTTP response arrived.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Timeout(_))
    }
}

/// Failure of a feed action such as generating an incident.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedError {
    /// Client-side precondition failed; nothing was sent
    #[error("{0}")]
    Validation(String),

    /// The server rejected the request or could not be reached
    #[error("{0}")]
    Remote(String),
}
