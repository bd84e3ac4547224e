use crate::feed::range::RelativeWindow;
use crate::severity::SeverityPalette;
use crate::DEFAULT_API_BASE_URL;
use std::time::Duration;

/// Dashboard configuration, built once at startup and passed down
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Base URL of the incident API
    pub api_base_url: String,
    /// Poll interval of the live feed (default: 15s)
    pub feed_poll_interval: Duration,
    /// Poll interval of list views such as incidents (default: 30s)
    pub list_poll_interval: Duration,
    /// Upper bound on a single HTTP exchange (default: 10s)
    pub request_timeout: Duration,
    /// Relative windows offered by the feed, in display order
    pub time_windows: Vec<RelativeWindow>,
    /// Severity class → display style
    pub severity_palette: SeverityPalette,
}

impl DashboardConfig {
    /// Create a configuration with default settings
    ///
    /// Default configuration:
    /// - feed polled every 15s, lists every 30s
    /// - 10s request timeout
    /// - all relative windows offered
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            feed_poll_interval: Duration::from_secs(15),
            list_poll_interval: Duration::from_secs(30),
            request_timeout: Duration::from_secs(10),
            time_windows: RelativeWindow::ALL.to_vec(),
            severity_palette: SeverityPalette::default(),
        }
    }

    /// Read overrides from the environment:
    /// `ROBBIN_API_BASE_URL`, `ROBBIN_FEED_POLL_SECS`, `ROBBIN_LIST_POLL_SECS`,
    /// `ROBBIN_REQUEST_TIMEOUT_SECS`. Unparseable numbers keep the default.
    pub fn from_env() -> Self {
        let base = std::env::var("ROBBIN_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let mut config = Self::new(base);

        if let Some(secs) = env_secs("ROBBIN_FEED_POLL_SECS") {
            config.feed_poll_interval = secs;
        }
        if let Some(secs) = env_secs("ROBBIN_LIST_POLL_SECS") {
            config.list_poll_interval = secs;
        }
        if let Some(secs) = env_secs("ROBBIN_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = secs;
        }
        config
    }

    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_feed_poll_interval(mut self, interval: Duration) -> Self {
        self.feed_poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_list_poll_interval(mut self, interval: Duration) -> Self {
        self.list_poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        let url = self.api_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "API base URL must start with http:// or https://: {url}"
            ));
        }

        if self.feed_poll_interval.is_zero() || self.list_poll_interval.is_zero() {
            return Err(anyhow::anyhow!("Poll intervals must be greater than zero"));
        }

        if self.request_timeout.is_zero() {
            return Err(anyhow::anyhow!("Request timeout must be greater than zero"));
        }

        if self.time_windows.is_empty() {
            return Err(anyhow::anyhow!("At least one time window must be offered"));
        }

        Ok(())
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DashboardConfig::default();

        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.feed_poll_interval, Duration::from_secs(15));
        assert_eq!(config.list_poll_interval, Duration::from_secs(30));
        assert_eq!(config.time_windows.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = DashboardConfig::default()
            .with_api_base_url("https://incidents.example.com")
            .with_feed_poll_interval(Duration::from_secs(5))
            .with_request_timeout(Duration::from_secs(2));

        assert_eq!(config.api_base_url, "https://incidents.example.com");
        assert_eq!(config.feed_poll_interval, Duration::from_secs(5));
        assert_eq!(config.request_timeout, Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(DashboardConfig::new("localhost:8000").validate().is_err());
        assert!(DashboardConfig::default()
            .with_list_poll_interval(Duration::ZERO)
            .validate()
            .is_err());
    }
}
