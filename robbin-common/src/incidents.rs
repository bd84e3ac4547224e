use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::feed::PollOutcome;
use crate::models::Incident;

/// How long a newly seen incident stays highlighted
pub const HIGHLIGHT_DURATION: Duration = Duration::from_secs(3);

/// Status filter of the incident list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    /// Anything whose status is not "resolved"
    Open,
    Resolved,
}

impl StatusFilter {
    pub fn matches(self, incident: &Incident) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Open => !incident.is_resolved(),
            StatusFilter::Resolved => incident.is_resolved(),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => write!(f, "all"),
            StatusFilter::Open => write!(f, "open"),
            StatusFilter::Resolved => write!(f, "resolved"),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "open" => Ok(StatusFilter::Open),
            "resolved" => Ok(StatusFilter::Resolved),
            other => Err(format!("unknown status filter: {other}")),
        }
    }
}

/// Client-side state of the incident list view
#[derive(Debug, Default)]
pub struct IncidentBoard {
    incidents: Vec<Incident>,
    known_ids: HashSet<String>,
    highlighted: HashMap<String, Instant>,
    loaded: bool,
    filter: StatusFilter,
}

impl IncidentBoard {
    pub fn new(filter: StatusFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Replace the list with a fresh batch, newest first.
    ///
    /// Returns the ids absent from the previous batch; the first load
    /// reports none. New ids stay highlighted for [`HIGHLIGHT_DURATION`].
    pub fn replace(&mut self, mut batch: Vec<Incident>, now: Instant) -> Vec<String> {
        batch.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let new_ids: Vec<String> = if self.loaded {
            batch
                .iter()
                .filter(|i| !self.known_ids.contains(&i.id))
                .map(|i| i.id.clone())
                .collect()
        } else {
            Vec::new()
        };

        for id in &new_ids {
            self.highlighted.insert(id.clone(), now + HIGHLIGHT_DURATION);
        }

        self.known_ids = batch.iter().map(|i| i.id.clone()).collect();
        self.incidents = batch;
        self.loaded = true;
        new_ids
    }

    /// Apply one poll response; failures keep the current list
    pub fn apply_poll_result(
        &mut self,
        result: Result<Vec<Incident>, ApiError>,
        now: Instant,
    ) -> PollOutcome {
        match result {
            Ok(batch) => {
                let count = batch.len();
                let new_ids = self.replace(batch, now);
                if !new_ids.is_empty() {
                    info!(count = new_ids.len(), "new incidents");
                }
                PollOutcome::Applied(count)
            }
            Err(e) => {
                warn!(error = %e, "failed to refresh incidents");
                PollOutcome::Failed
            }
        }
    }

    pub fn is_highlighted(&self, id: &str, now: Instant) -> bool {
        self.highlighted.get(id).is_some_and(|until| now < *until)
    }

    /// Drop highlights whose time has passed
    pub fn expire_highlights(&mut self, now: Instant) {
        self.highlighted.retain(|_, until| now < *until);
    }

    pub fn all(&self) -> &[Incident] {
        &self.incidents
    }

    /// Incidents passing the status filter, newest first
    pub fn visible(&self) -> Vec<&Incident> {
        self.incidents
            .iter()
            .filter(|i| self.filter.matches(i))
            .collect()
    }

    /// Count line for the header, e.g. "12 total" or "3 open"
    pub fn count_label(&self) -> String {
        let count = self.visible().len();
        match self.filter {
            StatusFilter::All => format!("{count} total"),
            other => format!("{count} {other}"),
        }
    }
}

/// Age of `timestamp` relative to `now`: "42s ago", "5m ago", "3h ago", "2d ago"
pub fn format_relative(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(timestamp).num_seconds().max(0);

    if seconds < 60 {
        format!("{seconds}s ago")
    } else if seconds < 3600 {
        format!("{}m ago", seconds / 60)
    } else if seconds < 86400 {
        format!("{}h ago", seconds / 3600)
    } else {
        format!("{}d ago", seconds / 86400)
    }
}
