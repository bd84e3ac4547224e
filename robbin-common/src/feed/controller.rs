use chrono::{DateTime, Utc};
use std::fmt;
use tracing::{info, warn};

use super::range::TimeRange;
use super::selection::{SelectionChange, SelectionSet};
use super::store::EventStore;
use crate::api::IncidentApi;
use crate::error::{ApiError, FeedError};
use crate::models::Event;
use crate::severity::{classify, SeverityClass, SeverityFilter};

const GENERATE_INCIDENT_FALLBACK: &str = "Failed to generate incident";

/// Environment filter of the live feed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EnvironmentFilter {
    #[default]
    All,
    Named(String),
}

impl EnvironmentFilter {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Named(raw.to_string())
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        match self {
            Self::All => true,
            Self::Named(name) => event
                .environment()
                .is_some_and(|env| env.eq_ignore_ascii_case(name)),
        }
    }
}

impl fmt::Display for EnvironmentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Result of applying one poll response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Paused; no request was issued
    Skipped,
    /// Collection replaced with this many events
    Applied(usize),
    /// Request failed; previous collection kept
    Failed,
    /// Response arrived after stop or pause and was dropped
    Discarded,
}

/// State of one mounted live feed: events, filters, selection, pause flag.
///
/// Pure state; the poll loop and network calls live in
/// [`super::live::LiveFeed`].
#[derive(Debug, Default)]
pub struct FeedController {
    store: EventStore,
    selection: SelectionSet,
    range: TimeRange,
    severity_filter: SeverityFilter,
    environment_filter: EnvironmentFilter,
    paused: bool,
}

impl FeedController {
    pub fn new(range: TimeRange) -> Self {
        Self {
            range,
            ..Self::default()
        }
    }

    pub fn events(&self) -> &[Event] {
        self.store.events()
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn range(&self) -> &TimeRange {
        &self.range
    }

    pub fn severity_filter(&self) -> SeverityFilter {
        self.severity_filter
    }

    pub fn environment_filter(&self) -> &EnvironmentFilter {
        &self.environment_filter
    }

    pub fn set_range(&mut self, range: TimeRange) {
        self.range = range;
    }

    pub fn set_severity_filter(&mut self, filter: SeverityFilter) {
        self.severity_filter = filter;
    }

    pub fn set_environment_filter(&mut self, filter: EnvironmentFilter) {
        self.environment_filter = filter;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Events passing the time range, severity and environment filters
    pub fn visible_events(&self, now: DateTime<Utc>) -> Vec<&Event> {
        let in_range = self.range.predicate(now);
        self.store
            .events()
            .iter()
            .filter(|e| in_range.includes(e.created_at))
            .filter(|e| self.severity_filter.matches(&e.severity))
            .filter(|e| self.environment_filter.matches(e))
            .collect()
    }

    /// Toggle an event in the selection.
    ///
    /// Unknown ids are only removable. A selection that becomes non-empty
    /// pauses the feed so refreshes cannot change the id set under it.
    pub fn toggle_selection(&mut self, id: &str) -> SelectionChange {
        let change = match self.store.get(id) {
            Some(event) => self.selection.toggle(id, classify(&event.severity).class),
            None if self.selection.contains(id) => {
                self.selection.toggle(id, SeverityClass::Info)
            }
            None => SelectionChange::Rejected,
        };

        if change == SelectionChange::Added && !self.paused {
            info!(event_id = %id, "selection started, pausing live feed");
            self.paused = true;
        }
        change
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Drop `ids` from the selection; ids selected since are kept
    pub fn release_selection(&mut self, ids: &[String]) {
        for id in ids {
            self.selection.remove(id);
        }
    }

    /// Apply the result of a poll request that was issued while running
    pub fn apply_poll_result(&mut self, result: Result<Vec<Event>, ApiError>) -> PollOutcome {
        match result {
            Ok(_) if self.paused => PollOutcome::Discarded,
            Ok(events) => {
                let count = events.len();
                self.store.replace(events);
                PollOutcome::Applied(count)
            }
            Err(e) => {
                warn!("Event refresh failed, keeping previous data: {}", e);
                PollOutcome::Failed
            }
        }
    }
}

/// Create an incident from the selected events.
///
/// Validation failures return before any request is made. On success the
/// selection is cleared and the new incident id returned.
#[tracing::instrument(name = "feed.generate_incident", skip_all, fields(selected = selection.len()))]
pub async fn generate_incident(
    api: &dyn IncidentApi,
    selection: &mut SelectionSet,
    events: &[Event],
) -> Result<String, FeedError> {
    if selection.is_empty() {
        return Err(FeedError::Validation("no selection".to_string()));
    }

    let eligible: Vec<String> = selection
        .ids()
        .filter(|id| {
            events
                .iter()
                .find(|e| e.id == *id)
                .is_some_and(|e| classify(&e.severity).selectable)
        })
        .map(str::to_string)
        .collect();

    if eligible.is_empty() {
        return Err(FeedError::Validation("no eligible events".to_string()));
    }

    match api.create_incident_from_events(&eligible).await {
        Ok(created) => {
            info!(incident_id = %created.id, events = eligible.len(), "incident created");
            selection.clear();
            Ok(created.id)
        }
        Err(e) => {
            warn!("Incident generation failed: {}", e);
            let message = if e.is_transport() {
                e.to_string()
            } else {
                e.remote_message(GENERATE_INCIDENT_FALLBACK)
            };
            Err(FeedError::Remote(message))
        }
    }
}
