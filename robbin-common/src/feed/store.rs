use crate::models::Event;

/// In-memory copy of the most recently fetched event batch.
///
/// Replaced wholesale on every successful fetch, never merged. Ordered
/// newest first regardless of server ordering.
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a new batch, sorted by `created_at` descending
    pub fn replace(&mut self, mut events: Vec<Event>) {
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.events = events;
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event(id: &str, minute: u32, title: &str) -> Event {
        Event {
            id: id.to_string(),
            source: "api".to_string(),
            title: title.to_string(),
            stack_trace: None,
            severity: "error".to_string(),
            metadata: None,
            environment: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_replace_sorts_newest_first() {
        let mut store = EventStore::new();
        store.replace(vec![
            event("old", 1, "x"),
            event("new", 30, "x"),
            event("mid", 10, "x"),
        ]);
        let ids: Vec<_> = store.events().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_replace_discards_previous_batch() {
        let mut store = EventStore::new();
        store.replace(vec![event("a", 1, "first"), event("b", 2, "x")]);
        store.replace(vec![event("a", 1, "second")]);

        assert_eq!(store.len(), 1);
        assert!(store.get("b").is_none());
        assert_eq!(store.get("a").unwrap().title, "second");
    }
}
