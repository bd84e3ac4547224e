use std::collections::BTreeSet;

use crate::severity::SeverityClass;

/// Outcome of [`SelectionSet::toggle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Added,
    Removed,
    /// Info-class events are never selectable
    Rejected,
}

/// Event ids marked for inclusion in a new incident.
///
/// Never contains an id whose event classifies as info.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, id: &str, class: SeverityClass) -> SelectionChange {
        if self.ids.remove(id) {
            SelectionChange::Removed
        } else if !class.is_selectable() {
            SelectionChange::Rejected
        } else {
            self.ids.insert(id.to_string());
            SelectionChange::Added
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.ids.remove(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}
