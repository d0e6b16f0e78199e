//! Append-only history of how the business concept changed.

use serde::{Deserialize, Serialize};

/// One recorded change of the canonical concept.
///
/// Fields are private: once an entry exists it can only be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionEntry {
    timestamp: String,
    concept: String,
    changes: Vec<String>,
    trigger: String,
}

impl EvolutionEntry {
    pub(crate) fn new(
        timestamp: String,
        concept: String,
        changes: Vec<String>,
        trigger: String,
    ) -> Self {
        Self {
            timestamp,
            concept,
            changes,
            trigger,
        }
    }

    /// Creation time (RFC 3339).
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// The concept as it stood after the change.
    pub fn concept(&self) -> &str {
        &self.concept
    }

    /// Labels introduced alongside the change.
    pub fn changes(&self) -> &[String] {
        &self.changes
    }

    /// Stored prefix of the utterance that caused the change.
    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// Trigger text as shown on the timeline.
    ///
    /// The ellipsis is appended unconditionally, including for triggers that
    /// were short enough to be stored whole.
    pub fn trigger_display(&self) -> String {
        format!("{}...", self.trigger)
    }
}

/// Write-once sequence of [`EvolutionEntry`] values.
///
/// `push` is the only mutator. Entries are never handed out mutably, so a
/// recorded entry cannot be edited, reordered, or removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvolutionLog {
    entries: Vec<EvolutionEntry>,
}

impl EvolutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry at the end of the log.
    pub fn push(&mut self, entry: EvolutionEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[EvolutionEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EvolutionEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&EvolutionEntry> {
        self.entries.last()
    }

    /// Newest-first view for timeline display. The log itself keeps its order.
    pub fn newest_first(&self) -> impl Iterator<Item = &EvolutionEntry> {
        self.entries.iter().rev()
    }
}

impl<'a> IntoIterator for &'a EvolutionLog {
    type Item = &'a EvolutionEntry;
    type IntoIter = std::slice::Iter<'a, EvolutionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
