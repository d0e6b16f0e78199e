use super::log::{EvolutionEntry, EvolutionLog};

/// Default upper bound on the stored trigger prefix, in characters.
pub const DEFAULT_TRIGGER_MAX_CHARS: usize = 50;

/// Records concept changes into an [`EvolutionLog`].
#[derive(Debug, Clone, Copy)]
pub struct EvolutionTracker {
    trigger_max_chars: usize,
}

impl EvolutionTracker {
    pub fn new(trigger_max_chars: usize) -> Self {
        Self { trigger_max_chars }
    }

    pub fn trigger_max_chars(&self) -> usize {
        self.trigger_max_chars
    }

    /// Appends an entry when `new_concept` is non-empty and differs from
    /// `old_concept`. Returns the appended entry, if any.
    pub fn record_if_changed<'a>(
        &self,
        log: &'a mut EvolutionLog,
        old_concept: Option<&str>,
        new_concept: &str,
        trigger: &str,
        newly_introduced_labels: Vec<String>,
    ) -> Option<&'a EvolutionEntry> {
        if new_concept.is_empty() || old_concept == Some(new_concept) {
            return None;
        }

        let entry = EvolutionEntry::new(
            chrono::Utc::now().to_rfc3339(),
            new_concept.to_string(),
            newly_introduced_labels,
            bounded_prefix(trigger, self.trigger_max_chars),
        );
        tracing::debug!(
            "[EvolutionTracker] Concept changed ({} -> {}), entry #{}",
            old_concept.unwrap_or("<none>"),
            new_concept,
            log.len() + 1
        );
        log.push(entry);
        log.last()
    }
}

impl Default for EvolutionTracker {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGGER_MAX_CHARS)
    }
}

/// Takes at most `max_chars` characters without splitting a code point.
fn bounded_prefix(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_when_concept_changes() {
        let tracker = EvolutionTracker::default();
        let mut log = EvolutionLog::new();

        let entry = tracker
            .record_if_changed(
                &mut log,
                None,
                "A marketplace for used books",
                "I want to build a marketplace for used books",
                vec!["A marketplace for used books".to_string()],
            )
            .cloned()
            .unwrap();

        assert_eq!(entry.concept(), "A marketplace for used books");
        assert_eq!(entry.changes(), ["A marketplace for used books"]);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_skips_identical_concept() {
        let tracker = EvolutionTracker::default();
        let mut log = EvolutionLog::new();

        let recorded = tracker.record_if_changed(&mut log, Some("Same"), "Same", "again", vec![]);

        assert!(recorded.is_none());
        assert!(log.is_empty());
    }

    #[test]
    fn test_skips_empty_concept() {
        let tracker = EvolutionTracker::default();
        let mut log = EvolutionLog::new();

        assert!(
            tracker
                .record_if_changed(&mut log, Some("Old"), "", "clear it", vec![])
                .is_none()
        );
        assert!(log.is_empty());
    }

    #[test]
    fn test_comparison_is_exact() {
        let tracker = EvolutionTracker::default();
        let mut log = EvolutionLog::new();

        // Case differences count as a change.
        assert!(
            tracker
                .record_if_changed(&mut log, Some("books"), "Books", "x", vec![])
                .is_some()
        );
    }

    #[test]
    fn test_trigger_is_truncated() {
        let tracker = EvolutionTracker::new(10);
        let mut log = EvolutionLog::new();
        let long = "abcdefghijklmnopqrstuvwxyz";

        let entry = tracker
            .record_if_changed(&mut log, None, "C", long, vec![])
            .unwrap();

        assert_eq!(entry.trigger(), "abcdefghij");
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        assert_eq!(bounded_prefix("日本語のテキスト", 3), "日本語");
        assert_eq!(bounded_prefix("short", 50), "short");
        assert_eq!(bounded_prefix("", 5), "");
    }

    #[test]
    fn test_existing_entries_never_change() {
        let tracker = EvolutionTracker::default();
        let mut log = EvolutionLog::new();

        tracker.record_if_changed(&mut log, None, "A", "first", vec![]);
        let first = log.entries()[0].clone();
        tracker.record_if_changed(&mut log, Some("A"), "B", "second", vec![]);

        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[0], first);
    }
}
