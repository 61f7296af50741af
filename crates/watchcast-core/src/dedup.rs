use std::collections::HashSet;
use tracing::{debug, warn};
use watchcast_models::WatchEvent;
use crate::history_store::HistoryStore;

/// Result of splitting a fetched batch against the history store
#[derive(Debug, Default)]
pub struct Partition {
    /// Events not yet delivered, in fetch order
    pub fresh: Vec<WatchEvent>,
    pub already_delivered: usize,
    /// Repeated ids within the batch itself (e.g. overlapping pages)
    pub duplicates_in_batch: usize,
    /// Events skipped this cycle because the store could not answer for them
    pub unreadable: Vec<String>,
}

impl Partition {
    pub fn is_empty(&self) -> bool {
        self.fresh.is_empty()
    }
}

/// Keep the events whose id is not in `store`, preserving order. Only the first
/// occurrence of a repeated id proceeds. A failed lookup excludes that one event
/// for this cycle rather than guessing either way.
pub fn partition_new<S>(events: Vec<WatchEvent>, store: &S) -> Partition
where
    S: HistoryStore + ?Sized,
{
    let mut partition = Partition::default();
    let mut seen_in_batch: HashSet<String> = HashSet::with_capacity(events.len());

    for event in events {
        if !seen_in_batch.insert(event.event_id.clone()) {
            partition.duplicates_in_batch += 1;
            debug!(event_id = %event.event_id, "Dropping repeated event within batch");
            continue;
        }

        match store.contains(&event.event_id) {
            Ok(true) => partition.already_delivered += 1,
            Ok(false) => partition.fresh.push(event),
            Err(e) => {
                warn!(
                    event_id = %event.event_id,
                    stage = "dedup",
                    error = %e,
                    "Could not check delivery history; skipping event until next check"
                );
                partition.unreadable.push(event.event_id);
            }
        }
    }

    partition
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{movie_event, FakeStore};

    fn ids(events: &[WatchEvent]) -> Vec<&str> {
        events.iter().map(|e| e.event_id.as_str()).collect()
    }

    #[test]
    fn test_filters_delivered_and_keeps_order() {
        let store = FakeStore::with_ids(&["2"]);
        let batch = vec![movie_event("1", 1), movie_event("2", 2), movie_event("3", 3)];

        let partition = partition_new(batch, &store);
        assert_eq!(ids(&partition.fresh), vec!["1", "3"]);
        assert_eq!(partition.already_delivered, 1);
    }

    #[test]
    fn test_in_batch_duplicates_keep_first() {
        let store = FakeStore::default();
        let mut second = movie_event("1", 5);
        second.media.title = "Later copy".to_string();
        let batch = vec![movie_event("1", 1), second, movie_event("2", 2)];

        let partition = partition_new(batch, &store);
        assert_eq!(ids(&partition.fresh), vec!["1", "2"]);
        assert_eq!(partition.fresh[0].media.title, "Movie 1");
        assert_eq!(partition.duplicates_in_batch, 1);
    }

    #[test]
    fn test_empty_batch() {
        let partition = partition_new(Vec::new(), &FakeStore::default());
        assert!(partition.is_empty());
        assert_eq!(partition.already_delivered, 0);
    }

    #[test]
    fn test_lookup_failure_excludes_only_that_event() {
        let store = FakeStore::default();
        store.fail_contains_for("2");
        let batch = vec![movie_event("1", 1), movie_event("2", 2), movie_event("3", 3)];

        let partition = partition_new(batch, &store);
        assert_eq!(ids(&partition.fresh), vec!["1", "3"]);
        assert_eq!(partition.unreadable, vec!["2".to_string()]);
    }

    #[test]
    fn test_events_are_not_mutated() {
        let event = movie_event("9", 9);
        let partition = partition_new(vec![event.clone()], &FakeStore::default());
        assert_eq!(partition.fresh[0], event);
    }
}
