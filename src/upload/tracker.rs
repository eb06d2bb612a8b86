use crate::client::part::{CompletedPart, CompletedParts, PartNumber};

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Results of the parts of one upload.
///
/// `existing` is what a resumed upload already had and never changes.
/// `completed` fills in as part uploads finish, from any task.
#[derive(Debug, Default)]
pub(crate) struct CompletionTracker {
    existing: BTreeMap<PartNumber, CompletedPart>,
    completed: Mutex<BTreeMap<PartNumber, CompletedPart>>,
}

impl CompletionTracker {
    pub(crate) fn new(existing: CompletedParts) -> Self {
        let existing = existing
            .into_iter()
            .map(|part| (part.part_number, part))
            .collect();
        Self {
            existing,
            completed: Mutex::default(),
        }
    }

    pub(crate) fn is_existing(&self, part: PartNumber) -> bool {
        self.existing.contains_key(&part)
    }

    pub(crate) fn num_existing(&self) -> usize {
        self.existing.len()
    }

    pub(crate) fn record(&self, part: CompletedPart) {
        self.lock().insert(part.part_number, part);
    }

    pub(crate) fn num_completed(&self) -> usize {
        self.lock().len()
    }

    /// Number of parts done across both sessions.
    pub(crate) fn num_done(&self) -> usize {
        self.num_existing() + self.num_completed()
    }

    /// The parts `1..=part_count` in order, each taken from `existing` when it
    /// is there and from `completed` otherwise.
    ///
    /// # Panics
    ///
    /// Panics if a part has no result.  Every part number is either skipped
    /// because it exists or uploaded and recorded before this is called, so a
    /// missing one means the bookkeeping is broken.
    pub(crate) fn assemble(&self, part_count: u32) -> CompletedParts {
        let completed = self.lock();
        (1..=part_count)
            .map(PartNumber::new)
            .map(|n| {
                match self.existing.get(&n).or_else(|| completed.get(&n)) {
                    Some(part) => part.clone(),
                    None => panic!("no result recorded for {n} of {part_count}"),
                }
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PartNumber, CompletedPart>> {
        self.completed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(n: u32, etag: &str) -> CompletedPart {
        CompletedPart::new(PartNumber::new(n), etag.into(), 1)
    }

    #[test]
    fn existing_parts_win() {
        let tracker = CompletionTracker::new(vec![part(1, "old")].into());
        tracker.record(part(3, "c"));
        tracker.record(part(1, "new"));
        tracker.record(part(2, "b"));

        let parts = tracker.assemble(3);
        let etags = parts.iter().map(|p| p.etag.to_string()).collect::<Vec<_>>();
        assert_eq!(etags, vec!["old", "b", "c"]);
        assert_eq!(tracker.num_done(), 4);
    }

    #[test]
    fn completion_order_does_not_matter() {
        let tracker = CompletionTracker::default();
        for n in [5, 2, 4, 1, 3] {
            tracker.record(part(n, "x"));
        }
        let numbers = tracker.assemble(5).part_numbers();
        assert_eq!(numbers, (1..=5).map(PartNumber::new).collect::<Vec<_>>());
    }

    #[test]
    #[should_panic(expected = "no result recorded for part_2")]
    fn missing_part_panics() {
        let tracker = CompletionTracker::default();
        tracker.record(part(1, "a"));
        tracker.record(part(3, "c"));
        tracker.assemble(3);
    }
}
