use std::sync::atomic::{AtomicU8, Ordering};

const RUNNING: u8 = 0;
const PAUSED: u8 = 1;
const FAILED: u8 = 2;

/// One-shot guard on the failure path of an upload.
///
/// Any number of parts may fail at once; only the first caller of
/// `try_initiate` gets to cancel the rest and abort the upload.  Pausing and
/// failing claim the same slot, so an upload is either paused or failed, never
/// both: failures after a pause are cancellations and never initiate
/// anything, and a pause after a failure is refused.
#[derive(Debug, Default)]
pub(crate) struct FailureCoordinator {
    outcome: AtomicU8,
}

impl FailureCoordinator {
    /// Returns `true` for exactly one caller, and only when the upload is not
    /// paused.
    pub(crate) fn try_initiate(&self) -> bool {
        self.outcome
            .compare_exchange(RUNNING, FAILED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Mark the upload paused.
    ///
    /// Returns `None` if it already failed, otherwise whether this call was
    /// the one that paused it.
    pub(crate) fn try_pause(&self) -> Option<bool> {
        match self
            .outcome
            .compare_exchange(RUNNING, PAUSED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Some(true),
            Err(PAUSED) => Some(false),
            Err(_) => None,
        }
    }

    pub(crate) fn has_failed(&self) -> bool {
        self.outcome.load(Ordering::Acquire) == FAILED
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.outcome.load(Ordering::Acquire) == PAUSED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[test]
    fn only_one_of_many_wins() {
        let coordinator = Arc::new(FailureCoordinator::default());
        let winners = Arc::new(AtomicUsize::new(0));

        let handles = (0..16)
            .map(|_| {
                let coordinator = coordinator.clone();
                let winners = winners.clone();
                thread::spawn(move || {
                    if coordinator.try_initiate() {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect::<Vec<_>>();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert!(coordinator.has_failed());
    }

    #[test]
    fn pause_takes_precedence() {
        let coordinator = FailureCoordinator::default();
        assert_eq!(coordinator.try_pause(), Some(true));
        assert_eq!(coordinator.try_pause(), Some(false));
        assert!(!coordinator.try_initiate());
        assert!(!coordinator.has_failed());
        assert!(coordinator.is_paused());
    }

    #[test]
    fn pause_after_failure_is_refused() {
        let coordinator = FailureCoordinator::default();
        assert!(coordinator.try_initiate());
        assert_eq!(coordinator.try_pause(), None);
        assert!(!coordinator.is_paused());
    }

    #[test]
    fn racing_pause_and_failure_have_one_outcome() {
        for _ in 0..200 {
            let coordinator = Arc::new(FailureCoordinator::default());
            let pauser = {
                let coordinator = coordinator.clone();
                thread::spawn(move || coordinator.try_pause())
            };
            let failer = {
                let coordinator = coordinator.clone();
                thread::spawn(move || coordinator.try_initiate())
            };
            let paused = pauser.join().unwrap();
            let failed = failer.join().unwrap();

            assert!(paused.is_some() != failed);
            assert!(coordinator.is_paused() != coordinator.has_failed());
        }
    }
}
