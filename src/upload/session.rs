use super::failure::FailureCoordinator;
use super::pause::{ResumeToken, SessionState};
use super::plan::PartPlan;
use super::tracker::CompletionTracker;
use crate::client::part::{CompletedParts, PartNumber};
use crate::client::{UploadClient, UploadData};

use futures::future::AbortHandle;
use futures::task::AtomicWaker;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::Waker;

/// State shared by the task driving an upload and its pause handles.
///
/// All of it is atomics or short critical sections; no lock is held across
/// an await.
pub(crate) struct UploadSession {
    data: UploadData,
    client: UploadClient,
    plan: PartPlan,
    tracker: CompletionTracker,
    failure: FailureCoordinator,
    in_flight: AtomicUsize,
    next_part: AtomicU32,
    started: AtomicBool,
    producer_done: AtomicBool,
    completing: AtomicBool,
    completed: AtomicBool,
    part_handles: Mutex<HashMap<PartNumber, AbortHandle>>,
    complete_handle: Mutex<Option<AbortHandle>>,
    waker: AtomicWaker,
}

impl UploadSession {
    pub(crate) fn new(
        client: UploadClient,
        data: UploadData,
        plan: PartPlan,
        existing: CompletedParts,
    ) -> Arc<Self> {
        Arc::new(Self {
            data,
            client,
            plan,
            tracker: CompletionTracker::new(existing),
            failure: FailureCoordinator::default(),
            in_flight: AtomicUsize::new(0),
            next_part: AtomicU32::new(1),
            started: AtomicBool::new(false),
            producer_done: AtomicBool::new(false),
            completing: AtomicBool::new(false),
            completed: AtomicBool::new(false),
            part_handles: Mutex::default(),
            complete_handle: Mutex::default(),
            waker: AtomicWaker::new(),
        })
    }

    pub(crate) fn data(&self) -> &UploadData {
        &self.data
    }

    pub(crate) fn client(&self) -> &UploadClient {
        &self.client
    }

    pub(crate) fn plan(&self) -> &PartPlan {
        &self.plan
    }

    pub(crate) fn tracker(&self) -> &CompletionTracker {
        &self.tracker
    }

    pub(crate) fn state(&self) -> SessionState {
        if self.completed.load(Ordering::Acquire) {
            SessionState::Completed
        } else if self.failure.has_failed() {
            SessionState::Failed
        } else if self.is_paused() {
            SessionState::Paused
        } else if self.completing.load(Ordering::Acquire) {
            SessionState::Completing
        } else if self.started.load(Ordering::Acquire) {
            SessionState::Active
        } else {
            SessionState::NotStarted
        }
    }

    /// Called on every poll of the upload with the waker of its task.
    pub(crate) fn activate(&self, waker: &Waker) {
        self.waker.register(waker);
        if !self.started.swap(true, Ordering::AcqRel) {
            debug!(
                id = %self.data.id,
                uri = %self.data.uri,
                parts = self.plan.part_count(),
                existing = self.tracker.num_existing(),
                "upload active",
            );
        }
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.failure.is_paused()
    }

    pub(crate) fn has_failed(&self) -> bool {
        self.failure.has_failed()
    }

    /// Take the next part number.
    pub(crate) fn next_part_number(&self) -> PartNumber {
        PartNumber::new(self.next_part.fetch_add(1, Ordering::AcqRel))
    }

    /// Record that the request for `part` was sent, and keep its handle so it
    /// can be cancelled.
    pub(crate) fn begin_part(&self, part: PartNumber, handle: AbortHandle) {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        let mut handles = self.part_handles();
        // Paused or failed between taking the part number and getting here.
        if self.is_paused() || self.has_failed() {
            handle.abort();
        }
        handles.insert(part, handle);
    }

    /// Record that the request for `part` resolved, one way or another.
    pub(crate) fn end_part(&self, part: PartNumber) {
        self.part_handles().remove(&part);
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub(crate) fn set_producer_done(&self) {
        if !self.producer_done.swap(true, Ordering::AcqRel) {
            trace!(id = %self.data.id, "content source done");
        }
    }

    pub(crate) fn is_producer_done(&self) -> bool {
        self.producer_done.load(Ordering::Acquire)
    }

    /// Returns `true` exactly once, the first time every part is done and the
    /// upload is neither paused nor failed.
    pub(crate) fn try_begin_completion(&self) -> bool {
        self.is_producer_done()
            && self.in_flight() == 0
            && !self.is_paused()
            && !self.has_failed()
            && self
                .completing
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
    }

    /// Keep the handle of the complete request so a pause can cancel it.
    pub(crate) fn set_complete_handle(&self, handle: AbortHandle) {
        let mut slot = self.complete_handle();
        if self.is_paused() {
            handle.abort();
        }
        *slot = Some(handle);
    }

    pub(crate) fn set_completed(&self) {
        self.completed.store(true, Ordering::Release);
        self.complete_handle().take();
    }

    /// Pause the upload, returning the token to resume it.
    pub(crate) fn pause(&self) -> Option<ResumeToken> {
        if self.completed.load(Ordering::Acquire) {
            return None;
        }

        // Claims the same slot as the failure path, so a failed upload is
        // never also handed out as paused.
        if self.failure.try_pause()? {
            if let Some(handle) = self.complete_handle().take() {
                handle.abort();
            }
            self.cancel_parts();
            debug!(
                id = %self.data.id,
                completed = self.tracker.num_done(),
                "paused upload",
            );
            self.waker.wake();
        }

        Some(self.resume_token())
    }

    /// Claim the failure path.  On success every part request in flight is
    /// cancelled and the caller is responsible for aborting the upload.
    pub(crate) fn initiate_failure(&self) -> bool {
        if !self.failure.try_initiate() {
            return false;
        }
        self.cancel_parts();
        debug!(id = %self.data.id, "upload failed");
        true
    }

    pub(crate) fn resume_token(&self) -> ResumeToken {
        let done = u32::try_from(self.tracker.num_done()).unwrap_or(u32::MAX);
        ResumeToken::new(
            self.data.get_id(),
            self.plan.part_size(),
            self.plan.part_count(),
            done,
        )
    }

    fn cancel_parts(&self) {
        let handles = self.part_handles();
        for handle in handles.values() {
            handle.abort();
        }
        trace!(id = %self.data.id, cancelled = handles.len(), "cancelled part uploads");
    }

    fn part_handles(&self) -> MutexGuard<'_, HashMap<PartNumber, AbortHandle>> {
        self.part_handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn complete_handle(&self) -> MutexGuard<'_, Option<AbortHandle>> {
        self.complete_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Debug for UploadSession {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadSession")
            .field("data", &self.data)
            .field("plan", &self.plan)
            .field("state", &self.state())
            .field("in_flight", &self.in_flight())
            .field("parts_done", &self.tracker.num_done())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryClient;
    use crate::client::part::CompletedPart;
    use crate::uri::ObjectUri;

    use futures::future::{AbortRegistration, Abortable, Aborted};
    use futures::executor::block_on;

    fn session(existing: CompletedParts) -> Arc<UploadSession> {
        let data = UploadData::new("upload-1", ObjectUri::from(("bucket", "key")));
        let client = UploadClient::new(MemoryClient::new());
        UploadSession::new(client, data, PartPlan::new(30, 10), existing)
    }

    fn part(n: u32) -> CompletedPart {
        CompletedPart::new(PartNumber::new(n), "etag".into(), 10)
    }

    fn pending(reg: AbortRegistration) -> Abortable<futures::future::Pending<()>> {
        Abortable::new(futures::future::pending(), reg)
    }

    #[test]
    fn pause_cancels_in_flight_parts_and_counts_finished() {
        let session = session(vec![part(1)].into());
        session.tracker().record(part(2));

        let (handle, reg) = AbortHandle::new_pair();
        let n = PartNumber::new(3);
        session.begin_part(n, handle);

        let token = session.pause().unwrap();
        assert_eq!(token.num_parts_completed(), 2);
        assert_eq!(token.total_part_count(), 3);
        assert_eq!(token.part_size(), 10);
        assert_eq!(block_on(pending(reg)), Err(Aborted));
        assert_eq!(session.state(), SessionState::Paused);

        // Second call changes nothing.
        assert_eq!(session.pause(), Some(token));
    }

    #[test]
    fn completion_fires_once() {
        let session = session(CompletedParts::default());
        assert!(!session.try_begin_completion());
        session.set_producer_done();
        assert!(session.try_begin_completion());
        assert!(!session.try_begin_completion());
        assert_eq!(session.state(), SessionState::Completing);
    }

    #[test]
    fn completion_waits_for_parts_in_flight() {
        let session = session(CompletedParts::default());
        let (handle, _reg) = AbortHandle::new_pair();
        session.begin_part(PartNumber::new(1), handle);
        session.set_producer_done();
        assert!(!session.try_begin_completion());
        session.end_part(PartNumber::new(1));
        assert!(session.try_begin_completion());
    }

    #[test]
    fn no_failure_after_pause_and_no_pause_after_failure() {
        let paused = session(CompletedParts::default());
        assert!(paused.pause().is_some());
        assert!(!paused.initiate_failure());

        let failed = session(CompletedParts::default());
        assert!(failed.initiate_failure());
        assert!(!failed.initiate_failure());
        assert!(failed.pause().is_none());
        assert_eq!(failed.state(), SessionState::Failed);
    }
}
