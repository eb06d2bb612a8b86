use s3_resumable_upload::error::{Error, ErrorKind, Result};
use s3_resumable_upload::request::*;
use s3_resumable_upload::{MemoryClient, SendRequest};

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// `MemoryClient` with hooks to hold back requests, make parts fail, and
/// count what was sent.
#[derive(Debug, Clone, Default)]
pub struct TestClient {
    pub store: MemoryClient,
    gates: Arc<Mutex<HashMap<u32, Arc<Semaphore>>>>,
    complete_gate: Arc<Mutex<Option<Arc<Semaphore>>>>,
    failing: Arc<Mutex<HashSet<u32>>>,
    abort_fails: Arc<AtomicBool>,
    delay: Option<Duration>,
    calls: Arc<Calls>,
}

#[derive(Debug, Default)]
pub struct Calls {
    pub create: AtomicUsize,
    pub parts: AtomicUsize,
    pub complete: AtomicUsize,
    pub abort: AtomicUsize,
    pub list: AtomicUsize,
    /// Part requests dropped before they finished.
    pub cancelled: AtomicUsize,
    /// Complete requests dropped before they finished.
    pub complete_cancelled: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    uploaded: Mutex<Vec<u32>>,
}

/// Counts a request as cancelled if it is dropped before `finish`.
struct Guard<'a> {
    in_flight: Option<&'a AtomicUsize>,
    cancelled: &'a AtomicUsize,
    done: bool,
}

impl<'a> Guard<'a> {
    fn part(calls: &'a Calls) -> Self {
        let n = calls.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        calls.max_in_flight.fetch_max(n, Ordering::SeqCst);
        Self {
            in_flight: Some(&calls.in_flight),
            cancelled: &calls.cancelled,
            done: false,
        }
    }

    fn complete(calls: &'a Calls) -> Self {
        Self {
            in_flight: None,
            cancelled: &calls.complete_cancelled,
            done: false,
        }
    }

    fn finish(mut self) {
        self.done = true;
    }
}

impl Drop for Guard<'_> {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight {
            in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        if !self.done {
            self.cancelled.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl TestClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every part request sleeps this long first.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> &Calls {
        &self.calls
    }

    /// Part numbers that uploaded successfully, in the order they finished.
    pub fn uploaded(&self) -> Vec<u32> {
        self.calls.uploaded.lock().unwrap().clone()
    }

    /// Hold requests for part `n` until `release_part(n)`.
    pub fn hold_part(&self, n: u32) {
        let gate = Arc::new(Semaphore::new(0));
        self.gates.lock().unwrap().insert(n, gate);
    }

    pub fn release_part(&self, n: u32) {
        if let Some(gate) = self.gates.lock().unwrap().remove(&n) {
            gate.close();
        }
    }

    /// Hold complete requests until `release_complete()`.
    pub fn hold_complete(&self) {
        *self.complete_gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_complete(&self) {
        if let Some(gate) = self.complete_gate.lock().unwrap().take() {
            gate.close();
        }
    }

    /// Requests for part `n` fail, after any hold on them is released.
    pub fn fail_part(&self, n: u32) {
        self.failing.lock().unwrap().insert(n);
    }

    /// Abort requests fail without touching the store.
    pub fn fail_abort(&self) {
        self.abort_fails.store(true, Ordering::SeqCst);
    }

    fn gate(&self, n: u32) -> Option<Arc<Semaphore>> {
        self.gates.lock().unwrap().get(&n).cloned()
    }

    fn is_failing(&self, n: u32) -> bool {
        self.failing.lock().unwrap().contains(&n)
    }
}

impl SendRequest for TestClient {
    async fn send_create_upload_request(&self, req: CreateRequest) -> Result<UploadData> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        self.store.send_create_upload_request(req).await
    }

    async fn send_new_part_upload_request(&self, req: UploadPartRequest) -> Result<CompletedPart> {
        self.calls.parts.fetch_add(1, Ordering::SeqCst);
        let n = *req.part_number();
        let guard = Guard::part(&self.calls);

        if let Some(gate) = self.gate(n) {
            // Closing the semaphore is the release.
            let _ = gate.acquire().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.is_failing(n) {
            guard.finish();
            return Err(Error::from_kind(ErrorKind::Sdk, "injected part failure"));
        }

        let res = self.store.send_new_part_upload_request(req).await;
        if res.is_ok() {
            self.calls.uploaded.lock().unwrap().push(n);
        }
        guard.finish();
        res
    }

    async fn send_complete_upload_request(&self, req: CompleteRequest) -> Result<CompletedUpload> {
        self.calls.complete.fetch_add(1, Ordering::SeqCst);
        let guard = Guard::complete(&self.calls);

        let gate = self.complete_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let _ = gate.acquire().await;
        }

        let res = self.store.send_complete_upload_request(req).await;
        guard.finish();
        res
    }

    async fn send_abort_upload_request(&self, req: AbortRequest) -> Result<()> {
        self.calls.abort.fetch_add(1, Ordering::SeqCst);
        if self.abort_fails.load(Ordering::SeqCst) {
            return Err(Error::from_kind(ErrorKind::Sdk, "injected abort failure"));
        }
        self.store.send_abort_upload_request(req).await
    }

    async fn send_list_parts_request(&self, req: ListPartsRequest) -> Result<CompletedParts> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        self.store.send_list_parts_request(req).await
    }
}
