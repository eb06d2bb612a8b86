use super::session::UploadSession;
use crate::client::part::{CompletedPart, CompletedParts, PartNumber};
use crate::client::request::{SendUploadPart, UploadPartRequest};
use crate::error::{Error, Result};

use bytes::Bytes;
use futures::future::{AbortHandle, Abortable, Aborted};
use futures::stream::FuturesUnordered;
use futures::{Stream, ready};
use multipart_write::MultipartWrite;
use std::fmt::{self, Debug, Formatter};
use std::num::NonZeroUsize;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Returned when a part was handed to the dispatcher.
///
/// Sent does not mean uploaded, only that the request is on its way, or that
/// it was not needed because the part exists from before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartDispatched {
    /// The part number assigned to the part.
    pub part: PartNumber,
    /// The size in bytes of the part.
    pub bytes: u64,
    /// `true` if the part was already uploaded and no request was sent.
    pub skipped: bool,
}

/// `MultipartWrite` that sends a part upload request for each part written to
/// it.
///
/// Part numbers are assigned in the order parts arrive, starting from 1.
/// Requests run concurrently; with a capacity set, `poll_ready` is pending
/// while that many are in flight.  Completing it waits for every request and
/// returns all parts of the upload in order.
#[must_use = "futures do nothing unless polled"]
#[pin_project::pin_project]
pub(crate) struct PartDispatcher {
    session: Arc<UploadSession>,
    #[pin]
    pending: FuturesUnordered<PendingPart>,
    capacity: Option<NonZeroUsize>,
}

impl PartDispatcher {
    pub(crate) fn new(session: Arc<UploadSession>, capacity: Option<usize>) -> Self {
        Self {
            session,
            pending: FuturesUnordered::new(),
            capacity: capacity.and_then(NonZeroUsize::new),
        }
    }

    /// Drop every request still pending.
    pub(crate) fn clear(self: Pin<&mut Self>) {
        self.project().pending.set(FuturesUnordered::new());
    }
}

fn on_resolved(
    session: &UploadSession,
    part: PartNumber,
    res: Result<Result<CompletedPart>, Aborted>,
) -> Result<()> {
    let out = match res {
        Ok(Ok(v)) => {
            trace!(
                id = %session.data().id,
                part = %v.part_number,
                etag = %v.etag,
                size = v.part_size,
                "completed part",
            );
            session.tracker().record(v);
            Ok(())
        }
        Ok(Err(e)) => Err(e),
        Err(Aborted) => {
            trace!(id = %session.data().id, %part, "part upload cancelled");
            Ok(())
        }
    };
    session.end_part(part);
    out
}

impl MultipartWrite<Bytes> for PartDispatcher {
    type Ret = PartDispatched;
    type Error = Error;
    type Output = CompletedParts;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        let mut this = self.project();
        while let Poll::Ready(Some((part, res))) = this.pending.as_mut().poll_next(cx) {
            on_resolved(this.session, part, res)?;
        }
        if this.capacity.is_none_or(|n| this.pending.len() < n.get()) {
            Poll::Ready(Ok(()))
        } else {
            Poll::Pending
        }
    }

    fn start_send(self: Pin<&mut Self>, body: Bytes) -> Result<Self::Ret> {
        let this = self.project();
        let session = &**this.session;
        let part = session.next_part_number();
        let bytes = body.len() as u64;

        if session.tracker().is_existing(part) {
            trace!(id = %session.data().id, %part, "skipping existing part");
            return Ok(PartDispatched {
                part,
                bytes,
                skipped: true,
            });
        }

        let req = UploadPartRequest::new(session.data(), body, part);
        let (handle, reg) = AbortHandle::new_pair();
        session.begin_part(part, handle);
        let fut = Abortable::new(SendUploadPart::new(session.client(), req), reg);
        this.pending.push(PendingPart { part, fut });

        trace!(id = %session.data().id, %part, bytes, "part upload sent");
        Ok(PartDispatched {
            part,
            bytes,
            skipped: false,
        })
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        let mut this = self.project();
        while let Some((part, res)) = ready!(this.pending.as_mut().poll_next(cx)) {
            on_resolved(this.session, part, res)?;
        }
        Poll::Ready(Ok(()))
    }

    fn poll_complete(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<Self::Output>> {
        ready!(self.as_mut().poll_flush(cx))?;
        let session = &self.session;
        Poll::Ready(Ok(session.tracker().assemble(session.plan().part_count())))
    }
}

impl Debug for PartDispatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartDispatcher")
            .field("session", &self.session)
            .field("pending", &self.pending.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// A part upload request that can be cancelled, tagged with its part number.
#[pin_project::pin_project]
struct PendingPart {
    part: PartNumber,
    #[pin]
    fut: Abortable<SendUploadPart>,
}

impl Future for PendingPart {
    type Output = (PartNumber, Result<Result<CompletedPart>, Aborted>);

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let res = ready!(this.fut.poll(cx));
        Poll::Ready((*this.part, res))
    }
}
