use super::content::SplitParts;
use super::dispatch::PartDispatcher;
use super::pause::{PauseHandle, SessionState};
use super::session::UploadSession;
use crate::client::UploadId;
use crate::client::request::*;
use crate::error::{Error, ErrorRepr, Result};

use futures::future::{AbortHandle, Abortable, Aborted};
use futures::stream::StreamExt as _;
use futures::ready;
use multipart_write::MultipartWrite;
use std::fmt::{self, Debug, Formatter};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// A multipart upload in progress.
///
/// This future drives the whole upload: it pulls parts from the content
/// source, keeps their upload requests running concurrently, and once every
/// part is done sends the request to complete the upload with all parts in
/// order.  It resolves with the completed object.
///
/// If a part fails or the content source errors, the remaining requests are
/// cancelled, the upload is aborted once, and the future resolves with the
/// error that started it.  Errors from the abort request itself are logged and
/// dropped.
///
/// If the upload is paused through a [`PauseHandle`], it resolves with an
/// error of kind [`ErrorKind::Paused`].
///
/// [`ErrorKind::Paused`]: crate::error::ErrorKind::Paused
#[must_use = "futures do nothing unless polled"]
#[pin_project::pin_project(project = UploadProj)]
pub struct Upload {
    session: Arc<UploadSession>,
    source: SplitParts,
    #[pin]
    dispatcher: PartDispatcher,
    #[pin]
    complete: Option<Abortable<SendCompleteUpload>>,
    #[pin]
    abort: Option<SendAbortUpload>,
    error: Option<Error>,
    terminated: bool,
}

impl Upload {
    pub(crate) fn new(
        session: Arc<UploadSession>,
        source: SplitParts,
        max_tasks: Option<usize>,
    ) -> Self {
        let dispatcher = PartDispatcher::new(session.clone(), max_tasks);
        Self {
            session,
            source,
            dispatcher,
            complete: None,
            abort: None,
            error: None,
            terminated: false,
        }
    }

    /// Returns a handle that can pause this upload from anywhere.
    pub fn pause_handle(&self) -> PauseHandle {
        PauseHandle::new(self.session.clone())
    }

    /// The ID of the upload.
    pub fn upload_id(&self) -> &UploadId {
        &self.session.data().id
    }

    /// The current state of the upload.
    pub fn state(&self) -> SessionState {
        self.session.state()
    }
}

impl UploadProj<'_> {
    fn paused(&self) -> Error {
        ErrorRepr::Paused {
            id: self.session.data().get_id(),
        }
        .into()
    }

    /// Take the failure path for `err`.
    ///
    /// Returns the error to resolve with now, or `None` when the abort request
    /// was started and has to finish first.
    fn fail(&mut self, err: Error) -> Option<Error> {
        if self.session.initiate_failure() {
            debug!(id = %self.session.data().id, error = %err, "aborting upload");
            self.dispatcher.as_mut().clear();
            self.complete.set(None);
            *self.error = Some(err);
            let req = AbortRequest::new(self.session.data());
            let fut = SendAbortUpload::new(self.session.client(), req);
            self.abort.set(Some(fut));
            return None;
        }
        if self.session.is_paused() {
            return Some(self.paused());
        }
        Some(err)
    }

    fn start_complete(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Error>> {
        let parts = ready!(self.dispatcher.as_mut().poll_complete(cx))?;
        let req = CompleteRequest::new(self.session.data(), parts);
        debug!(
            id = %req.id(),
            uri = %req.uri(),
            parts = req.completed_parts().count(),
            "completing upload",
        );
        let (handle, reg) = AbortHandle::new_pair();
        let fut = Abortable::new(SendCompleteUpload::new(self.session.client(), req), reg);
        self.complete.set(Some(fut));
        self.session.set_complete_handle(handle);
        Poll::Ready(Ok(()))
    }
}

impl Future for Upload {
    type Output = Result<CompletedUpload>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();
        assert!(!*this.terminated, "Upload polled after completion");

        this.session.activate(cx.waker());

        let out = loop {
            if let Some(fut) = this.abort.as_mut().as_pin_mut() {
                let res = ready!(fut.poll(cx));
                this.abort.set(None);
                if let Err(e) = res {
                    #[cfg(not(feature = "tracing"))]
                    let _ = e;
                    warn!(id = %this.session.data().id, error = %e, "abort upload failed");
                }
                let err = this.error.take().expect("failed upload has an error");
                break Err(err);
            }

            if let Some(fut) = this.complete.as_mut().as_pin_mut() {
                let res = ready!(fut.poll(cx));
                this.complete.set(None);
                match res {
                    Ok(Ok(done)) => {
                        this.session.set_completed();
                        debug!(
                            id = %this.session.data().id,
                            uri = %done.uri,
                            etag = %done.etag,
                            "completed upload",
                        );
                        break Ok(done);
                    }
                    Ok(Err(e)) => match this.fail(e) {
                        Some(e) => break Err(e),
                        None => continue,
                    },
                    Err(Aborted) => break Err(this.paused()),
                }
            }

            if this.session.is_paused() {
                break Err(this.paused());
            }

            match this.dispatcher.as_mut().poll_ready(cx) {
                Poll::Ready(Ok(())) if !this.session.is_producer_done() => {
                    match this.source.poll_next_unpin(cx) {
                        Poll::Ready(Some(Ok(part))) => {
                            if let Err(e) = this.dispatcher.as_mut().start_send(part) {
                                match this.fail(e) {
                                    Some(e) => break Err(e),
                                    None => continue,
                                }
                            }
                            continue;
                        }
                        Poll::Ready(Some(Err(e))) => match this.fail(e) {
                            Some(e) => break Err(e),
                            None => continue,
                        },
                        Poll::Ready(None) => {
                            this.session.set_producer_done();
                            continue;
                        }
                        Poll::Pending => return Poll::Pending,
                    }
                }
                Poll::Ready(Ok(())) => {}
                Poll::Ready(Err(e)) => match this.fail(e) {
                    Some(e) => break Err(e),
                    None => continue,
                },
                Poll::Pending => return Poll::Pending,
            }

            // Every part was handed off; wait for the last of them.
            match this.dispatcher.as_mut().poll_flush(cx) {
                Poll::Ready(Ok(())) => {}
                Poll::Ready(Err(e)) => match this.fail(e) {
                    Some(e) => break Err(e),
                    None => continue,
                },
                Poll::Pending => return Poll::Pending,
            }

            if !this.session.try_begin_completion() {
                return Poll::Pending;
            }
            if let Poll::Ready(Err(e)) = this.start_complete(cx) {
                match this.fail(e) {
                    Some(e) => break Err(e),
                    None => continue,
                }
            }
        };

        this.dispatcher.as_mut().clear();
        *this.terminated = true;
        Poll::Ready(out)
    }
}

impl Debug for Upload {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("session", &self.session)
            .field("source", &self.source)
            .field("dispatcher", &self.dispatcher)
            .field("complete", &self.complete.is_some())
            .field("abort", &self.abort.is_some())
            .field("error", &self.error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send<T: Send + 'static>() {}

    #[test]
    fn upload_can_be_spawned() {
        assert_send::<Upload>();
        assert_send::<PauseHandle>();
    }
}
