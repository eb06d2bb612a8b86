use super::plan::PartPlan;
use crate::error::{Error, ErrorRepr, Result};

use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, Stream, StreamExt as _, TryStreamExt as _};
use futures::{future, ready};
use std::fmt::{self, Debug, Formatter};
use std::pin::Pin;
use std::task::{Context, Poll};

/// The bytes of the object to upload.
///
/// A `ContentSource` is a declared length together with a stream of buffers
/// of any size.  When the upload starts it is cut into parts of the configured
/// size, pulling from the stream only when another part is needed.
///
/// The stream must produce exactly the declared number of bytes, and when an
/// upload is resumed it must produce the same bytes it did the first time.
pub struct ContentSource {
    length: u64,
    body: BoxStream<'static, Result<Bytes>>,
}

impl ContentSource {
    /// Content that is already in memory.
    pub fn from_bytes<B: Into<Bytes>>(bytes: B) -> Self {
        let bytes = bytes.into();
        Self {
            length: bytes.len() as u64,
            body: stream::once(future::ready(Ok(bytes))).boxed(),
        }
    }

    /// Content that is produced by a stream, of which there will be `length`
    /// bytes in total.
    ///
    /// An error from the stream fails the upload.
    pub fn from_stream<S, B, E>(length: u64, stream: S) -> Self
    where
        S: Stream<Item = Result<B, E>> + Send + 'static,
        B: Into<Bytes> + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        let body = stream.map_ok(Into::into).map_err(Error::content).boxed();
        Self { length, body }
    }

    /// The declared length of the content.
    pub fn len(&self) -> u64 {
        self.length
    }

    /// Returns `true` if the content is empty.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub(crate) fn into_parts(self, plan: PartPlan) -> SplitParts {
        SplitParts {
            inner: self.body,
            plan,
            rest: Bytes::new(),
            buf: BytesMut::new(),
            emitted: 0,
            received: 0,
            finished: false,
        }
    }
}

impl Debug for ContentSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentSource")
            .field("length", &self.length)
            .field("body", &"Stream<Item = Result<Bytes>>")
            .finish()
    }
}

/// Stream of part bodies cut from a `ContentSource` according to a plan.
///
/// It yields exactly `plan.part_count()` items, then ends once the inner
/// stream does.  Whole parts are sliced out of large buffers without copying;
/// parts that span buffers are copied into one.
pub(crate) struct SplitParts {
    inner: BoxStream<'static, Result<Bytes>>,
    plan: PartPlan,
    rest: Bytes,
    buf: BytesMut,
    emitted: u32,
    received: u64,
    finished: bool,
}

impl SplitParts {
    fn length_mismatch(&mut self) -> Poll<Option<Result<Bytes>>> {
        self.finished = true;
        let err = ErrorRepr::ContentLength {
            expected: self.plan.content_length(),
            actual: self.received,
        };
        Poll::Ready(Some(Err(err.into())))
    }

    fn emit(&mut self, part: Bytes) -> Poll<Option<Result<Bytes>>> {
        self.emitted += 1;
        Poll::Ready(Some(Ok(part)))
    }

    fn next_part_len(&self) -> usize {
        let n = (self.emitted + 1).into();
        self.plan
            .part_range(n)
            .map(|r| (r.end - r.start) as usize)
            .unwrap_or_default()
    }
}

impl Stream for SplitParts {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        loop {
            if this.finished {
                return Poll::Ready(None);
            }

            if this.emitted == this.plan.part_count() {
                if !this.rest.is_empty() {
                    return this.length_mismatch();
                }
                match ready!(this.inner.poll_next_unpin(cx)) {
                    Some(Ok(chunk)) if chunk.is_empty() => continue,
                    Some(Ok(chunk)) => {
                        this.received += chunk.len() as u64;
                        return this.length_mismatch();
                    }
                    Some(Err(e)) => {
                        this.finished = true;
                        return Poll::Ready(Some(Err(e)));
                    }
                    None => {
                        this.finished = true;
                        return Poll::Ready(None);
                    }
                }
            }

            let want = this.next_part_len();
            if this.buf.is_empty() && this.rest.len() >= want {
                let part = this.rest.split_to(want);
                return this.emit(part);
            }
            if !this.rest.is_empty() {
                let take = (want - this.buf.len()).min(this.rest.len());
                this.buf.extend_from_slice(&this.rest.split_to(take));
            }
            if this.buf.len() == want {
                let part = this.buf.split().freeze();
                return this.emit(part);
            }

            match ready!(this.inner.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => {
                    this.received += chunk.len() as u64;
                    this.rest = chunk;
                }
                Some(Err(e)) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(e)));
                }
                None => return this.length_mismatch(),
            }
        }
    }
}

impl Debug for SplitParts {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitParts")
            .field("plan", &self.plan)
            .field("emitted", &self.emitted)
            .field("received", &self.received)
            .field("finished", &self.finished)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    use futures::executor::block_on_stream;
    use std::io;

    fn chunks(chunks: &[&'static [u8]]) -> ContentSource {
        let len = chunks.iter().map(|c| c.len() as u64).sum();
        let items = chunks
            .iter()
            .map(|c| Ok::<_, io::Error>(Bytes::from_static(c)))
            .collect::<Vec<_>>();
        ContentSource::from_stream(len, stream::iter(items))
    }

    fn split(content: ContentSource, part_size: u64) -> Vec<Result<Bytes>> {
        let plan = PartPlan::new(content.len(), part_size);
        block_on_stream(content.into_parts(plan)).collect()
    }

    #[test]
    fn one_buffer_is_sliced() {
        let parts = split(ContentSource::from_bytes(&b"abcdefgh"[..]), 3);
        let parts = parts.into_iter().collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(parts, vec![&b"abc"[..], &b"def"[..], &b"gh"[..]]);
    }

    #[test]
    fn small_buffers_are_joined() {
        let parts = split(chunks(&[b"a", b"bc", b"d", b"efg", b"h"]), 4);
        let parts = parts.into_iter().collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(parts, vec![&b"abcd"[..], &b"efgh"[..]]);
    }

    #[test]
    fn empty_content_is_one_empty_part() {
        let parts = split(ContentSource::from_bytes(Bytes::new()), 8);
        assert_eq!(parts.len(), 1);
        assert!(parts[0].as_ref().unwrap().is_empty());
    }

    #[test]
    fn short_content_is_an_error() {
        let items = vec![Ok::<_, io::Error>(Bytes::from_static(b"abcd"))];
        let content = ContentSource::from_stream(10, stream::iter(items));
        let parts = split(content, 4);
        assert_eq!(parts.len(), 2);
        assert!(parts[0].is_ok());
        let err = parts[1].as_ref().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Content);
    }

    #[test]
    fn long_content_is_an_error() {
        let items = vec![
            Ok::<_, io::Error>(Bytes::from_static(b"abcd")),
            Ok(Bytes::from_static(b"e")),
        ];
        let content = ContentSource::from_stream(4, stream::iter(items));
        let parts = split(content, 4);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].as_ref().unwrap(), &b"abcd"[..]);
        assert_eq!(parts[1].as_ref().unwrap_err().kind(), ErrorKind::Content);
    }

    #[test]
    fn stream_error_ends_the_parts() {
        let items = vec![
            Ok(Bytes::from_static(b"ab")),
            Err(io::Error::other("disk on fire")),
        ];
        let content = ContentSource::from_stream(4, stream::iter(items));
        let parts = split(content, 2);
        assert_eq!(parts.len(), 2);
        assert!(parts[1].is_err());
    }
}
