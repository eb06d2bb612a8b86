use super::UploadPartRequestBuilder;
use crate::AWS_MAX_PART_COUNT;
use crate::client::part::{CompletedPart, PartNumber};
use crate::client::{UploadClient, UploadData, UploadId};
use crate::error::{ErrorRepr, Result};
use crate::uri::ObjectUri;

use aws_sdk::primitives::ByteStream;
use bytes::Bytes;
use futures::future::BoxFuture;
use std::fmt::{self, Debug, Formatter};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Sending a request to add a part to an existing multipart upload.
pub struct SendUploadPart(BoxFuture<'static, Result<CompletedPart>>);

impl SendUploadPart {
    /// Create a new `SendUploadPart`.
    pub fn new(client: &UploadClient, req: UploadPartRequest) -> Self {
        let inner = client.inner.clone();
        Self(Box::pin(async move { inner.send_upload(req).await }))
    }
}

impl Future for SendUploadPart {
    type Output = Result<CompletedPart>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.0.as_mut().poll(cx)
    }
}

impl Debug for SendUploadPart {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SendUploadPart")
            .field(&"Future<Output = Result<CompletedPart>>")
            .finish()
    }
}

/// Request object for uploading a new part.
#[derive(Debug, Clone)]
pub struct UploadPartRequest {
    pub(crate) id: UploadId,
    pub(crate) uri: ObjectUri,
    pub(crate) body: Bytes,
    pub(crate) part_number: PartNumber,
}

impl UploadPartRequest {
    /// Create a new `UploadPartRequest` from the minimum required.
    pub fn new(data: &UploadData, body: Bytes, part_number: PartNumber) -> Self {
        Self {
            id: data.get_id(),
            uri: data.get_uri(),
            body,
            part_number,
        }
    }

    /// Set the required properties on the SDK request builder for the operation.
    ///
    /// The body is a reference-counted clone of the part's bytes.
    pub fn with_builder(&self, builder: UploadPartRequestBuilder) -> Result<UploadPartRequestBuilder> {
        let part_number = self.part_number.as_sdk()?;
        Ok(builder
            .upload_id(&*self.id)
            .bucket(&*self.uri.bucket)
            .key(&*self.uri.key)
            .part_number(part_number)
            .content_length(self.body.len() as i64)
            .body(ByteStream::from(self.body.clone())))
    }

    /// Returns a reference to the assigned `UploadId` for this request.
    pub fn id(&self) -> &UploadId {
        &self.id
    }

    /// Returns a reference to the `ObjectUri` for this request.
    pub fn uri(&self) -> &ObjectUri {
        &self.uri
    }

    /// Returns a reference to the part's bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the `PartNumber` for this request.
    pub fn part_number(&self) -> PartNumber {
        self.part_number
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.id.is_empty() || self.uri.is_empty() {
            return Err(
                ErrorRepr::Missing("UploadPartRequest", "empty upload id and/or uri").into(),
            );
        }
        if *self.part_number == 0 || *self.part_number > AWS_MAX_PART_COUNT {
            return Err(ErrorRepr::PartNumber(self.part_number).into());
        }
        Ok(())
    }
}
