use super::ListPartsRequestBuilder;
use crate::client::part::CompletedParts;
use crate::client::{UploadClient, UploadData, UploadId};
use crate::error::{ErrorRepr, Result};
use crate::uri::ObjectUri;

use futures::future::BoxFuture;
use std::fmt::{self, Debug, Formatter};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Sending a request to list the parts already uploaded to an upload.
pub struct SendListParts(BoxFuture<'static, Result<CompletedParts>>);

impl SendListParts {
    /// Create a new `SendListParts`.
    pub fn new(client: &UploadClient, req: ListPartsRequest) -> Self {
        let inner = client.inner.clone();
        Self(Box::pin(async move { inner.send_list_parts(req).await }))
    }
}

impl Future for SendListParts {
    type Output = Result<CompletedParts>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.0.as_mut().poll(cx)
    }
}

impl Debug for SendListParts {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SendListParts")
            .field(&"Future<Output = Result<CompletedParts>>")
            .finish()
    }
}

/// Request object for listing the parts of a multipart upload.
///
/// The response is paginated by the store; implementations of
/// [`SendRequest`] return every page collected into one value.
///
/// [`SendRequest`]: crate::SendRequest
#[derive(Debug, Clone)]
pub struct ListPartsRequest {
    pub(crate) id: UploadId,
    pub(crate) uri: ObjectUri,
}

impl ListPartsRequest {
    /// Create a new `ListPartsRequest` from the minimum required.
    pub fn new(data: &UploadData) -> Self {
        Self {
            id: data.get_id(),
            uri: data.get_uri(),
        }
    }

    /// Set the required properties on the SDK request builder for the operation.
    pub fn with_builder(&self, builder: ListPartsRequestBuilder) -> ListPartsRequestBuilder {
        builder
            .bucket(&*self.uri.bucket)
            .key(&*self.uri.key)
            .upload_id(&*self.id)
    }

    /// Returns a reference to the assigned `UploadId` for this request.
    pub fn id(&self) -> &UploadId {
        &self.id
    }

    /// Returns a reference to the `ObjectUri` for this request.
    pub fn uri(&self) -> &ObjectUri {
        &self.uri
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.id.is_empty() || self.uri.is_empty() {
            return Err(
                ErrorRepr::Missing("ListPartsRequest", "empty upload id and/or uri").into(),
            );
        }
        Ok(())
    }
}
