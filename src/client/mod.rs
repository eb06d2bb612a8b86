//! This module contains `SendRequest`, which defines the operations the
//! upload engine needs from an object store.
use self::inner::{BoxedSendRequest, SendRequestInner};
use self::part::{CompletedPart, CompletedParts};
use self::request::*;
use crate::create_upload::CreateMultipartUploadOutput as CreateResponse;
use crate::error::{ErrorRepr, Result};
use crate::uri::ObjectUri;

use futures::future::Future;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::{self, Debug, Display, Formatter};
use std::ops::Deref;
use std::sync::Arc;

mod inner;

mod memory;
pub use memory::MemoryClient;

pub mod part;
pub mod request;

mod sdk;
pub use sdk::SdkClient;

/// `SendRequest` represents the atomic operations in a multipart upload.
pub trait SendRequest: Send + Sync {
    /// Send a request to create a new multipart upload, returning an
    /// [`UploadData`] having the upload ID assignment.
    fn send_create_upload_request(
        &self,
        req: CreateRequest,
    ) -> impl Future<Output = Result<UploadData>> + Send;

    /// Send a request to upload a part to a multipart upload, returning the
    /// [`CompletedPart`] containing entity tag and part number, which are required
    /// in the subsequent complete upload request.
    fn send_new_part_upload_request(
        &self,
        req: UploadPartRequest,
    ) -> impl Future<Output = Result<CompletedPart>> + Send;

    /// Send a request to complete a multipart upload, returning a
    /// [`CompletedUpload`], which has the unique entity tag of the object as well
    /// as the object URI.
    fn send_complete_upload_request(
        &self,
        req: CompleteRequest,
    ) -> impl Future<Output = Result<CompletedUpload>> + Send;

    /// Send a request to abort a multipart upload, discarding the parts the
    /// store is holding for it.
    fn send_abort_upload_request(&self, req: AbortRequest)
    -> impl Future<Output = Result<()>> + Send;

    /// Send a request to list the parts the store holds for an upload.
    fn send_list_parts_request(
        &self,
        req: ListPartsRequest,
    ) -> impl Future<Output = Result<CompletedParts>> + Send;
}

impl<D, T> SendRequest for T
where
    D: SendRequest,
    T: Deref<Target = D> + Send + Sync,
{
    async fn send_create_upload_request(&self, req: CreateRequest) -> Result<UploadData> {
        self.deref().send_create_upload_request(req).await
    }

    async fn send_new_part_upload_request(&self, req: UploadPartRequest) -> Result<CompletedPart> {
        self.deref().send_new_part_upload_request(req).await
    }

    async fn send_complete_upload_request(&self, req: CompleteRequest) -> Result<CompletedUpload> {
        self.deref().send_complete_upload_request(req).await
    }

    async fn send_abort_upload_request(&self, req: AbortRequest) -> Result<()> {
        self.deref().send_abort_upload_request(req).await
    }

    async fn send_list_parts_request(&self, req: ListPartsRequest) -> Result<CompletedParts> {
        self.deref().send_list_parts_request(req).await
    }
}

/// `UploadClient` holds a type that can implement the interface of
/// [`SendRequest`].
#[derive(Clone)]
pub struct UploadClient {
    pub(crate) inner: Arc<dyn BoxedSendRequest + Send + Sync>,
}

impl UploadClient {
    /// Create a new `UploadClient` from any [`SendRequest`].
    pub fn new<C>(client: C) -> Self
    where
        C: SendRequest + 'static,
    {
        let inner = SendRequestInner::new(client);
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl SendRequest for UploadClient {
    async fn send_create_upload_request(&self, req: CreateRequest) -> Result<UploadData> {
        self.inner.send_create(req).await
    }

    async fn send_new_part_upload_request(&self, req: UploadPartRequest) -> Result<CompletedPart> {
        self.inner.send_upload(req).await
    }

    async fn send_complete_upload_request(&self, req: CompleteRequest) -> Result<CompletedUpload> {
        self.inner.send_complete(req).await
    }

    async fn send_abort_upload_request(&self, req: AbortRequest) -> Result<()> {
        self.inner.send_abort(req).await
    }

    async fn send_list_parts_request(&self, req: ListPartsRequest) -> Result<CompletedParts> {
        self.inner.send_list_parts(req).await
    }
}

impl Debug for UploadClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadClient")
            .field("inner", &"SendRequest")
            .finish()
    }
}

/// ID assigned to a multipart upload by the object store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadId(Cow<'static, str>);

impl UploadId {
    /// Create a new `UploadId`.
    pub fn new<T: Into<Cow<'static, str>>>(id: T) -> Self {
        Self(id.into())
    }

    pub(crate) fn try_from_create_resp(value: CreateResponse) -> Result<Self, ErrorRepr> {
        value
            .upload_id
            .map(Self::from)
            .ok_or(ErrorRepr::Missing("CreateResponse", "upload_id"))
    }
}

impl Deref for UploadId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Display for UploadId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<&str> for UploadId {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl From<String> for UploadId {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

/// The ID of an upload in progress and the URI of the object it creates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadData {
    /// The ID the object store assigned to the upload.
    pub id: UploadId,
    /// The destination of the uploaded object.
    pub uri: ObjectUri,
}

impl UploadData {
    /// Create a new value from upload ID and object URI.
    pub fn new<T: Into<UploadId>>(id: T, uri: ObjectUri) -> Self {
        Self { id: id.into(), uri }
    }

    /// Returns an owned copy of the upload ID.
    pub fn get_id(&self) -> UploadId {
        self.id.clone()
    }

    /// Returns an owned copy of the object URI.
    pub fn get_uri(&self) -> ObjectUri {
        self.uri.clone()
    }
}
