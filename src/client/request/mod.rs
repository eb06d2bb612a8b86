//! Request objects for each operation of a multipart upload.
pub use crate::abort_upload::builders::AbortMultipartUploadFluentBuilder as AbortRequestBuilder;
pub use crate::complete_upload::builders::CompleteMultipartUploadFluentBuilder as CompleteRequestBuilder;
pub use crate::create_upload::builders::CreateMultipartUploadFluentBuilder as CreateRequestBuilder;
pub use crate::list_parts::builders::ListPartsFluentBuilder as ListPartsRequestBuilder;
pub use crate::part_upload::builders::UploadPartFluentBuilder as UploadPartRequestBuilder;

mod abort;
pub use abort::{AbortRequest, SendAbortUpload};

mod complete;
pub use complete::{CompleteRequest, CompletedUpload, SendCompleteUpload};

mod create;
pub use create::{CreateRequest, SendCreateUpload};

mod list_parts;
pub use list_parts::{ListPartsRequest, SendListParts};

mod upload_part;
pub use upload_part::{SendUploadPart, UploadPartRequest};

/// Add additional properties to the request objects being sent.
///
/// [`SdkClient`] applies this after the required properties are set, so it can
/// be used to request checksums, server-side encryption, and the like.
///
/// [`SdkClient`]: crate::SdkClient
pub trait RequestBuilder: Send + Sync {
    /// Set additional properties on [`CreateRequestBuilder`] beyond what
    /// [`CreateRequest`] provides.
    fn with_create_builder(&self, builder: CreateRequestBuilder) -> CreateRequestBuilder {
        builder
    }

    /// Set additional properties on [`UploadPartRequestBuilder`] beyond what
    /// [`UploadPartRequest`] provides.
    fn with_upload_part_builder(
        &self,
        builder: UploadPartRequestBuilder,
    ) -> UploadPartRequestBuilder {
        builder
    }

    /// Set additional properties on [`CompleteRequestBuilder`] beyond what
    /// [`CompleteRequest`] provides.
    fn with_complete_builder(&self, builder: CompleteRequestBuilder) -> CompleteRequestBuilder {
        builder
    }

    /// Set additional properties on [`AbortRequestBuilder`] beyond what
    /// [`AbortRequest`] provides.
    fn with_abort_builder(&self, builder: AbortRequestBuilder) -> AbortRequestBuilder {
        builder
    }

    /// Set additional properties on [`ListPartsRequestBuilder`] beyond what
    /// [`ListPartsRequest`] provides.
    fn with_list_parts_builder(&self, builder: ListPartsRequestBuilder) -> ListPartsRequestBuilder {
        builder
    }
}

/// Default implementation of [`RequestBuilder`] that doesn't modify the request
/// object at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRequestBuilder;
impl RequestBuilder for DefaultRequestBuilder {}
