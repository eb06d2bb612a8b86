#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

//! # Description
//!
//! Concurrent S3 multipart uploads that can be paused and resumed, built on
//! the official [SDK] for Rust.
//!
//! Content of a known length is cut into parts that are uploaded as soon as
//! they are read, with several in flight at once.  When the last part is done
//! the upload is completed.  If a part fails, the upload is aborted and the
//! error is returned.  At any point the upload can be paused, which gives back
//! a [`ResumeToken`] to continue it later without uploading the finished parts
//! again.
//!
//! # Examples
//!
//! ```rust
//! use s3_resumable_upload::{ByteSize, MemoryClient, ObjectUri, UploadBuilder};
//! use s3_resumable_upload::upload::ContentSource;
//!
//! # fn main() -> s3_resumable_upload::error::Result<()> {
//! # futures::executor::block_on(async {
//! // `SdkClient::defaults().await` for the real thing.
//! let client = MemoryClient::new();
//! let uploader = UploadBuilder::new(client.clone())
//!     .part_size(ByteSize::b(4))
//!     .build();
//!
//! let uri = ObjectUri::from(("a-bucket-us-east-1", "greeting.txt"));
//! let content = ContentSource::from_bytes(&b"hello, world"[..]);
//!
//! let upload = uploader.start_upload(uri.clone(), content).await?;
//! let done = upload.await?;
//! println!("created {} with entity tag {}", done.uri, done.etag);
//!
//! assert_eq!(client.object(&uri).unwrap(), &b"hello, world"[..]);
//! # Ok(())
//! # })
//! # }
//! ```
//!
//! Pausing and resuming:
//!
//! ```rust
//! use s3_resumable_upload::{ByteSize, MemoryClient, ObjectUri, ResumeToken, UploadBuilder};
//! use s3_resumable_upload::upload::ContentSource;
//!
//! # fn main() -> s3_resumable_upload::error::Result<()> {
//! # futures::executor::block_on(async {
//! let client = MemoryClient::new();
//! let uploader = UploadBuilder::new(client.clone()).part_size(ByteSize::b(4)).build();
//! let uri = ObjectUri::from(("a-bucket-us-east-1", "greeting.txt"));
//!
//! let upload = uploader
//!     .start_upload(uri.clone(), ContentSource::from_bytes(&b"hello, world"[..]))
//!     .await?;
//! let token = upload.pause_handle().pause().expect("upload is not finished");
//! assert!(upload.await.unwrap_err().is_paused());
//!
//! // The token can be stored anywhere as JSON.
//! let token = ResumeToken::from_json(&token.to_json()?)?;
//! let content = ContentSource::from_bytes(&b"hello, world"[..]);
//! let done = uploader.resume_upload(uri.clone(), &token, content).await?.await?;
//!
//! assert_eq!(done.uri, uri);
//! assert_eq!(client.object(&uri).unwrap(), &b"hello, world"[..]);
//! # Ok(())
//! # })
//! # }
//! ```
//!
//! [SDK]: https://awslabs.github.io/aws-sdk-rust/
use self::client::part::CompletedParts;
use self::client::request::{CreateRequest, ListPartsRequest, SendCreateUpload, SendListParts};
use self::error::{ErrorRepr, Result};
use self::upload::{PartPlan, UploadSession};

use aws_sdk::operation::abort_multipart_upload as abort_upload;
use aws_sdk::operation::complete_multipart_upload as complete_upload;
use aws_sdk::operation::create_multipart_upload as create_upload;
use aws_sdk::operation::list_parts;
use aws_sdk::operation::upload_part as part_upload;

#[doc(hidden)]
pub extern crate aws_config;
#[doc(hidden)]
pub extern crate aws_sdk_s3 as aws_sdk;

pub use bytesize::ByteSize;

#[macro_use]
mod trace;

mod client;
pub use client::{MemoryClient, SdkClient, SendRequest, UploadClient};

pub mod error;

pub mod request {
    //! Request interface of the multipart upload API.
    //!
    //! This module contains the trait [`RequestBuilder`] for customizing the
    //! request object sent for a multipart upload operation, futures that
    //! represent sending the request, and types appearing in request or response
    //! objects.
    pub use super::client::part::*;
    pub use super::client::request::*;
    pub use super::client::{UploadData, UploadId};
}

pub mod upload;
#[doc(inline)]
pub use upload::{ContentSource, PauseHandle, ResumeToken, SessionState, Upload};

pub mod uri;
#[doc(inline)]
pub use uri::ObjectUri;

// https://docs.aws.amazon.com/AmazonS3/latest/userguide/qfacts.html
/// The largest part S3 accepts.
pub const AWS_MAX_PART_SIZE: ByteSize = ByteSize::gib(5);
/// The most parts an S3 upload can have.
pub const AWS_MAX_PART_COUNT: u32 = 10_000;
/// The part size used when none is configured.
pub const DEFAULT_PART_SIZE: ByteSize = ByteSize::mib(8);

/// Configures and builds an [`Uploader`].
#[derive(Debug)]
#[non_exhaustive]
pub struct UploadBuilder {
    client: UploadClient,
    part_size: ByteSize,
    max_tasks: Option<usize>,
}

impl UploadBuilder {
    /// Create a `UploadBuilder` from a [`SendRequest`] client.
    pub fn new<C>(client: C) -> Self
    where
        C: SendRequest + 'static,
    {
        Self {
            client: UploadClient::new(client),
            part_size: DEFAULT_PART_SIZE,
            max_tasks: None,
        }
    }

    /// Set the size of a part.
    ///
    /// Every part but the last of an upload has exactly this size.  S3 rejects
    /// parts other than the last that are smaller than 5 MiB when the upload is
    /// completed.
    pub fn part_size(self, size: ByteSize) -> Self {
        Self {
            // Clamp to 1 <= part_size <= AWS_MAX.
            part_size: size.max(ByteSize::b(1)).min(AWS_MAX_PART_SIZE),
            ..self
        }
    }

    /// Set the maximum number of part uploads in flight at one time.
    ///
    /// By default there is no limit: a part is sent as soon as the content
    /// source produces it.
    pub fn max_active_tasks(self, limit: usize) -> Self {
        Self {
            max_tasks: Some(limit),
            ..self
        }
    }

    /// Build the [`Uploader`].
    pub fn build(self) -> Uploader {
        Uploader {
            client: self.client,
            part_size: self.part_size,
            max_tasks: self.max_tasks,
        }
    }
}

/// Starts and resumes uploads.
///
/// Every upload it starts uses the same client, part size, and concurrency
/// limit.
#[derive(Debug, Clone)]
pub struct Uploader {
    client: UploadClient,
    part_size: ByteSize,
    max_tasks: Option<usize>,
}

impl Uploader {
    /// Create a new multipart upload for `uri` and return the [`Upload`] that
    /// sends `content` to it.
    pub async fn start_upload<T: Into<ObjectUri>>(
        &self,
        uri: T,
        content: ContentSource,
    ) -> Result<Upload> {
        let plan = PartPlan::new(content.len(), self.part_size.as_u64());
        check_part_count(&plan)?;

        let req = CreateRequest::new(uri.into());
        let data = SendCreateUpload::new(&self.client, req).await?;
        debug!(
            id = %data.id,
            uri = %data.uri,
            bytes = plan.content_length(),
            parts = plan.part_count(),
            "created upload",
        );

        Ok(self.new_upload(data, plan, content, CompletedParts::default()))
    }

    /// Return the [`Upload`] that sends `content` to an upload that was
    /// already created.
    ///
    /// Parts in `existing` are not uploaded again; the parts `content` has in
    /// those positions are read and dropped.
    pub fn upload_with(
        &self,
        data: request::UploadData,
        content: ContentSource,
        existing: CompletedParts,
    ) -> Upload {
        let plan = PartPlan::new(content.len(), self.part_size.as_u64());
        self.new_upload(data, plan, content, existing)
    }

    /// Resume a paused upload to `uri`.
    ///
    /// `content` has to be the same content the upload was started with.  The
    /// parts the store already has are looked up and skipped, and the rest are
    /// uploaded as usual.  The part size recorded in the token is used rather
    /// than the one this `Uploader` was built with.
    pub async fn resume_upload<T: Into<ObjectUri>>(
        &self,
        uri: T,
        token: &ResumeToken,
        content: ContentSource,
    ) -> Result<Upload> {
        let plan = PartPlan::new(content.len(), token.part_size());
        if plan.part_count() != token.total_part_count() {
            return Err(ErrorRepr::TokenMismatch {
                id: token.upload_id().clone(),
                expected: token.total_part_count(),
                actual: plan.part_count(),
            })?;
        }
        check_part_count(&plan)?;

        let data = request::UploadData::new(token.upload_id().clone(), uri.into());
        let existing = if token.num_parts_completed() > 0 {
            let req = ListPartsRequest::new(&data);
            SendListParts::new(&self.client, req).await?
        } else {
            CompletedParts::default()
        };
        debug!(
            id = %data.id,
            uri = %data.uri,
            existing = existing.count(),
            recorded = token.num_parts_completed(),
            "resuming upload",
        );

        Ok(self.new_upload(data, plan, content, existing))
    }

    fn new_upload(
        &self,
        data: request::UploadData,
        plan: PartPlan,
        content: ContentSource,
        existing: CompletedParts,
    ) -> Upload {
        let existing = existing
            .into_iter()
            .filter(|part| plan.contains(part.part_number))
            .collect();
        let session = UploadSession::new(self.client.clone(), data, plan, existing);
        let source = content.into_parts(plan);
        Upload::new(session, source, self.max_tasks)
    }
}

fn check_part_count(plan: &PartPlan) -> Result<()> {
    if plan.part_count() > AWS_MAX_PART_COUNT {
        return Err(ErrorRepr::PartCount {
            count: plan.part_count(),
            part_size: plan.part_size(),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_size_is_clamped() {
        let builder = UploadBuilder::new(MemoryClient::new());
        assert_eq!(builder.part_size, DEFAULT_PART_SIZE);

        let builder = builder.part_size(ByteSize::b(0));
        assert_eq!(builder.part_size, ByteSize::b(1));

        let builder = builder.part_size(ByteSize::tib(1));
        assert_eq!(builder.part_size, AWS_MAX_PART_SIZE);
    }

    #[test]
    fn too_many_parts_is_rejected() {
        let uploader = UploadBuilder::new(MemoryClient::new())
            .part_size(ByteSize::b(1))
            .build();
        let content = ContentSource::from_bytes(vec![0u8; 10_001]);
        let res = futures::executor::block_on(uploader.start_upload(("b", "k"), content));
        assert_eq!(
            res.unwrap_err().kind(),
            error::ErrorKind::Config
        );
    }
}
