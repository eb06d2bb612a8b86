use super::part::{Checksums, CompletedPart, CompletedParts, EntityTag};
use super::request::*;
use super::{SendRequest, UploadData, UploadId};
use crate::error::{ErrorRepr, Result};

use aws_config::{BehaviorVersion, ConfigLoader, SdkConfig};
use aws_sdk_s3 as s3;

/// S3 [`Client`] type from the AWS SDK.
///
/// [`Client`]: aws_sdk_s3::Client
#[derive(Debug, Clone)]
pub struct SdkClient<B = DefaultRequestBuilder>(s3::Client, B);

impl SdkClient {
    /// Create a new `SdkClient` from an existing SDK `Client`.
    ///
    /// [`Client`]: aws_sdk_s3::Client
    pub fn new(client: s3::Client) -> Self {
        SdkClient(client, DefaultRequestBuilder)
    }

    /// Create a new `SdkClient` from an [`SdkConfig`].
    ///
    /// [`SdkConfig`]: aws_config::SdkConfig
    pub fn from_sdk_config(config: SdkConfig) -> Self {
        let client = s3::Client::new(&config);
        Self::new(client)
    }

    /// Load the configuration from a [`ConfigLoader`] and create the client.
    ///
    /// [`ConfigLoader`]: aws_config::ConfigLoader
    pub async fn from_config(loader: ConfigLoader) -> Self {
        let config = loader.load().await;
        Self::from_sdk_config(config)
    }

    /// Create a client from the default credential and region providers.
    pub async fn defaults() -> Self {
        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self::from_sdk_config(config)
    }

    /// Set a request builder for this S3 client.
    pub fn request_builder<B: RequestBuilder>(self, builder: B) -> SdkClient<B> {
        SdkClient(self.0, builder)
    }
}

impl<B: RequestBuilder> SendRequest for SdkClient<B> {
    async fn send_create_upload_request(&self, req: CreateRequest) -> Result<UploadData> {
        req.validate()?;
        let builder = req.with_builder(self.0.create_multipart_upload());
        let request = self.1.with_create_builder(builder);

        let uri = req.uri();
        let id = request
            .send()
            .await
            .map_err(ErrorRepr::from_create_err(uri))
            .and_then(UploadId::try_from_create_resp)?;

        Ok(UploadData::new(id, uri.clone()))
    }

    async fn send_new_part_upload_request(&self, req: UploadPartRequest) -> Result<CompletedPart> {
        req.validate()?;
        let part_size = req.body().len() as u64;
        let builder = req.with_builder(self.0.upload_part())?;
        let request = self.1.with_upload_part_builder(builder);

        let id = req.id();
        let uri = req.uri();
        let part = req.part_number();
        let resp = request
            .send()
            .await
            .map_err(ErrorRepr::from_upload_err(id, uri, part))?;
        let etag = EntityTag::try_from_upload_resp(&resp)?;
        let checksums = Checksums::from_upload_resp(&resp);

        Ok(CompletedPart::new(part, etag, part_size).with_checksums(checksums))
    }

    async fn send_complete_upload_request(&self, req: CompleteRequest) -> Result<CompletedUpload> {
        req.validate()?;
        let builder = req.with_builder(self.0.complete_multipart_upload())?;
        let request = self.1.with_complete_builder(builder);

        let id = req.id();
        let uri = req.uri();
        let parts = req.completed_parts();
        let etag = request
            .send()
            .await
            .map_err(ErrorRepr::from_complete_err(id, uri, parts))
            .and_then(|resp| EntityTag::try_from_complete_resp(&resp))?;

        Ok(CompletedUpload::new(uri.clone(), etag))
    }

    async fn send_abort_upload_request(&self, req: AbortRequest) -> Result<()> {
        req.validate()?;
        let builder = req.with_builder(self.0.abort_multipart_upload());
        let request = self.1.with_abort_builder(builder);

        request
            .send()
            .await
            .map_err(ErrorRepr::from_abort_err(req.id(), req.uri()))?;

        Ok(())
    }

    async fn send_list_parts_request(&self, req: ListPartsRequest) -> Result<CompletedParts> {
        req.validate()?;
        let mut parts = CompletedParts::default();
        let mut marker: Option<String> = None;

        loop {
            let builder = req
                .with_builder(self.0.list_parts())
                .set_part_number_marker(marker.take());
            let request = self.1.with_list_parts_builder(builder);

            let resp = request
                .send()
                .await
                .map_err(ErrorRepr::from_list_parts_err(req.id(), req.uri()))?;
            parts.extend(CompletedParts::from_list_resp(&resp)?);

            match resp.next_part_number_marker() {
                Some(next) if resp.is_truncated().unwrap_or(false) => {
                    marker = Some(next.to_string());
                }
                _ => break,
            }
        }

        parts.sort_ascending();
        trace!(id = %req.id(), parts = parts.count(), "listed parts");
        Ok(parts)
    }
}
