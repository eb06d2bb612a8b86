use s3_resumable_upload::aws_config as config;
use s3_resumable_upload::error::Result;
use s3_resumable_upload::{ByteSize, ContentSource, ObjectUri, ResumeToken, SdkClient};
use s3_resumable_upload::{UploadBuilder, Uploader};

use bytes::Bytes;
use futures::stream;
use std::convert::Infallible;
use std::time::Duration;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::{fmt, prelude::*};

const BUCKET: &str = "test-bucket-use2";
const KEY: &str = "example/resumable/blob.bin";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse("s3_resumable_upload=debug")?;

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let app = ExampleApp::default();
    let uploader = app.uploader().await?;

    let Some(token) = app.start_then_pause(&uploader).await? else {
        println!("upload finished before it could be paused");
        return Ok(());
    };
    println!("paused upload, resume token: {}", token.to_json()?);

    let completed = app.resume(&uploader, &token).await?;
    let uri = completed.uri;
    let etag = completed.etag;
    println!("upload to {uri} finished, object etag: {etag}");

    Ok(())
}

struct ExampleApp {
    endpoint_url: String,
    object_mib: u64,
    part_mib: u64,
}

impl Default for ExampleApp {
    fn default() -> Self {
        Self {
            endpoint_url: "http://127.0.0.1:9090".into(),
            object_mib: 64,
            part_mib: 8,
        }
    }
}

impl ExampleApp {
    async fn uploader(&self) -> anyhow::Result<Uploader> {
        let client = self.sdk_client().await?;

        Ok(UploadBuilder::new(client)
            .max_active_tasks(4)
            .part_size(ByteSize::mib(self.part_mib))
            .build())
    }

    async fn sdk_client(&self) -> anyhow::Result<SdkClient> {
        let loader = config::from_env()
            .region("us-east-2")
            .app_name(config::AppName::new("example-app")?)
            .endpoint_url(&self.endpoint_url);
        Ok(SdkClient::from_config(loader).await)
    }

    fn uri(&self) -> ObjectUri {
        ObjectUri::from((BUCKET, KEY))
    }

    /// The same bytes every time, one MiB at a time.
    fn content(&self) -> ContentSource {
        let mib = ByteSize::mib(1).as_u64();
        let chunks = (0..self.object_mib).map(move |n| {
            let chunk = vec![(n % 251) as u8; mib as usize];
            Ok::<_, Infallible>(Bytes::from(chunk))
        });
        ContentSource::from_stream(self.object_mib * mib, stream::iter(chunks))
    }

    async fn start_then_pause(&self, uploader: &Uploader) -> Result<Option<ResumeToken>> {
        let upload = uploader.start_upload(self.uri(), self.content()).await?;
        let handle = upload.pause_handle();
        let task = tokio::spawn(upload);

        tokio::time::sleep(Duration::from_millis(500)).await;
        let token = handle.pause();
        println!(
            "pausing {} with {} parts done",
            handle.upload_id(),
            handle.num_parts_completed()
        );

        match task.await {
            Ok(Err(e)) if e.is_paused() => Ok(token),
            Ok(Err(e)) => Err(e),
            Ok(Ok(_)) => Ok(None),
            Err(e) => Err(s3_resumable_upload::error::Error::from_dyn(e)),
        }
    }

    async fn resume(
        &self,
        uploader: &Uploader,
        token: &ResumeToken,
    ) -> Result<s3_resumable_upload::request::CompletedUpload> {
        let token = ResumeToken::from_json(&token.to_json()?)?;
        uploader
            .resume_upload(self.uri(), &token, self.content())
            .await?
            .await
    }
}
