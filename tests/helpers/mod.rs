pub mod client;
pub use self::client::TestClient;

use futures::stream;
use s3_resumable_upload::ContentSource;
use std::future::Future;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;
use tracing_subscriber::filter::LevelFilter;

pub static TRACER: LazyLock<()> = LazyLock::new(|| {
    let level = std::env::var("LOG_LEVEL")
        .map(|l| LevelFilter::from_str(l.as_str()).unwrap())
        .unwrap_or(LevelFilter::INFO);
    tracing_subscriber::fmt().with_max_level(level).init()
});

/// `n` bytes that differ from one position to the next.
pub fn test_bytes(n: usize) -> Vec<u8> {
    (0..n).map(|i| (i % 251) as u8).collect()
}

/// The same bytes as `test_bytes(n)`, produced `chunk` bytes at a time.
pub fn chunked_content(n: usize, chunk: usize) -> ContentSource {
    let chunks = test_bytes(n)
        .chunks(chunk)
        .map(|c| Ok::<_, std::io::Error>(c.to_vec()))
        .collect::<Vec<_>>();
    ContentSource::from_stream(n as u64, stream::iter(chunks))
}

/// Wait for `cond` to hold, giving up after a few seconds.
pub async fn wait_until<F: Fn() -> bool>(cond: F) {
    let check = async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(5), check)
        .await
        .expect("condition was not met in time");
}

/// Await a spawned task with a timeout, so a hung upload fails the test.
pub async fn join<T, F>(task: F) -> T
where
    F: Future<Output = Result<T, tokio::task::JoinError>>,
{
    tokio::time::timeout(Duration::from_secs(10), task)
        .await
        .expect("upload did not finish in time")
        .expect("upload task panicked")
}
