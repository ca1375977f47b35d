//! Background icon downloads.
//!
//! One download per URL at a time. Completions arrive on an unbounded
//! channel that the deck loop selects on; a failed URL is not retried
//! until [`ICON_RETRY_SECS`] have passed.

use super::source::FetchRequest;
use crate::constants::ICON_RETRY_SECS;
use crate::error::AssetError;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Fetches remote bytes.
pub trait Downloader: Send + Sync + 'static {
    /// Downloads `url`.
    fn download(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, AssetError>> + Send;
}

/// Downloader that refuses every request; remote icons stay blank.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineDownloader;

impl Downloader for OfflineDownloader {
    async fn download(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        Err(AssetError::Fetch {
            url: url.to_string(),
            message: "remote icons are disabled".to_string(),
        })
    }
}

/// HTTP downloader with a per-request timeout.
#[cfg(feature = "remote-icons")]
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
}

#[cfg(feature = "remote-icons")]
impl HttpDownloader {
    /// Builds the HTTP client.
    pub fn new() -> anyhow::Result<Self> {
        use anyhow::Context;
        use crate::constants::{APP_BINARY_NAME, ICON_FETCH_TIMEOUT_SECS};

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(ICON_FETCH_TIMEOUT_SECS))
            .user_agent(format!("{APP_BINARY_NAME}/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[cfg(feature = "remote-icons")]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let fetch_error = |message: String| AssetError::Fetch {
            url: url.to_string(),
            message,
        };
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| fetch_error(err.to_string()))?;
        if !response.status().is_success() {
            return Err(fetch_error(format!("HTTP {}", response.status())));
        }
        let body = response
            .bytes()
            .await
            .map_err(|err| fetch_error(err.to_string()))?;
        Ok(body.to_vec())
    }
}

/// Result of one background download.
#[derive(Debug)]
pub struct FetchOutcome {
    /// What was fetched
    pub request: FetchRequest,
    /// Whether the file is now in the cache
    pub result: Result<(), AssetError>,
}

/// Single-flight download scheduler.
#[derive(Debug)]
pub struct IconFetcher<D> {
    downloader: Arc<D>,
    in_flight: HashSet<String>,
    failed: HashMap<String, Instant>,
    done_tx: mpsc::UnboundedSender<FetchOutcome>,
}

impl<D: Downloader> IconFetcher<D> {
    /// Creates a fetcher and the receiver its completions arrive on.
    pub fn new(downloader: D) -> (Self, mpsc::UnboundedReceiver<FetchOutcome>) {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let fetcher = Self {
            downloader: Arc::new(downloader),
            in_flight: HashSet::new(),
            failed: HashMap::new(),
            done_tx,
        };
        (fetcher, done_rx)
    }

    /// Starts downloading `request` unless the URL is already in flight or
    /// failed recently. Returns whether a download was started.
    ///
    /// Must be called from within a tokio runtime.
    pub fn request(&mut self, request: FetchRequest, now: Instant) -> bool {
        if self.in_flight.contains(&request.url) {
            return false;
        }
        if let Some(failed_at) = self.failed.get(&request.url) {
            if now.saturating_duration_since(*failed_at) < Duration::from_secs(ICON_RETRY_SECS) {
                return false;
            }
        }

        tracing::debug!("fetching {}", request.url);
        self.in_flight.insert(request.url.clone());
        let downloader = Arc::clone(&self.downloader);
        let done_tx = self.done_tx.clone();
        tokio::spawn(async move {
            let result = match downloader.download(&request.url).await {
                Ok(data) if data.is_empty() => Err(AssetError::Fetch {
                    url: request.url.clone(),
                    message: "empty response".to_string(),
                }),
                Ok(data) => store(&request.path, &data)
                    .await
                    .map_err(|err| AssetError::Fetch {
                        url: request.url.clone(),
                        message: format!("cannot write {}: {err}", request.path.display()),
                    }),
                Err(err) => Err(err),
            };
            // the loop may have shut down; nothing left to notify
            let _ = done_tx.send(FetchOutcome { request, result });
        });
        true
    }

    /// Records a finished download. Returns whether it succeeded.
    pub fn complete(&mut self, outcome: &FetchOutcome, now: Instant) -> bool {
        self.in_flight.remove(&outcome.request.url);
        match &outcome.result {
            Ok(()) => {
                tracing::debug!("cached {}", outcome.request.path.display());
                self.failed.remove(&outcome.request.url);
                true
            }
            Err(err) => {
                tracing::warn!("{}", err);
                self.failed.insert(outcome.request.url.clone(), now);
                false
            }
        }
    }

    /// Number of downloads running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

/// Writes `data` to `path` through a temporary file so readers never see
/// a partial icon.
async fn store(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let partial = path.with_extension("part");
    tokio::fs::write(&partial, data).await?;
    tokio::fs::rename(&partial, path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Debug, Default)]
    struct CountingDownloader {
        calls: Arc<AtomicUsize>,
    }

    impl Downloader for CountingDownloader {
        async fn download(&self, _url: &str) -> Result<Vec<u8>, AssetError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(b"<svg/>".to_vec())
        }
    }

    fn request(temp_dir: &TempDir) -> FetchRequest {
        FetchRequest {
            url: "https://example.com/fan.svg".into(),
            path: temp_dir.path().join("icons/mdi/fan.svg"),
        }
    }

    #[tokio::test]
    async fn test_single_flight_and_cache_write() {
        let temp_dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let (mut fetcher, mut done) = IconFetcher::new(CountingDownloader {
            calls: Arc::clone(&calls),
        });
        let now = Instant::now();

        assert!(fetcher.request(request(&temp_dir), now));
        assert!(!fetcher.request(request(&temp_dir), now));
        assert_eq!(fetcher.in_flight(), 1);

        let outcome = done.recv().await.unwrap();
        assert!(fetcher.complete(&outcome, now));
        assert_eq!(fetcher.in_flight(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            std::fs::read(temp_dir.path().join("icons/mdi/fan.svg")).unwrap(),
            b"<svg/>"
        );
    }

    #[tokio::test]
    async fn test_failure_backs_off() {
        let temp_dir = TempDir::new().unwrap();
        let (mut fetcher, mut done) = IconFetcher::new(OfflineDownloader);
        let now = Instant::now();

        assert!(fetcher.request(request(&temp_dir), now));
        let outcome = done.recv().await.unwrap();
        assert!(matches!(outcome.result, Err(AssetError::Fetch { .. })));
        assert!(!fetcher.complete(&outcome, now));

        assert!(!fetcher.request(request(&temp_dir), now + Duration::from_secs(1)));
        assert!(fetcher.request(
            request(&temp_dir),
            now + Duration::from_secs(ICON_RETRY_SECS)
        ));
    }
}
