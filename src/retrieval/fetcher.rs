use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

use super::{
    DownloadOptions, ErrorClassification, MediaRetriever, RetrievalError, VideoMetadata, classify,
};
use crate::config::RetrieverConfig;
use crate::observability::Metrics;
use crate::sanitize::sanitize;
use crate::storage::{self, TempAsset, TempFileGuard, TempStorage};

/// Title used when the retriever reports none
const DEFAULT_TITLE: &str = "audio";

/// Classified failure of a fetch, with a client-safe detail message
#[derive(Debug, Clone, Error)]
#[error("{detail}")]
pub struct FetchError {
    pub kind: ErrorClassification,
    pub detail: String,
}

impl FetchError {
    pub fn new(kind: ErrorClassification, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    fn internal() -> Self {
        let kind = ErrorClassification::InternalError;
        Self::new(kind, kind.message())
    }

    fn from_retrieval(kind: ErrorClassification, err: &RetrievalError) -> Self {
        match kind {
            ErrorClassification::DownloadFailed => {
                Self::new(kind, format!("Failed to download audio. Error: {}", err.message()))
            }
            _ => Self::new(kind, kind.message()),
        }
    }
}

/// Fetcher limits and the base retriever options every request starts from
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Upper bound on extraction plus download
    pub timeout: Duration,
    /// Retrievals allowed to run at once
    pub max_concurrent: usize,
    pub retriever: RetrieverConfig,
}

/// Outcome of work handed to the blocking pool
enum Offloaded<T> {
    Finished(Result<T, RetrievalError>),
    TimedOut(JoinHandle<Result<T, RetrievalError>>),
}

/// Runs extraction and download for one URL off the request loop and returns
/// the validated file.
///
/// Each fetch runs in its own task: if the caller goes away mid-download the
/// task still finishes and its temp file is still removed.
#[derive(Clone)]
pub struct AudioFetcher {
    retriever: Arc<dyn MediaRetriever>,
    storage: TempStorage,
    settings: Arc<FetchSettings>,
    permits: Arc<Semaphore>,
    metrics: Arc<Metrics>,
}

impl AudioFetcher {
    pub fn new(
        retriever: Arc<dyn MediaRetriever>,
        storage: TempStorage,
        settings: FetchSettings,
        metrics: Arc<Metrics>,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(settings.max_concurrent.max(1)));
        Self {
            retriever,
            storage,
            settings: Arc::new(settings),
            permits,
            metrics,
        }
    }

    pub async fn fetch_audio(&self, url: &str, embed_thumbnail: bool) -> Result<TempAsset, FetchError> {
        let fetcher = self.clone();
        let url = url.to_owned();

        tokio::spawn(async move { fetcher.run(url, embed_thumbnail).await })
            .await
            .map_err(|e| {
                error!(error = %e, "Fetch task failed");
                FetchError::internal()
            })?
    }

    async fn run(self, url: String, embed_thumbnail: bool) -> Result<TempAsset, FetchError> {
        self.metrics.download_started();

        let result = self.retrieve(&url, embed_thumbnail).await;
        match &result {
            Ok(asset) => {
                self.metrics.download_succeeded();
                info!(
                    url,
                    path = %asset.path().display(),
                    size = asset.size_bytes(),
                    "Audio downloaded successfully"
                );
            }
            Err(e) => {
                self.metrics.download_failed();
                warn!(url, kind = ?e.kind, detail = %e.detail, "Audio download failed");
            }
        }

        result
    }

    async fn retrieve(&self, url: &str, embed_thumbnail: bool) -> Result<TempAsset, FetchError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| FetchError::internal())?;

        let deadline = Instant::now() + self.settings.timeout;
        let file = self.storage.reserve().await;
        let options = Arc::new(DownloadOptions::for_request(
            &self.settings.retriever,
            &storage::output_template(file.path()),
            embed_thumbnail,
            deadline.into_std(),
        ));

        info!(url, "Extracting info");
        let work = {
            let retriever = Arc::clone(&self.retriever);
            let url = url.to_owned();
            let options = Arc::clone(&options);
            move || retriever.extract_metadata(&url, &options)
        };
        let metadata: VideoMetadata = match offload(deadline, work).await {
            Offloaded::Finished(Ok(metadata)) => metadata,
            Offloaded::Finished(Err(e)) => return Err(self.fail(file, url, e).await),
            Offloaded::TimedOut(handle) => return Err(self.abandon(file, handle, permit)),
        };

        let title = metadata.title.as_deref().unwrap_or(DEFAULT_TITLE);
        let display_name = sanitize(&format!("{title}.{}", storage::AUDIO_EXTENSION));
        info!(url, filename = %display_name, "Determined filename");

        info!(url, path = %file.path().display(), embed_thumbnail, "Downloading audio");
        let work = {
            let retriever = Arc::clone(&self.retriever);
            let url = url.to_owned();
            let options = Arc::clone(&options);
            move || retriever.download(&url, &options)
        };
        match offload(deadline, work).await {
            Offloaded::Finished(Ok(())) => {}
            Offloaded::Finished(Err(e)) => return Err(self.fail(file, url, e).await),
            Offloaded::TimedOut(handle) => return Err(self.abandon(file, handle, permit)),
        }

        file.validate(display_name).await.map_err(|e| {
            error!(url, error = %e, "Download produced no usable file");
            FetchError::new(
                ErrorClassification::DownloadFailed,
                "Downloaded file is empty or missing after download attempt.",
            )
        })
    }

    async fn fail(&self, file: TempFileGuard, url: &str, err: RetrievalError) -> FetchError {
        error!(url, error = %err, "Retriever error");
        file.remove().await;

        let ffmpeg_available = self.settings.retriever.ffmpeg_available();
        let kind = classify(&err, ffmpeg_available);
        FetchError::from_retrieval(kind, &err)
    }

    /// Gives up on a retrieval that overran its deadline. The worker cannot be
    /// interrupted, so cleanup waits for it in the background and the permit is
    /// held until the worker is done.
    fn abandon<T: Send + 'static>(
        &self,
        file: TempFileGuard,
        work: JoinHandle<T>,
        permit: OwnedSemaphorePermit,
    ) -> FetchError {
        warn!(
            path = %file.path().display(),
            timeout_secs = self.settings.timeout.as_secs(),
            "Retrieval timed out"
        );
        tokio::spawn(async move {
            let _ = work.await;
            file.remove().await;
            drop(permit);
        });

        FetchError::new(
            ErrorClassification::DownloadFailed,
            format!(
                "Download timed out after {} seconds.",
                self.settings.timeout.as_secs()
            ),
        )
    }
}

async fn offload<T, F>(deadline: Instant, work: F) -> Offloaded<T>
where
    F: FnOnce() -> Result<T, RetrievalError> + Send + 'static,
    T: Send + 'static,
{
    let mut handle = tokio::task::spawn_blocking(work);
    match tokio::time::timeout_at(deadline, &mut handle).await {
        Ok(Ok(result)) => Offloaded::Finished(result),
        Ok(Err(e)) => Offloaded::Finished(Err(RetrievalError::Unexpected(format!(
            "retrieval worker failed: {e}"
        )))),
        Err(_) => Offloaded::TimedOut(handle),
    }
}
