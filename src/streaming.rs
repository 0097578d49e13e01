//! Streams a downloaded asset as a response body and deletes it afterwards
//!
//! [`AssetStream`] yields chunks of at most `chunk_size` bytes read
//! sequentially from the file. Once the file is exhausted, a read fails, or the
//! consumer drops the stream (client disconnect), the file handle is closed and
//! the temp file is removed exactly once.

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures_util::Stream;
use tokio::fs::File;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info};

use crate::observability::Metrics;
use crate::storage::{TempAsset, TempFileGuard};

/// Default read size for response chunks
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

enum State<R> {
    Reading {
        reader: ReaderStream<R>,
        file: TempFileGuard,
    },
    Finalizing(Pin<Box<dyn Future<Output = ()> + Send>>),
    Done,
}

/// Lazy, single-pass byte stream over a [`TempAsset`]
pub struct AssetStream<R = File> {
    state: State<R>,
    path: PathBuf,
    bytes_sent: u64,
    metrics: Option<Arc<Metrics>>,
}

impl AssetStream<File> {
    /// Opens the asset for streaming. If the file cannot be opened the asset
    /// is released (and deleted) before the error is returned.
    pub async fn open(asset: TempAsset, chunk_size: usize) -> io::Result<Self> {
        let file = match File::open(asset.path()).await {
            Ok(file) => file,
            Err(e) => {
                error!(path = %asset.path().display(), error = %e, "Failed to open file for streaming");
                asset.into_guard().remove().await;
                return Err(e);
            }
        };

        Ok(Self::with_reader(file, asset.into_guard(), chunk_size))
    }
}

impl<R: AsyncRead + Unpin> AssetStream<R> {
    pub(crate) fn with_reader(reader: R, file: TempFileGuard, chunk_size: usize) -> Self {
        let path = file.path().to_path_buf();
        Self {
            state: State::Reading {
                reader: ReaderStream::with_capacity(reader, chunk_size.max(1)),
                file,
            },
            path,
            bytes_sent: 0,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Closes the reader and starts deleting the file.
    fn finish(&mut self) {
        let state = std::mem::replace(&mut self.state, State::Done);
        if let State::Reading { reader, file } = state {
            drop(reader);
            self.state = State::Finalizing(Box::pin(file.remove()));
        }
    }
}

impl<R: AsyncRead + Unpin> Stream for AssetStream<R> {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            match &mut this.state {
                State::Reading { reader, .. } => match ready!(Pin::new(reader).poll_next(cx)) {
                    Some(Ok(chunk)) => {
                        this.bytes_sent += chunk.len() as u64;
                        return Poll::Ready(Some(Ok(chunk)));
                    }
                    Some(Err(e)) => {
                        // Ends the body early; the client sees a truncated response.
                        error!(
                            path = %this.path.display(),
                            bytes_sent = this.bytes_sent,
                            error = %e,
                            "Error streaming file"
                        );
                        if let Some(metrics) = &this.metrics {
                            metrics.stream_aborted();
                        }
                        this.finish();
                    }
                    None => {
                        info!(path = %this.path.display(), bytes_sent = this.bytes_sent, "Finished streaming file");
                        if let Some(metrics) = &this.metrics {
                            metrics.stream_completed();
                        }
                        this.finish();
                    }
                },
                State::Finalizing(removal) => {
                    ready!(removal.as_mut().poll(cx));
                    this.state = State::Done;
                }
                State::Done => return Poll::Ready(None),
            }
        }
    }
}

impl<R> Drop for AssetStream<R> {
    fn drop(&mut self) {
        if matches!(self.state, State::Reading { .. }) {
            debug!(
                path = %self.path.display(),
                bytes_sent = self.bytes_sent,
                "Stream dropped before completion"
            );
            if let Some(metrics) = &self.metrics {
                metrics.stream_aborted();
            }
        }
        // Dropping the state releases the file guard, which removes the file.
    }
}
