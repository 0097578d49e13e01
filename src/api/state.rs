use bytes::Bytes;
use std::sync::Arc;

use super::utils::load_index_page;
use crate::config::Config;
use crate::observability::Metrics;
use crate::retrieval::{AudioFetcher, FetchSettings, MediaRetriever};
use crate::storage::TempStorage;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub fetcher: AudioFetcher,
    /// Landing page, `None` when it could not be loaded at startup
    pub index_page: Option<Bytes>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: Config, retriever: Arc<dyn MediaRetriever>) -> Self {
        let metrics = Arc::new(Metrics::new());
        let storage = TempStorage::new(Some(config.download.temp_dir.clone()));
        let settings = FetchSettings {
            timeout: config.download.timeout(),
            max_concurrent: config.download.max_concurrent,
            retriever: config.retriever.clone(),
        };
        let fetcher = AudioFetcher::new(retriever, storage, settings, Arc::clone(&metrics));
        let index_page = load_index_page(&config.server.templates_dir);

        Self {
            config: Arc::new(config),
            fetcher,
            index_page,
            metrics,
        }
    }

    /// Read size for streamed response bodies
    pub fn chunk_size(&self) -> usize {
        self.config.download.chunk_size.as_usize()
    }
}
