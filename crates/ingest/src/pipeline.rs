use indicatif::{ProgressBar, ProgressStyle};
use newsseek_common::{AppConfig, NewsSeekError, Result};
use newsseek_embedding::{load_provider, EmbeddingProvider};
use newsseek_vector::{DocumentRecord, VectorStore};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::reader::{read_news, NewsRow};

/// Ingestion pipeline states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IngestState {
    Idle,
    ModelLoading,
    DataReading,
    Embedding,
    Writing,
    Done,
    Failed,
}

/// Ingestion options
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Drop the existing collection before ingesting
    pub rebuild: bool,

    /// Draw progress bars on the terminal
    pub show_progress: bool,
}

/// Summary of a completed ingestion run
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub input: PathBuf,
    pub store_dir: PathBuf,
    pub collection: String,
    pub embedding_model: String,
    pub dimension: usize,
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub records_written: usize,
    pub batches_written: usize,
    pub collection_count: usize,
    pub elapsed_ms: u128,
}

/// Offline pipeline that embeds a news table into the vector store
///
/// Nothing is written unless reading and embedding both succeed. A failure
/// while writing after at least one committed batch is reported as
/// [`NewsSeekError::PartialWrite`].
pub struct IngestionPipeline {
    config: AppConfig,
    options: IngestOptions,
    provider: Option<Arc<dyn EmbeddingProvider>>,
    state: IngestState,
}

impl IngestionPipeline {
    /// Create a pipeline that loads the configured provider on first run
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            options: IngestOptions::default(),
            provider: None,
            state: IngestState::Idle,
        }
    }

    /// Use an already loaded provider
    pub fn with_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set ingestion options
    pub fn with_options(mut self, options: IngestOptions) -> Self {
        self.options = options;
        self
    }

    /// Current state
    pub fn state(&self) -> IngestState {
        self.state
    }

    fn transition(&mut self, next: IngestState) {
        info!("Ingestion: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Run the whole pipeline on `input`
    pub async fn run(&mut self, input: &Path) -> Result<IngestReport> {
        let started = Instant::now();

        match self.execute(input, started).await {
            Ok(report) => {
                self.transition(IngestState::Done);
                info!(
                    "Ingestion finished - {} records written, collection '{}' now holds {}",
                    report.records_written, report.collection, report.collection_count
                );
                Ok(report)
            }
            Err(e) => {
                error!("Ingestion failed during {:?}: {}", self.state, e);
                if let NewsSeekError::PartialWrite { .. } = &e {
                    warn!(
                        "Collection at {} holds a partial corpus; rerun with rebuild",
                        self.config.collection_path().display()
                    );
                }
                self.transition(IngestState::Failed);
                Err(e)
            }
        }
    }

    async fn execute(&mut self, input: &Path, started: Instant) -> Result<IngestReport> {
        self.transition(IngestState::ModelLoading);
        let provider = match &self.provider {
            Some(provider) => provider.clone(),
            None => {
                let provider = load_provider(&self.config).await?;
                self.provider = Some(provider.clone());
                provider
            }
        };
        let model = provider.model_name().to_string();
        let dimension = provider.dimension();

        // Nothing touches the disk before Writing. A missing collection is
        // created there; a rebuild drops the old one there.
        let existing = if self.options.rebuild
            || !VectorStore::exists(&self.config.store_path, &self.config.collection_name).await?
        {
            None
        } else {
            let store = self.open_store().await?;
            store.check_embedding(&model, dimension).await?;
            Some(store)
        };

        self.transition(IngestState::DataReading);
        let outcome = read_news(input).await?;

        self.transition(IngestState::Embedding);
        let texts: Vec<String> = outcome.rows.iter().map(NewsRow::merged_text).collect();
        let spinner = self.spinner(format!("Embedding {} articles", texts.len()));
        let embeddings = provider.embed(&texts, true).await;
        spinner.finish_and_clear();
        let embeddings = embeddings?;
        if embeddings.len() != texts.len() {
            return Err(NewsSeekError::provider(format!(
                "Provider returned {} embeddings for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }

        self.transition(IngestState::Writing);
        let store = match existing {
            Some(store) => store,
            None => {
                if self.options.rebuild {
                    VectorStore::destroy(&self.config.store_path, &self.config.collection_name)
                        .await?;
                }
                self.open_store().await?
            }
        };
        store.bind_embedding(&model, dimension).await?;

        let records = build_records(outcome.rows, embeddings);
        let total = records.len();
        let batch_size = self.config.write_batch_size.max(1);
        let bar = self.progress_bar(total as u64);

        let mut committed_batches = 0;
        let mut committed_records = 0;
        let mut iter = records.into_iter().peekable();
        while iter.peek().is_some() {
            let batch: Vec<DocumentRecord> = iter.by_ref().take(batch_size).collect();
            let batch_len = batch.len();

            if let Err(e) = store.add(batch).await {
                bar.abandon();
                if committed_batches == 0 {
                    return Err(e);
                }
                return Err(NewsSeekError::PartialWrite {
                    committed_batches,
                    committed_records,
                    total_records: total,
                    reason: e.to_string(),
                });
            }

            committed_batches += 1;
            committed_records += batch_len;
            bar.inc(batch_len as u64);
        }
        bar.finish_and_clear();

        Ok(IngestReport {
            input: input.to_path_buf(),
            store_dir: store.dir().to_path_buf(),
            collection: self.config.collection_name.clone(),
            embedding_model: model,
            dimension,
            rows_read: outcome.total_rows,
            rows_dropped: outcome.dropped_rows,
            records_written: committed_records,
            batches_written: committed_batches,
            collection_count: store.count().await,
            elapsed_ms: started.elapsed().as_millis(),
        })
    }

    async fn open_store(&self) -> Result<VectorStore> {
        Ok(
            VectorStore::create_or_open(&self.config.store_path, &self.config.collection_name)
                .await?
                .with_write_batch_size(self.config.write_batch_size),
        )
    }

    fn spinner(&self, message: String) -> ProgressBar {
        if !self.options.show_progress {
            return ProgressBar::hidden();
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_message(message);
        spinner.enable_steady_tick(std::time::Duration::from_millis(120));
        spinner
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.options.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len);
        bar.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} records ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        bar
    }
}

/// Pair rows with embeddings under ordinal ids `doc_0`, `doc_1`, ...
pub fn build_records(rows: Vec<NewsRow>, embeddings: Vec<Vec<f32>>) -> Vec<DocumentRecord> {
    rows.into_iter()
        .zip(embeddings)
        .enumerate()
        .map(|(ordinal, (row, embedding))| {
            DocumentRecord::new(
                format!("doc_{}", ordinal),
                row.merged_text(),
                embedding,
                row.metadata(),
            )
        })
        .collect()
}
