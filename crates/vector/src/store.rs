use chrono::Utc;
use newsseek_common::{NewsSeekError, Result};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::similarity::euclidean_distance;
use crate::types::{
    BatchEntry, CandidateResult, CollectionManifest, DocumentRecord, StoreStats,
    MANIFEST_FORMAT_VERSION,
};

const MANIFEST_FILE: &str = "manifest.json";
const BATCH_DIR: &str = "batches";

/// Records per committed batch unless overridden
pub const DEFAULT_WRITE_BATCH_SIZE: usize = 1000;

/// Flat, persisted vector store holding one collection
///
/// Layout on disk:
///
/// ```text
/// <path>/<collection>/manifest.json
/// <path>/<collection>/batches/000000.json
/// ```
///
/// Every batch file is written atomically and then recorded in the manifest
/// together with its checksum, so a crash leaves the collection at the last
/// committed batch. Queries are exact brute-force scans over all records.
pub struct VectorStore {
    dir: PathBuf,
    write_batch_size: usize,
    state: RwLock<StoreState>,
}

struct StoreState {
    manifest: CollectionManifest,
    records: Vec<DocumentRecord>,
    ids: HashSet<String>,
}

impl VectorStore {
    /// Open the collection at `path`, initializing empty storage if absent
    pub async fn create_or_open(path: impl AsRef<Path>, collection: &str) -> Result<Self> {
        let root = path.as_ref();
        ensure_directory_or_absent(root).await?;

        let dir = root.join(collection);
        ensure_directory_or_absent(&dir).await?;
        if tokio::fs::try_exists(dir.join(MANIFEST_FILE)).await? {
            return Self::load(dir, collection).await;
        }

        if tokio::fs::try_exists(&dir).await? {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            if entries.next_entry().await?.is_some() {
                return Err(NewsSeekError::store_unavailable(format!(
                    "{} exists but is not a newsseek collection",
                    dir.display()
                )));
            }
        }

        tokio::fs::create_dir_all(dir.join(BATCH_DIR)).await?;
        let manifest = CollectionManifest::new(collection);
        write_manifest(&dir, &manifest).await?;

        info!("Initialized empty collection '{}' at {}", collection, dir.display());
        Ok(Self::from_parts(dir, manifest, Vec::new()))
    }

    /// Open an existing collection without creating anything
    pub async fn open(path: impl AsRef<Path>, collection: &str) -> Result<Self> {
        let dir = path.as_ref().join(collection);
        if !Self::exists(path.as_ref(), collection).await? {
            return Err(NewsSeekError::store_unavailable(format!(
                "collection '{}' not initialized at {}; run ingestion first",
                collection,
                path.as_ref().display()
            )));
        }
        Self::load(dir, collection).await
    }

    /// Whether an initialized collection lives at `path`
    ///
    /// Paths that exist but are not directories are `StoreUnavailable`.
    pub async fn exists(path: impl AsRef<Path>, collection: &str) -> Result<bool> {
        let root = path.as_ref();
        ensure_directory_or_absent(root).await?;
        let dir = root.join(collection);
        ensure_directory_or_absent(&dir).await?;
        Ok(tokio::fs::try_exists(dir.join(MANIFEST_FILE)).await?)
    }

    /// Remove a collection from disk
    ///
    /// Returns `false` when there was nothing to remove. Directories that do
    /// not look like a collection are left alone.
    pub async fn destroy(path: impl AsRef<Path>, collection: &str) -> Result<bool> {
        let dir = path.as_ref().join(collection);
        let initialized = Self::exists(path.as_ref(), collection).await?;
        if !tokio::fs::try_exists(&dir).await? {
            return Ok(false);
        }
        if !initialized {
            return Err(NewsSeekError::store_unavailable(format!(
                "refusing to remove {}: not a newsseek collection",
                dir.display()
            )));
        }

        tokio::fs::remove_dir_all(&dir).await?;
        warn!("Removed collection '{}' at {}", collection, dir.display());
        Ok(true)
    }

    /// Override the number of records per committed batch
    pub fn with_write_batch_size(mut self, size: usize) -> Self {
        self.write_batch_size = size.max(1);
        self
    }

    fn from_parts(dir: PathBuf, manifest: CollectionManifest, records: Vec<DocumentRecord>) -> Self {
        let ids = records.iter().map(|r| r.id.clone()).collect();
        Self {
            dir,
            write_batch_size: DEFAULT_WRITE_BATCH_SIZE,
            state: RwLock::new(StoreState {
                manifest,
                records,
                ids,
            }),
        }
    }

    async fn load(dir: PathBuf, collection: &str) -> Result<Self> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let raw = tokio::fs::read_to_string(&manifest_path)
            .await
            .map_err(|e| corrupt(&manifest_path, e))?;
        let manifest: CollectionManifest =
            serde_json::from_str(&raw).map_err(|e| corrupt(&manifest_path, e))?;

        if manifest.format_version != MANIFEST_FORMAT_VERSION {
            return Err(corrupt(
                &manifest_path,
                format!("unsupported format version {}", manifest.format_version),
            ));
        }
        if manifest.name != collection {
            return Err(corrupt(
                &manifest_path,
                format!("manifest belongs to collection '{}'", manifest.name),
            ));
        }

        let mut records = Vec::with_capacity(manifest.record_count);
        for batch in &manifest.batches {
            let batch_path = dir.join(BATCH_DIR).join(&batch.file);
            let bytes = tokio::fs::read(&batch_path)
                .await
                .map_err(|e| corrupt(&batch_path, e))?;

            if checksum(&bytes) != batch.sha256 {
                return Err(corrupt(&batch_path, "checksum mismatch"));
            }

            let batch_records: Vec<DocumentRecord> =
                serde_json::from_slice(&bytes).map_err(|e| corrupt(&batch_path, e))?;
            if batch_records.len() != batch.records {
                return Err(corrupt(
                    &batch_path,
                    format!("expected {} records, found {}", batch.records, batch_records.len()),
                ));
            }

            debug!("Loaded batch {} ({} records)", batch.file, batch.records);
            records.extend(batch_records);
        }

        if records.len() != manifest.record_count {
            return Err(corrupt(
                &manifest_path,
                format!(
                    "manifest lists {} records, batches hold {}",
                    manifest.record_count,
                    records.len()
                ),
            ));
        }

        if let Some(dim) = manifest.dimension {
            if let Some(bad) = records.iter().find(|r| r.embedding.len() != dim) {
                return Err(corrupt(
                    &manifest_path,
                    format!("record '{}' has dimension {}, expected {}", bad.id, bad.embedding.len(), dim),
                ));
            }
        }

        let mut seen = HashSet::with_capacity(records.len());
        if let Some(dup) = records.iter().find(|r| !seen.insert(r.id.as_str())) {
            return Err(corrupt(&manifest_path, format!("duplicate id '{}'", dup.id)));
        }

        info!(
            "Opened collection '{}' - {} records in {} batches",
            collection,
            records.len(),
            manifest.batches.len()
        );

        Ok(Self::from_parts(dir, manifest, records))
    }

    /// Collection directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Total record count
    pub async fn count(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// Collection statistics
    pub async fn stats(&self) -> StoreStats {
        let state = self.state.read().await;
        StoreStats {
            collection: state.manifest.name.clone(),
            embedding_model: state.manifest.embedding_model.clone(),
            dimension: state.manifest.dimension,
            total_documents: state.records.len(),
            batches: state.manifest.batches.len(),
            updated_at: state.manifest.updated_at,
        }
    }

    /// All records in insertion order
    pub async fn documents(&self) -> Vec<DocumentRecord> {
        self.state.read().await.records.clone()
    }

    /// Check that embeddings from `model` with `dimension` may be used with this collection
    ///
    /// An empty, unbound collection accepts anything.
    pub async fn check_embedding(&self, model: &str, dimension: usize) -> Result<()> {
        let state = self.state.read().await;
        check_signature(&state.manifest, model, dimension)
    }

    /// Record the embedding signature, or verify it if already recorded
    pub async fn bind_embedding(&self, model: &str, dimension: usize) -> Result<()> {
        let mut state = self.state.write().await;
        check_signature(&state.manifest, model, dimension)?;

        if state.manifest.embedding_model.as_deref() == Some(model)
            && state.manifest.dimension == Some(dimension)
        {
            return Ok(());
        }

        let mut manifest = state.manifest.clone();
        manifest.embedding_model = Some(model.to_string());
        manifest.dimension = Some(dimension);
        manifest.updated_at = Utc::now();
        write_manifest(&self.dir, &manifest).await?;
        state.manifest = manifest;

        info!("Collection bound to model '{}' (dimension {})", model, dimension);
        Ok(())
    }

    /// Append records
    ///
    /// Records are committed in batches of the configured write batch size.
    /// Each batch is atomic; if a later batch fails, earlier ones stay
    /// committed and the error is reported as a partial write.
    pub async fn add(&self, records: Vec<DocumentRecord>) -> Result<usize> {
        let total = records.len();
        if total == 0 {
            return Ok(0);
        }

        let mut state = self.state.write().await;
        let mut committed_batches = 0;
        let mut committed_records = 0;
        let mut iter = records.into_iter().peekable();

        while iter.peek().is_some() {
            let batch: Vec<DocumentRecord> = iter.by_ref().take(self.write_batch_size).collect();
            let batch_len = batch.len();

            if let Err(e) = self.commit_batch(&mut state, batch).await {
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
        }

        Ok(committed_batches)
    }

    async fn commit_batch(&self, state: &mut StoreState, batch: Vec<DocumentRecord>) -> Result<()> {
        let dimension = state
            .manifest
            .dimension
            .unwrap_or_else(|| batch.first().map(|r| r.embedding.len()).unwrap_or(0));
        if dimension == 0 {
            return Err(NewsSeekError::invalid_input("Embeddings cannot be empty"));
        }

        let mut batch_ids = HashSet::with_capacity(batch.len());
        for record in &batch {
            if record.id.is_empty() {
                return Err(NewsSeekError::invalid_input("Record id cannot be empty"));
            }
            if record.embedding.len() != dimension {
                return Err(NewsSeekError::invalid_input(format!(
                    "Record '{}' has dimension {}, collection uses {}",
                    record.id,
                    record.embedding.len(),
                    dimension
                )));
            }
            if record.embedding.iter().any(|x| !x.is_finite()) {
                return Err(NewsSeekError::invalid_input(format!(
                    "Record '{}' has non-finite embedding values",
                    record.id
                )));
            }
            if state.ids.contains(&record.id) || !batch_ids.insert(record.id.as_str()) {
                return Err(NewsSeekError::duplicate_id(record.id.clone()));
            }
        }

        let seq = state.manifest.batches.len();
        let file = format!("{:06}.json", seq);
        let batch_path = self.dir.join(BATCH_DIR).join(&file);
        let bytes = serde_json::to_vec(&batch)?;
        let entry = BatchEntry {
            file,
            records: batch.len(),
            sha256: checksum(&bytes),
        };

        write_atomic(&batch_path, &bytes).await?;

        let mut manifest = state.manifest.clone();
        manifest.record_count += batch.len();
        manifest.dimension = Some(dimension);
        manifest.batches.push(entry);
        manifest.updated_at = Utc::now();

        if let Err(e) = write_manifest(&self.dir, &manifest).await {
            // Unlisted batch files are ignored on open; remove it anyway
            let _ = tokio::fs::remove_file(&batch_path).await;
            return Err(e);
        }

        debug!("Committed batch {} ({} records)", seq, batch.len());

        state.manifest = manifest;
        state.ids.extend(batch.iter().map(|r| r.id.clone()));
        state.records.extend(batch);
        Ok(())
    }

    /// Nearest records to `embedding`, ascending by Euclidean distance
    ///
    /// Returns at most `min(k, count)` candidates; equal distances keep
    /// insertion order.
    pub async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<CandidateResult>> {
        let state = self.state.read().await;

        if let Some(dim) = state.manifest.dimension {
            if embedding.len() != dim {
                return Err(NewsSeekError::invalid_input(format!(
                    "Query embedding has dimension {}, collection uses {}",
                    embedding.len(),
                    dim
                )));
            }
        }

        if k == 0 || state.records.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = state
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| (i, euclidean_distance(&r.embedding, embedding)))
            .collect();

        // sort_by is stable, so ties stay in insertion order
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, distance)| CandidateResult {
                document: state.records[i].clone(),
                distance,
            })
            .collect())
    }
}

fn check_signature(manifest: &CollectionManifest, model: &str, dimension: usize) -> Result<()> {
    if let Some(stored) = &manifest.embedding_model {
        if stored != model {
            return Err(NewsSeekError::store_unavailable(format!(
                "collection '{}' was built with model '{}' but '{}' is configured; rebuild the store",
                manifest.name, stored, model
            )));
        }
    }
    if let Some(stored) = manifest.dimension {
        if stored != dimension {
            return Err(NewsSeekError::store_unavailable(format!(
                "collection '{}' stores {}-dimensional embeddings but the model produces {}; rebuild the store",
                manifest.name, stored, dimension
            )));
        }
    }
    Ok(())
}

async fn ensure_directory_or_absent(path: &Path) -> Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if !meta.is_dir() => Err(NewsSeekError::store_unavailable(format!(
            "{} exists but is not a directory",
            path.display()
        ))),
        _ => Ok(()),
    }
}

async fn write_manifest(dir: &Path, manifest: &CollectionManifest) -> Result<()> {
    let data = serde_json::to_vec_pretty(manifest)?;
    write_atomic(&dir.join(MANIFEST_FILE), &data).await
}

/// Write to a temporary file, sync, then rename over the destination
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&temp_path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(&temp_path, path).await?;
    Ok(())
}

fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn corrupt(path: &Path, reason: impl std::fmt::Display) -> NewsSeekError {
    NewsSeekError::store_unavailable(format!("{} is not a valid store file: {}", path.display(), reason))
}
