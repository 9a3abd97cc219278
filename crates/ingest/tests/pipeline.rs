//! End-to-end ingestion and retrieval with the offline hashing provider

use newsseek_common::{AppConfig, NewsSeekError};
use newsseek_embedding::{EmbeddingProvider, HashEmbedder};
use newsseek_ingest::{IngestOptions, IngestState, IngestionPipeline};
use newsseek_vector::{QueryEngine, SearchSettings, VectorStore};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn test_config(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.store_path = dir.join("vector_storage");
    config.log_dir = dir.join("log");
    config.embedding_provider = "hash".to_string();
    config.hash_dimension = 384;
    config
}

fn provider() -> Arc<dyn EmbeddingProvider> {
    Arc::new(HashEmbedder::new(384).unwrap())
}

fn write_input(dir: &Path, name: &str, rows: serde_json::Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, rows.to_string()).unwrap();
    path
}

fn two_rows() -> serde_json::Value {
    json!([
        {"SUBJECT": "A", "CONTENT": "Fab expansion", "NEWS_DATE": "2024-01-01", "NEWS_TYPE": "press"},
        {"SUBJECT": "B", "CONTENT": "Unrelated sports result", "NEWS_DATE": "2024-01-02", "NEWS_TYPE": "sports"}
    ])
}

async fn engine_for(config: &AppConfig) -> QueryEngine {
    let store = VectorStore::open(&config.store_path, &config.collection_name)
        .await
        .unwrap();
    QueryEngine::new(provider(), Arc::new(store), SearchSettings::from_config(config))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_relevant_article_ranks_first() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    let input = write_input(tmp.path(), "news.json", two_rows());

    let mut pipeline = IngestionPipeline::new(config.clone()).with_provider(provider());
    let report = pipeline.run(&input).await.unwrap();
    assert_eq!(pipeline.state(), IngestState::Done);
    assert_eq!(report.records_written, 2);
    assert_eq!(report.collection_count, 2);

    let engine = engine_for(&config).await;
    let hits = engine.search("fab expansion progress").await.unwrap();

    assert!(!hits.is_empty());
    let top = &hits[0];
    assert_eq!(top.document.metadata.subject, "A");
    assert_eq!(top.document.metadata.news_date, "2024-01-01");
    assert_eq!(top.document.metadata.news_type, "press");
    assert!(top.similarity > engine.settings().min_similarity());

    if let Some(pos) = hits.iter().position(|h| h.document.metadata.subject == "B") {
        assert!(pos > 0);
    }
}

#[tokio::test]
async fn test_round_trip_exact_text() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    let input = write_input(tmp.path(), "news.json", two_rows());

    IngestionPipeline::new(config.clone())
        .with_provider(provider())
        .run(&input)
        .await
        .unwrap();

    let engine = engine_for(&config).await;
    let hits = engine.search("B\n\nUnrelated sports result").await.unwrap();

    assert_eq!(hits[0].document.id, "doc_1");
    assert!(hits[0].distance.abs() < 1e-4);
    assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[tokio::test]
async fn test_row_without_content_is_kept() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    let input = write_input(
        tmp.path(),
        "news.json",
        json!([
            {"SUBJECT": "Subject only", "CONTENT": null, "NEWS_DATE": "2024-01-01", "NEWS_TYPE": "press"},
            {"SUBJECT": null, "CONTENT": null, "NEWS_DATE": "2024-01-02", "NEWS_TYPE": "press"}
        ]),
    );

    let report = IngestionPipeline::new(config.clone())
        .with_provider(provider())
        .run(&input)
        .await
        .unwrap();

    assert_eq!(report.rows_read, 2);
    assert_eq!(report.rows_dropped, 1);
    assert_eq!(report.records_written, 1);

    let store = VectorStore::open(&config.store_path, &config.collection_name)
        .await
        .unwrap();
    let docs = store.documents().await;
    assert_eq!(docs[0].text, "Subject only\n\n");
}

#[tokio::test]
async fn test_missing_column_fails_before_writing() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    let input = write_input(
        tmp.path(),
        "news.jsonl",
        json!({"SUBJECT": "A", "CONTENT": "x", "NEWS_DATE": "2024-01-01"}),
    );

    let mut pipeline = IngestionPipeline::new(config.clone()).with_provider(provider());
    let result = pipeline.run(&input).await;

    match result {
        Err(NewsSeekError::Schema { missing }) => assert_eq!(missing, vec!["NEWS_TYPE"]),
        other => panic!("expected schema error, got {:?}", other.map(|r| r.records_written)),
    }
    assert_eq!(pipeline.state(), IngestState::Failed);

    assert!(!config.collection_path().join("manifest.json").exists());
    let opened = VectorStore::open(&config.store_path, &config.collection_name).await;
    assert!(matches!(opened, Err(NewsSeekError::StoreUnavailable(_))));
}

#[tokio::test]
async fn test_failed_read_leaves_existing_collection_untouched() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    let input = write_input(tmp.path(), "news.json", two_rows());

    IngestionPipeline::new(config.clone())
        .with_provider(provider())
        .run(&input)
        .await
        .unwrap();

    let broken = write_input(tmp.path(), "broken.json", json!({"SUBJECT": "not an array"}));
    let result = IngestionPipeline::new(config.clone())
        .with_provider(provider())
        .with_options(IngestOptions {
            rebuild: true,
            show_progress: false,
        })
        .run(&broken)
        .await;
    assert!(matches!(result, Err(NewsSeekError::InvalidInput(_))));

    let store = VectorStore::open(&config.store_path, &config.collection_name)
        .await
        .unwrap();
    assert_eq!(store.count().await, 2);
}

#[tokio::test]
async fn test_reingest_requires_rebuild() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    let input = write_input(tmp.path(), "news.json", two_rows());

    IngestionPipeline::new(config.clone())
        .with_provider(provider())
        .run(&input)
        .await
        .unwrap();

    let again = IngestionPipeline::new(config.clone())
        .with_provider(provider())
        .run(&input)
        .await;
    assert!(matches!(again, Err(NewsSeekError::DuplicateId(id)) if id == "doc_0"));

    let rebuilt = IngestionPipeline::new(config.clone())
        .with_provider(provider())
        .with_options(IngestOptions {
            rebuild: true,
            show_progress: false,
        })
        .run(&input)
        .await
        .unwrap();
    assert_eq!(rebuilt.collection_count, 2);
}

#[tokio::test]
async fn test_small_write_batches() {
    let tmp = TempDir::new().unwrap();
    let mut config = test_config(tmp.path());
    config.write_batch_size = 2;

    let rows: Vec<serde_json::Value> = (0..5)
        .map(|i| {
            json!({
                "SUBJECT": format!("Headline {}", i),
                "CONTENT": format!("Body {}", i),
                "NEWS_DATE": "2024-03-01",
                "NEWS_TYPE": "press"
            })
        })
        .collect();
    let input = write_input(tmp.path(), "news.json", serde_json::Value::Array(rows));

    let report = IngestionPipeline::new(config.clone())
        .with_provider(provider())
        .run(&input)
        .await
        .unwrap();

    assert_eq!(report.batches_written, 3);
    assert_eq!(report.records_written, 5);

    let store = VectorStore::open(&config.store_path, &config.collection_name)
        .await
        .unwrap();
    assert_eq!(store.stats().await.batches, 3);
}

#[tokio::test]
async fn test_model_mismatch_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    let input = write_input(tmp.path(), "news.json", two_rows());

    IngestionPipeline::new(config.clone())
        .with_provider(provider())
        .run(&input)
        .await
        .unwrap();

    let other: Arc<dyn EmbeddingProvider> = Arc::new(HashEmbedder::new(128).unwrap());
    let result = IngestionPipeline::new(config.clone())
        .with_provider(other.clone())
        .run(&input)
        .await;
    assert!(matches!(result, Err(NewsSeekError::StoreUnavailable(_))));

    let store = Arc::new(
        VectorStore::open(&config.store_path, &config.collection_name)
            .await
            .unwrap(),
    );
    let engine = QueryEngine::new(other, store, SearchSettings::default()).await;
    assert!(matches!(engine, Err(NewsSeekError::StoreUnavailable(_))));
}

#[tokio::test]
async fn test_missing_input_file() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());

    let result = IngestionPipeline::new(config)
        .with_provider(provider())
        .run(&tmp.path().join("absent.json"))
        .await;
    assert!(matches!(result, Err(NewsSeekError::InvalidInput(_))));
}
