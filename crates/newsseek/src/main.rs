use anyhow::Result;
use clap::{Parser, Subcommand};
use newsseek_common::logger::{self, LogMode};
use newsseek_common::{AppConfig, NewsSeekError};
use newsseek_embedding::load_provider;
use newsseek_ingest::{IngestOptions, IngestReport, IngestionPipeline};
use newsseek_vector::{QueryEngine, SearchHit, SearchSettings, StoreStats, VectorStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root
fn load_dotenv_from_project_root() {
    if let Some(root) = find_project_root() {
        let env_path = root.join(".env");
        if env_path.exists() {
            dotenv::from_path(&env_path).ok();
        }
    } else {
        dotenv::dotenv().ok();
    }
}

#[derive(Parser)]
#[command(name = "newsseek")]
#[command(about = "newsseek - semantic search over a news article corpus", long_about = None)]
struct Cli {
    /// Vector store directory (overrides STORE_PATH)
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Collection name (overrides COLLECTION_NAME)
    #[arg(long, global = true)]
    collection: Option<String>,

    /// Log at the configured level instead of warnings only
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed a news table (.json, .jsonl, .ndjson) into the collection
    Ingest {
        /// Input file
        input: PathBuf,

        /// Drop the existing collection first
        #[arg(long)]
        rebuild: bool,

        /// Disable progress bars
        #[arg(long)]
        no_progress: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search the collection
    Search {
        /// Free-text query
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show collection statistics
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env early so CLI overrides below win over it
    load_dotenv_from_project_root();

    if let Some(db) = &cli.db_path {
        std::env::set_var("STORE_PATH", db);
    }
    if let Some(collection) = &cli.collection {
        std::env::set_var("COLLECTION_NAME", collection);
    }

    match cli.command {
        Commands::Ingest {
            input,
            rebuild,
            no_progress,
            json,
        } => {
            let config = AppConfig::from_env()?;
            logger::init_logging(LogMode::Persistent(&config.log_dir), &config.log_level)?;

            tracing::info!("newsseek ingest starting...");
            tracing::info!("  Input: {}", input.display());
            tracing::info!("  Store: {}", config.collection_path().display());
            tracing::info!("  Provider: {} ({})", config.embedding_provider, config.embedding_model);

            let mut pipeline = IngestionPipeline::new(config).with_options(IngestOptions {
                rebuild,
                show_progress: !no_progress && !json,
            });
            let report = pipeline.run(&input).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Commands::Search { query, json } => {
            let config = AppConfig::from_env()?;
            let level = if cli.verbose { config.log_level.as_str() } else { "warn" };
            logger::init_logging(LogMode::Console, level)?;

            let query = query.join(" ");
            let engine = match open_engine(&config).await {
                Ok(engine) => engine,
                Err(e) => return Err(with_ingest_hint(e)),
            };
            if let Err(e) = engine.ensure_ready().await {
                return Err(with_ingest_hint(e));
            }

            let hits = engine.search(&query).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&hits_json(&hits))?);
            } else {
                print_hits(&query, &hits);
            }
        }
        Commands::Serve { host, port } => {
            if let Some(host) = &host {
                std::env::set_var("SERVER_HOST", host);
            }
            if let Some(port) = port {
                std::env::set_var("SERVER_PORT", port.to_string());
            }

            let config = AppConfig::from_env()?;
            logger::init_logging(LogMode::Persistent(&config.log_dir), &config.log_level)?;

            tracing::info!("newsseek server starting...");
            tracing::info!("Configuration loaded:");
            tracing::info!("  Host: {}", config.server_host);
            tracing::info!("  Port: {}", config.server_port);
            tracing::info!("  Collection: {}", config.collection_path().display());

            println!("Server listening on http://{}", config.server_bind_address());

            newsseek_server::start_server(config).await?;
        }
        Commands::Stats { json } => {
            let config = AppConfig::from_env()?;
            let level = if cli.verbose { config.log_level.as_str() } else { "warn" };
            logger::init_logging(LogMode::Console, level)?;

            let store = match VectorStore::open(&config.store_path, &config.collection_name).await {
                Ok(store) => store,
                Err(e) => return Err(with_ingest_hint(e)),
            };
            let stats = store.stats().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_stats(&stats);
            }
        }
    }

    Ok(())
}

/// Open the store first so a missing collection is reported without
/// contacting the embedding backend
async fn open_engine(config: &AppConfig) -> std::result::Result<QueryEngine, NewsSeekError> {
    let store = VectorStore::open(&config.store_path, &config.collection_name).await?;
    let provider = load_provider(config).await?;
    QueryEngine::new(provider, Arc::new(store), SearchSettings::from_config(config)).await
}

fn with_ingest_hint(err: NewsSeekError) -> anyhow::Error {
    if err.is_recoverable_by_ingest() {
        anyhow::anyhow!("{}\nhint: build the collection with `newsseek ingest <file>`", err)
    } else {
        err.into()
    }
}

fn print_report(report: &IngestReport) {
    println!("Ingestion complete");
    println!("  input:       {}", report.input.display());
    println!("  collection:  {} ({})", report.collection, report.store_dir.display());
    println!("  model:       {} (dim {})", report.embedding_model, report.dimension);
    println!(
        "  rows:        {} read, {} dropped",
        report.rows_read, report.rows_dropped
    );
    println!(
        "  written:     {} records in {} batches",
        report.records_written, report.batches_written
    );
    println!("  total:       {} documents", report.collection_count);
    println!("  elapsed:     {} ms", report.elapsed_ms);
}

fn print_hits(query: &str, hits: &[SearchHit]) {
    if hits.is_empty() {
        println!("No related news found for \"{}\"", query);
        return;
    }

    println!("Found {} related articles for \"{}\"", hits.len(), query);
    for (rank, hit) in hits.iter().enumerate() {
        let meta = &hit.document.metadata;
        println!();
        println!("[{}] {}", rank + 1, meta.subject);
        println!(
            "    date: {} | type: {} | similarity: {:.4} | distance: {:.4}",
            meta.news_date, meta.news_type, hit.similarity, hit.distance
        );
        for line in hit.document.text.lines() {
            println!("    {}", line);
        }
    }
}

fn hits_json(hits: &[SearchHit]) -> serde_json::Value {
    hits.iter()
        .map(|hit| {
            serde_json::json!({
                "id": hit.document.id,
                "subject": hit.document.metadata.subject,
                "news_date": hit.document.metadata.news_date,
                "news_type": hit.document.metadata.news_type,
                "text": hit.document.text,
                "similarity": hit.similarity,
                "distance": hit.distance,
            })
        })
        .collect()
}

fn print_stats(stats: &StoreStats) {
    println!("Collection:  {}", stats.collection);
    println!(
        "Model:       {}",
        stats.embedding_model.as_deref().unwrap_or("(unbound)")
    );
    match stats.dimension {
        Some(dim) => println!("Dimension:   {}", dim),
        None => println!("Dimension:   (unbound)"),
    }
    println!("Documents:   {}", stats.total_documents);
    println!("Batches:     {}", stats.batches);
    println!("Updated:     {}", stats.updated_at.to_rfc3339());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search_joins_words() {
        let cli = Cli::parse_from(["newsseek", "search", "fab", "expansion", "--json"]);
        match cli.command {
            Commands::Search { query, json } => {
                assert_eq!(query.join(" "), "fab expansion");
                assert!(json);
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_global_overrides() {
        let cli = Cli::parse_from([
            "newsseek",
            "ingest",
            "news.json",
            "--rebuild",
            "--db-path",
            "/tmp/store",
            "--collection",
            "other",
        ]);
        assert_eq!(cli.db_path, Some(PathBuf::from("/tmp/store")));
        assert_eq!(cli.collection.as_deref(), Some("other"));
        assert!(matches!(cli.command, Commands::Ingest { rebuild: true, .. }));
    }

    #[test]
    fn test_ingest_hint() {
        let hinted = with_ingest_hint(NewsSeekError::not_ready("empty"));
        assert!(hinted.to_string().contains("newsseek ingest"));

        let plain = with_ingest_hint(NewsSeekError::invalid_input("blank"));
        assert!(!plain.to_string().contains("hint"));
    }
}
