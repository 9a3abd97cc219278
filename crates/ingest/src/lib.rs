//! newsseek ingestion
//!
//! Reads a news table, embeds subject + content and writes the vectors into
//! the collection in fixed-size batches

mod pipeline;
mod reader;

pub use pipeline::{build_records, IngestOptions, IngestReport, IngestState, IngestionPipeline};
pub use reader::{
    extract_rows, parse_table, read_news, InputFormat, NewsRow, ReadOutcome, Table,
    REQUIRED_COLUMNS,
};
