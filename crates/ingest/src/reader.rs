use newsseek_common::{NewsSeekError, Result};
use newsseek_vector::NewsMetadata;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info};

/// Columns every input file must provide (case-sensitive)
pub const REQUIRED_COLUMNS: [&str; 4] = ["SUBJECT", "CONTENT", "NEWS_DATE", "NEWS_TYPE"];

/// Supported tabular input encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// A JSON array of row objects
    Json,
    /// One JSON row object per line
    JsonLines,
}

impl InputFormat {
    /// Pick the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Ok(Self::Json),
            Some("jsonl") | Some("ndjson") => Ok(Self::JsonLines),
            _ => Err(NewsSeekError::invalid_input(format!(
                "Unsupported input file {} (expected .json, .jsonl or .ndjson)",
                path.display()
            ))),
        }
    }
}

/// Row-oriented table with the union of all keys as its columns
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Column names in first-seen order
    pub columns: Vec<String>,

    pub rows: Vec<Map<String, Value>>,
}

impl Table {
    fn push_row(&mut self, row: Map<String, Value>) {
        for key in row.keys() {
            if !self.columns.iter().any(|c| c == key) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push(row);
    }

    /// Required columns absent from the table, in canonical order
    pub fn missing_columns(&self) -> Vec<String> {
        REQUIRED_COLUMNS
            .iter()
            .filter(|req| !self.columns.iter().any(|c| c == *req))
            .map(|req| req.to_string())
            .collect()
    }
}

/// One news article after cleaning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsRow {
    pub subject: String,
    pub content: String,
    pub news_date: String,
    pub news_type: String,
}

impl NewsRow {
    /// Text that gets embedded: subject, blank line, content
    pub fn merged_text(&self) -> String {
        format!("{}\n\n{}", self.subject, self.content)
    }

    /// Metadata stored alongside the embedding
    pub fn metadata(&self) -> NewsMetadata {
        NewsMetadata {
            subject: self.subject.clone(),
            news_date: self.news_date.clone(),
            news_type: self.news_type.clone(),
        }
    }
}

/// Result of reading and cleaning an input table
#[derive(Debug, Clone)]
pub struct ReadOutcome {
    /// Retained rows in input order
    pub rows: Vec<NewsRow>,

    /// Rows in the input
    pub total_rows: usize,

    /// Rows dropped for having neither subject nor content
    pub dropped_rows: usize,
}

/// Parse raw file contents into a table
pub fn parse_table(raw: &str, format: InputFormat) -> Result<Table> {
    let mut table = Table::default();

    match format {
        InputFormat::Json => {
            let value: Value = serde_json::from_str(raw)
                .map_err(|e| NewsSeekError::invalid_input(format!("Malformed JSON input: {}", e)))?;
            let Value::Array(items) = value else {
                return Err(NewsSeekError::invalid_input(
                    "JSON input must be an array of row objects",
                ));
            };
            for (idx, item) in items.into_iter().enumerate() {
                table.push_row(into_row(item, idx + 1)?);
            }
        }
        InputFormat::JsonLines => {
            for (idx, line) in raw.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let value: Value = serde_json::from_str(line).map_err(|e| {
                    NewsSeekError::invalid_input(format!("Malformed JSON on line {}: {}", idx + 1, e))
                })?;
                table.push_row(into_row(value, idx + 1)?);
            }
        }
    }

    debug!("Parsed table - {} rows, columns: {:?}", table.rows.len(), table.columns);
    Ok(table)
}

fn into_row(value: Value, position: usize) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(NewsSeekError::invalid_input(format!(
            "Row {} is not an object: {}",
            position, other
        ))),
    }
}

/// Validate required columns, drop empty rows and fill missing cells
///
/// A row is dropped only when both SUBJECT and CONTENT are missing; any
/// other missing cell becomes an empty string.
pub fn extract_rows(table: &Table) -> Result<ReadOutcome> {
    let missing = table.missing_columns();
    if !missing.is_empty() {
        return Err(NewsSeekError::schema(missing));
    }

    let total_rows = table.rows.len();
    let rows: Vec<NewsRow> = table
        .rows
        .iter()
        .filter_map(|row| {
            let subject = cell(row, "SUBJECT");
            let content = cell(row, "CONTENT");
            if subject.is_none() && content.is_none() {
                return None;
            }
            Some(NewsRow {
                subject: subject.unwrap_or_default(),
                content: content.unwrap_or_default(),
                news_date: cell(row, "NEWS_DATE").unwrap_or_default(),
                news_type: cell(row, "NEWS_TYPE").unwrap_or_default(),
            })
        })
        .collect();

    Ok(ReadOutcome {
        dropped_rows: total_rows - rows.len(),
        total_rows,
        rows,
    })
}

/// Cell value as text; null, absent and empty cells are missing
fn cell(row: &Map<String, Value>, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Read and clean a news file
pub async fn read_news(path: &Path) -> Result<ReadOutcome> {
    info!("Reading news data from {}", path.display());

    let format = InputFormat::from_path(path)?;
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            NewsSeekError::invalid_input(format!("Input file not found: {}", path.display()))
        } else {
            NewsSeekError::Io(e)
        }
    })?;

    let table = parse_table(&raw, format)?;
    let outcome = extract_rows(&table)?;

    info!(
        "Read {} valid rows ({} dropped of {})",
        outcome.rows.len(),
        outcome.dropped_rows,
        outcome.total_rows
    );
    Ok(outcome)
}
