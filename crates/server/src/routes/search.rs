use actix_web::{get, web, HttpResponse};
use newsseek_common::NewsSeekError;
use std::sync::Arc;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{SearchQuery, SearchResponse, SearchResultItem};

#[get("/search")]
pub async fn search(
    query: web::Query<SearchQuery>,
    state: web::Data<Arc<AppState>>,
) -> Result<HttpResponse, ApiError> {
    let q = query.q.as_str();
    if q.trim().is_empty() {
        return Err(NewsSeekError::invalid_input("Query cannot be empty").into());
    }

    let engine = state.engine().await?;
    engine.ensure_ready().await?;

    let results: Vec<SearchResultItem> = engine
        .search(q)
        .await?
        .into_iter()
        .map(SearchResultItem::from)
        .collect();
    info!("GET /search {:?} -> {} results", q, results.len());

    Ok(HttpResponse::Ok().json(SearchResponse {
        query: q.to_string(),
        count: results.len(),
        results,
    }))
}

#[get("/search/stats")]
pub async fn search_stats(state: web::Data<Arc<AppState>>) -> Result<HttpResponse, ApiError> {
    let engine = state.engine().await?;
    Ok(HttpResponse::Ok().json(engine.stats().await))
}
