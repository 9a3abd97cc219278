//! newsseek HTTP server
//!
//! Actix-web 기반 검색 API. Read-only over a collection built by the ingest
//! pipeline.

pub mod error;
pub mod routes;
pub mod state;
pub mod types;

pub use error::ApiError;
pub use state::AppState;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use newsseek_common::{AppConfig, Result};
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;

/// Run the HTTP server until shutdown
pub async fn start_server(config: AppConfig) -> Result<()> {
    let bind_addr = config.server_bind_address();
    let state = Arc::new(AppState::new(config));

    info!("Starting HTTP server on {}", bind_addr);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET"])
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure)
    })
    .bind(&bind_addr)?
    .run()
    .await?;

    info!("HTTP server stopped");
    Ok(())
}
