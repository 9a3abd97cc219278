pub mod search;
pub mod system;

use actix_web::web;

/// Register all routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(system::health)
        .service(search::search_stats)
        .service(search::search);
}
