use actix_web::web;

use crate::handlers::club::stats_handler;

/// Chart data for the dashboard graphs.
pub fn init_stats_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/player-stats")
            .route(web::get().to(stats_handler::player_stats))
    );
    cfg.service(
        web::resource("/match-stats")
            .route(web::get().to(stats_handler::match_stats))
    );
    cfg.service(
        web::resource("/player-matrix")
            .route(web::get().to(stats_handler::player_matrix))
    );
}
