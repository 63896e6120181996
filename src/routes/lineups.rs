use actix_web::web;

use crate::handlers::lineup::{formation_handler, lineup_handler, position_handler};

pub fn init_lineup_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(lineup_handler::list_lineups))
            .route(web::post().to(lineup_handler::create_lineup))
    );
    cfg.service(
        web::resource("/{id}")
            .route(web::get().to(lineup_handler::get_lineup))
            .route(web::put().to(lineup_handler::update_lineup))
            .route(web::delete().to(lineup_handler::delete_lineup))
    );
    cfg.service(
        web::resource("/{id}/positions")
            .route(web::post().to(lineup_handler::save_positions))
    );
    cfg.service(
        web::resource("/{id}/players/{player_id}")
            .route(web::delete().to(lineup_handler::remove_player))
    );
    cfg.service(
        web::resource("/{id}/duplicate")
            .route(web::post().to(lineup_handler::duplicate_lineup))
    );
}

pub fn init_formation_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(formation_handler::list_formations))
            .route(web::post().to(formation_handler::create_formation))
    );
    cfg.service(
        web::resource("/{id}")
            .route(web::get().to(formation_handler::get_formation))
            .route(web::put().to(formation_handler::update_formation))
            .route(web::delete().to(formation_handler::delete_formation))
    );
}

pub fn init_position_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(position_handler::list_positions))
            .route(web::post().to(position_handler::create_position))
    );
    // Registered before /{id} so "defaults" is not taken for an id
    cfg.service(
        web::resource("/defaults")
            .route(web::post().to(position_handler::create_default_positions))
    );
    cfg.service(
        web::resource("/{id}")
            .route(web::put().to(position_handler::update_position))
            .route(web::delete().to(position_handler::delete_position))
    );
}
