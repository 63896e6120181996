use actix_web::web;

use crate::handlers::club::{match_handler, player_handler, team_handler};

pub fn init_team_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(team_handler::list_teams))
            .route(web::post().to(team_handler::create_team))
    );
    cfg.service(
        web::resource("/{id}")
            .route(web::get().to(team_handler::get_team))
            .route(web::put().to(team_handler::update_team))
            .route(web::delete().to(team_handler::delete_team))
    );
}

pub fn init_player_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(player_handler::list_players))
            .route(web::post().to(player_handler::create_player))
    );
    cfg.service(
        web::resource("/{id}")
            .route(web::get().to(player_handler::get_player))
            .route(web::put().to(player_handler::update_player))
            .route(web::delete().to(player_handler::delete_player))
    );
}

pub fn init_match_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(match_handler::list_matches))
            .route(web::post().to(match_handler::create_match))
    );
    cfg.service(
        web::resource("/{id}")
            .route(web::get().to(match_handler::get_match))
            .route(web::put().to(match_handler::update_match))
            .route(web::delete().to(match_handler::delete_match))
    );
    cfg.service(
        web::resource("/{id}/score")
            .route(web::put().to(match_handler::update_score))
    );
    cfg.service(
        web::resource("/{id}/players")
            .route(web::put().to(match_handler::set_match_players))
    );
    cfg.service(
        web::resource("/{id}/appearances/{appearance_id}")
            .route(web::put().to(match_handler::update_appearance))
    );
}
