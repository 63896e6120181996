use actix_web::web;

use crate::handlers::session::{clock_handler, session_handler, substitution_handler};

pub fn init_match_session_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(session_handler::list_sessions))
            .route(web::post().to(session_handler::create_session))
    );
    cfg.service(
        web::resource("/{id}")
            .route(web::get().to(session_handler::get_session))
            .route(web::put().to(session_handler::update_session))
            .route(web::delete().to(session_handler::delete_session))
    );
    cfg.service(
        web::resource("/{id}/players")
            .route(web::put().to(session_handler::set_session_players))
    );
    cfg.service(
        web::resource("/{id}/import")
            .route(web::post().to(session_handler::import_session_players))
    );

    // Match clock
    cfg.service(web::resource("/{id}/start").route(web::post().to(clock_handler::start_session)));
    cfg.service(web::resource("/{id}/stop").route(web::post().to(clock_handler::stop_session)));
    cfg.service(web::resource("/{id}/reset-time").route(web::post().to(clock_handler::reset_match_time)));
    cfg.service(
        web::resource("/{id}/reset-substitution-timer")
            .route(web::post().to(clock_handler::reset_substitution_timer))
    );
    cfg.service(web::resource("/{id}/period").route(web::post().to(clock_handler::set_period)));

    // Substitutions and live views
    cfg.service(
        web::resource("/{id}/substitutions")
            .route(web::post().to(substitution_handler::create_substitution))
    );
    cfg.service(
        web::resource("/{id}/quick-sub")
            .route(web::post().to(substitution_handler::quick_substitution))
    );
    cfg.service(
        web::resource("/{id}/recommendations")
            .route(web::get().to(substitution_handler::recommendations))
    );
    cfg.service(
        web::resource("/{id}/playing-times")
            .route(web::get().to(substitution_handler::playing_times))
    );
    cfg.service(
        web::resource("/{id}/pitch")
            .route(web::get().to(substitution_handler::pitch_view))
    );
}
