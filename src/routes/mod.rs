use actix_web::web;

pub mod registration;
pub mod backend_health;
pub mod auth;
pub mod admin;
pub mod club;
pub mod stats;
pub mod match_sessions;
pub mod lineups;
pub mod video;

use crate::handlers::auth_handler;
use crate::handlers::club::dashboard_handler;
use crate::middleware::auth::AuthMiddleware;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(registration::register)
        .service(backend_health::backend_health)
        .service(auth::login);

    cfg.service(
        web::resource("/me")
            .wrap(AuthMiddleware)
            .route(web::get().to(auth_handler::current_user))
    );
    cfg.service(
        web::resource("/dashboard")
            .wrap(AuthMiddleware)
            .route(web::get().to(dashboard_handler::dashboard))
    );

    // Club data
    cfg.service(web::scope("/teams").wrap(AuthMiddleware).configure(club::init_team_routes));
    cfg.service(web::scope("/players").wrap(AuthMiddleware).configure(club::init_player_routes));
    cfg.service(web::scope("/matches").wrap(AuthMiddleware).configure(club::init_match_routes));
    cfg.service(web::scope("/api").wrap(AuthMiddleware).configure(stats::init_stats_routes));

    // Match day
    cfg.service(
        web::scope("/match-sessions")
            .wrap(AuthMiddleware)
            .configure(match_sessions::init_match_session_routes)
    );
    cfg.service(web::scope("/lineups").wrap(AuthMiddleware).configure(lineups::init_lineup_routes));
    cfg.service(web::scope("/formations").wrap(AuthMiddleware).configure(lineups::init_formation_routes));
    cfg.service(
        web::scope("/lineup-positions")
            .wrap(AuthMiddleware)
            .configure(lineups::init_position_routes)
    );

    // Video
    cfg.service(web::scope("/video-clips").wrap(AuthMiddleware).configure(video::init_clip_routes));
    cfg.service(web::scope("/highlight-reels").wrap(AuthMiddleware).configure(video::init_reel_routes));

    admin::init_admin_routes(cfg);
}
