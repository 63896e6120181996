use actix_web::web;

use crate::handlers::video::{clip_handler, media_handler, reel_handler};

pub fn init_clip_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(clip_handler::list_clips))
            .route(web::post().to(clip_handler::create_clip))
    );
    cfg.service(
        web::resource("/{id}")
            .route(web::get().to(clip_handler::get_clip))
            .route(web::put().to(clip_handler::update_clip))
            .route(web::delete().to(clip_handler::delete_clip))
    );
    cfg.service(
        web::resource("/{id}/upload-url")
            .route(web::post().to(media_handler::request_upload_url))
    );
    cfg.service(
        web::resource("/{id}/confirm-upload")
            .route(web::post().to(media_handler::confirm_upload))
    );
    cfg.service(
        web::resource("/{id}/download-url")
            .route(web::get().to(media_handler::download_url))
    );
}

pub fn init_reel_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(reel_handler::list_reels))
            .route(web::post().to(reel_handler::create_reel))
    );
    cfg.service(
        web::resource("/{id}")
            .route(web::get().to(reel_handler::get_reel))
            .route(web::put().to(reel_handler::update_reel))
            .route(web::delete().to(reel_handler::delete_reel))
    );
    cfg.service(
        web::resource("/{id}/clips")
            .route(web::put().to(reel_handler::set_reel_clips))
            .route(web::post().to(reel_handler::append_reel_clip))
    );
}
