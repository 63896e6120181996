use actix_web::web;

use crate::handlers::admin::{database_handler, user_handler};
use crate::middleware::admin::AdminMiddleware;

pub fn init_admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(AdminMiddleware)
            // User approval
            .service(
                web::resource("/users")
                    .route(web::get().to(user_handler::get_users))
            )
            .service(
                web::resource("/users/{id}")
                    .route(web::patch().to(user_handler::update_user))
            )
            // Database and backups
            .service(
                web::resource("/database/status")
                    .route(web::get().to(database_handler::database_status))
            )
            .service(
                web::resource("/backups")
                    .route(web::get().to(database_handler::list_backups))
                    .route(web::post().to(database_handler::create_backup))
            )
    );
}
