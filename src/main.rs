use std::net::TcpListener;
use std::time::Duration;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;

use smoras_backend::run;
use smoras_backend::config::settings::{get_config, get_jwt_settings};
use smoras_backend::telemetry::{get_subscriber, init_subscriber};
use smoras_backend::services::{MinIOService, SchedulerService};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = match get_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to read the config: {}", e);
            std::process::exit(1);
        }
    };

    let subscriber = get_subscriber(
        "smoras-backend".into(),
        config.application.log_level.clone(),
        std::io::stdout
    );
    init_subscriber(subscriber);

    let jwt_settings = get_jwt_settings(&config);
    // Only try to establish connection when actually used
    let connection_pool = match PgPoolOptions::new()
        .max_connections(32)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_lazy(config.database.connection_string().expose_secret())
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create Postgres connection pool: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = sqlx::migrate!("./migrations").run(&connection_pool).await {
        tracing::error!("Failed to run database migrations: {}", e);
        std::process::exit(1);
    }

    let minio_service = MinIOService::new(&config.minio);
    if let Err(e) = minio_service.ensure_bucket().await {
        // Video uploads stay unavailable until storage comes up; the rest of the API works
        tracing::warn!("Object storage is not reachable: {}", e);
    }

    let scheduler = match SchedulerService::new(connection_pool.clone(), config.backup.clone()).await {
        Ok(scheduler) => match scheduler.start().await {
            Ok(()) => {
                tracing::info!("Scheduler service started successfully");
                scheduler
            }
            Err(e) => {
                tracing::error!("Failed to start scheduler: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            tracing::error!("Failed to create scheduler service: {}", e);
            std::process::exit(1);
        }
    };

    let address = format!("{}:{}", config.application.host, config.application.port);
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Listening on {}", address);

    let result = run(
        listener,
        connection_pool,
        jwt_settings,
        config.backup,
        minio_service,
    )?.await;

    if let Err(e) = scheduler.stop().await {
        tracing::warn!("Scheduler did not shut down cleanly: {}", e);
    }
    result
}
