use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use kindred_match::auth::JwtAuth;
use kindred_match::config::{Settings, StorageBackend};
use kindred_match::routes::{self, AppState};
use kindred_match::services::{MemoryStore, PostgresStore, Store};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(level: &str, format: &str) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kindred_match={0},actix_web={0}", level)));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match format {
        "pretty" => subscriber.pretty().init(),
        "json" => subscriber.json().init(),
        _ => subscriber.compact().init(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_logging(&settings.logging.level, &settings.logging.format);

    info!("Starting Kindred Match service...");

    // Keep a typed handle to Postgres so the pool can be closed on shutdown
    let mut postgres: Option<Arc<PostgresStore>> = None;

    let store: Arc<dyn Store> = match settings.storage.backend {
        StorageBackend::Postgres => {
            let pg = PostgresStore::from_settings(
                &settings.database.url,
                settings.database.max_connections,
                settings.database.min_connections,
                settings.database.acquire_timeout_secs,
                settings.database.idle_timeout_secs,
                settings.database.isolation_level,
            )
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string())
            })?;

            info!(
                "PostgreSQL store initialized (max: {} connections, isolation: {:?})",
                settings.database.max_connections.unwrap_or(10),
                pg.isolation()
            );

            let pg = Arc::new(pg);
            postgres = Some(pg.clone());
            pg
        }
        StorageBackend::Memory => {
            warn!("In-memory store initialized; meant for development and tests, data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    let mut app_state = AppState::new(
        store,
        settings.swipe.max_serialization_retries,
        settings.discovery.max_limit,
    );
    app_state.engine = app_state
        .engine
        .with_retry_backoff(Duration::from_millis(settings.swipe.retry_backoff_ms));
    let jwt = JwtAuth::new(&settings.auth.jwt_secret, settings.auth.token_ttl_secs);

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::Data::new(jwt.clone()))
            .app_data(web::JsonConfig::default().error_handler(routes::handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(routes::handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await?;

    if let Some(pg) = postgres {
        info!("Closing PostgreSQL pool");
        pg.close().await;
    }

    Ok(())
}
