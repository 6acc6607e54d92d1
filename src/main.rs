use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use account_service::middleware::SessionAuthenticator;
use account_service::security::{RedisRevocationStore, RevocationStore, TokenCodec};
use account_service::services::AccountService;
use account_service::{db, routes, AppState, Config};

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if cfg!(debug_assertions) {
        dotenvy::dotenv().ok();
    }

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");

    tracing::info!("Starting account-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    // Create database connection pool
    let db_pool = db::create_pool(&config.database.url, config.database.max_connections)
        .await
        .expect("Failed to create database pool");

    tracing::info!(
        "Database pool created with {} max connections",
        config.database.max_connections
    );

    if !config.is_production() {
        tracing::info!("Running database migrations...");
        db::run_migrations(&db_pool)
            .await
            .expect("Failed to run database migrations");
    }

    // Create Redis connection manager for the revocation store
    let redis_client =
        redis::Client::open(config.redis.url.as_str()).expect("Failed to create Redis client");
    let redis_manager = redis_client
        .get_connection_manager()
        .await
        .expect("Failed to create Redis connection manager");

    tracing::info!("Redis connection established");

    // Wire the authentication core. The shared secret lives in AuthConfig
    // and is injected here once; nothing else sees it.
    let codec = Arc::new(TokenCodec::new(&config.auth));
    let revocations: Arc<dyn RevocationStore> = Arc::new(RedisRevocationStore::new(
        redis_manager,
        config.auth.session_ttl_secs,
    ));
    let authenticator = Arc::new(SessionAuthenticator::new(
        codec.clone(),
        revocations.clone(),
    ));

    let users = Arc::new(db::PgUserStore::new(db_pool.clone()));
    let state = AppState {
        db: db_pool,
        accounts: Arc::new(AccountService::new(users, codec, revocations)),
    };

    let bind_addr = (config.app.host.clone(), config.app.port);
    tracing::info!("Listening on {}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(|cfg| routes::configure(cfg, authenticator.clone()))
    })
    .bind(bind_addr)?
    .run()
    .await
}
