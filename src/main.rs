use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::{info, warn};

use classconnect::logging::{init_tracing, shutdown_tracer};
use classconnect::metrics::{init_metrics, metrics_app};
use classconnect::router::init_router;
use classconnect::state::AppState;
use classconnect_config::{
    AppConfig, CorsConfig, DatabaseConfig, EmailConfig, JwtConfig, RateLimitConfig,
    StorageBackend,
};
use classconnect_core::PasswordHasher;
use classconnect_db::{MemoryStore, PgStore, Store, init_db_pool, migrate};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let app_config = AppConfig::from_env().context("invalid application config")?;
    init_tracing(&app_config.log_dir);

    let jwt_config = JwtConfig::from_env(app_config.environment).context("invalid JWT config")?;
    if jwt_config.uses_dev_secret() {
        warn!("JWT_SECRET not set, using the development secret");
    }

    let store = init_store().await?;
    let state = AppState::new(
        store,
        jwt_config,
        PasswordHasher::new(app_config.bcrypt_cost),
    )
    .with_email_config(EmailConfig::from_env())
    .with_cors_config(CorsConfig::from_env())
    .with_rate_limit_config(RateLimitConfig::from_env());

    let mut app = init_router(state);
    if let Some(handle) = init_metrics() {
        app = app.merge(metrics_app(handle));
    }

    let addr = app_config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, environment = ?app_config.environment, "Server listening");
    info!("Swagger UI available at http://{addr}/swagger-ui");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    shutdown_tracer().await;
    Ok(())
}

async fn init_store() -> anyhow::Result<Arc<dyn Store>> {
    let db_config = DatabaseConfig::from_env().context("invalid database config")?;

    match db_config.backend {
        StorageBackend::Memory => {
            warn!("Using the in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let pool = init_db_pool(&db_config)
                .await
                .context("failed to connect to Postgres")?;
            if db_config.run_migrations {
                migrate(&pool).await.context("failed to run migrations")?;
                info!("Migrations applied");
            }
            Ok(Arc::new(PgStore::new(pool)))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
