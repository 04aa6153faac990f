use dotenvy::dotenv;
use kiosco::{
    config::{database, settings},
    core::seed,
    errors::{Error, Result},
    web::{self, AppState},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    if dotenv().is_err() {
        info!("no .env file loaded");
    }

    // 3. Load settings (config.toml + HOST/PORT overrides)
    let settings = settings::load_app_settings()
        .inspect_err(|e| error!("Failed to load settings: {e}"))?;

    // 4. Connect and make sure every table exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {e}"))?;

    // 5. Seed an empty database. The admin password is read here, directly
    // before use, and never stored in settings.
    let admin_password = std::env::var("BOOTSTRAP_ADMIN_PASSWORD").ok();
    if settings.bootstrap_admin.is_some() && admin_password.is_none() {
        warn!("bootstrap_admin is configured but BOOTSTRAP_ADMIN_PASSWORD is not set");
    }
    seed::seed_bootstrap_admin(&db, &settings, admin_password).await?;
    seed::seed_products(&db, &settings).await?;

    // 6. Serve until Ctrl-C
    let addr = settings.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .inspect_err(|e| error!("Failed to bind {addr}: {e}"))?;
    info!(%addr, "kiosco listening");

    axum::serve(listener, web::create_app(AppState::new(db)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(Error::from)?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }
}
