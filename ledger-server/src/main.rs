use ledger_server::{api, config::ServerConfig, db};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledger_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ledger server...");

    let config = ServerConfig::from_env()?;

    tracing::info!(
        "Resolving database credentials for environment '{}'",
        config.environment
    );

    // Credentials are resolved exactly once; failure is fatal
    let connect_options = config.resolve_connect_options()?;

    let pool = db::create_pool(&config, connect_options).await?;

    tracing::info!("Database connection pool created");

    db::run_migrations(&pool).await?;

    let app = api::create_router(pool);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
