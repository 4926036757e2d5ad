use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dynaform_api::config::{self, AppConfig};
use dynaform_api::database::DatabaseManager;
use dynaform_api::is_production;

#[derive(Parser)]
#[command(name = "dynaform-api")]
#[command(about = "Dynaform API server")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<ServerCommand>,
}

#[derive(Subcommand, Clone, Copy)]
enum ServerCommand {
    #[command(about = "Run the HTTP server (default)")]
    Serve,

    #[command(about = "Apply pending database migrations and exit")]
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let args = Args::parse();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting Dynaform API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect_lazy(&config.database).context("configuring database pool")?;

    match args.command.unwrap_or(ServerCommand::Serve) {
        ServerCommand::Migrate => {
            DatabaseManager::migrate(&pool).await.context("running migrations")?;
            Ok(())
        }
        ServerCommand::Serve => serve(pool, config).await,
    }
}

async fn serve(pool: sqlx::PgPool, config: &AppConfig) -> anyhow::Result<()> {
    if config.security.jwt_secret.is_empty() {
        tracing::warn!("JWT_SECRET is not set; login and token checks will fail");
    }
    if is_production!() && config.security.cors_origins.is_empty() {
        tracing::warn!("No CORS origins configured; browsers will be refused");
    }

    if config.database.auto_migrate {
        DatabaseManager::migrate(&pool).await.context("running migrations")?;
    }

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Dynaform API listening on http://{}", bind_addr);

    axum::serve(listener, dynaform_api::app(pool))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
