use anyhow::Context;
use storage::Database;

mod api;
mod config;
mod error;
mod features;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting taekwondo ranking API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!(
        verify_writes = config.settings.persister.verify_writes,
        tie_break_policy = ?config.settings.persister.tie_break_policy,
        "Configuration loaded successfully"
    );

    let db = match &config.database_url {
        Some(url) => {
            tracing::info!(
                "Connecting to database at: {}",
                url.split('@').next_back().unwrap_or("unknown")
            );
            let db = Database::new(url, config.settings.clone())
                .await
                .context("Failed to initialize database")?;
            tracing::info!("Database connection established");

            tracing::info!("Running database migrations");
            db.run_migrations()
                .await
                .context("Failed to run migrations")?;
            tracing::info!("Database migrations completed successfully");
            db
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store");
            Database::in_memory(config.settings.clone())
        }
    };

    let app = api::router(db);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
