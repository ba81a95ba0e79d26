use studygroup::{app, config::Config, db, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("studygroup=info,tower_http=info")),
        )
        .init();

    let db_pool = db::connect(&config.database_url, config.db_max_connections).await?;
    let app = app(
        AppState { db_pool },
        time::Duration::minutes(config.session_idle_minutes),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
