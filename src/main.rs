use anyhow::Context;
use webapp_session::{ConfigBuilder, SessionManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigBuilder::new()
        .from_env()
        .build()
        .context("Invalid configuration")?;

    webapp_session::init_tracing_with_config(&config);

    // A configured but unreachable session backend is fatal: never serve
    // requests with a half-initialized session layer.
    let sessions = SessionManager::from_config(&config.session)
        .await
        .context("Failed to initialize session backend")?;

    let addr = config.server.addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        %addr,
        backend = sessions.store().name(),
        healthy = sessions.store().is_healthy(),
        "Server listening"
    );
    axum::serve(listener, webapp_session::http::routes(sessions)).await?;

    Ok(())
}
