use anyhow::{Context, Result};
use smartpay_api::{build_app, ApiConfig};
use smartpay_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("smartpay_api");

    let config = ApiConfig::from_env().context("invalid SMARTPAY_* configuration")?;
    let app = build_app(&config);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(
        bind = %config.bind,
        rate_limit_max = config.rate_limit_max,
        rate_limit_window_secs = config.rate_limit_window.as_secs(),
        "smartpay intent api started"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
