use std::sync::Arc;

use anyhow::Context;
use mimalloc::MiMalloc;
use ssr_dashboard::config::AppConfig;
use ssr_dashboard::loader::Dataset;
use ssr_dashboard::{routes, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ssr_dashboard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = AppConfig::from_env();

    let data_config = config.data.clone();
    let data = tokio::task::spawn_blocking(move || Dataset::load(&data_config))
        .await
        .context("Data loading task failed")?;
    for report in &data.report {
        tracing::info!(
            source = %report.source,
            path = %report.path,
            rows = report.rows,
            parse_failures = report.parse_failures,
            placeholder = report.is_placeholder(),
            "Data source ready"
        );
    }

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState {
        data: Arc::new(data),
        config,
    };
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(addr = %addr, "Starting SSR dashboard server");
    axum::serve(listener, app).await?;

    Ok(())
}
