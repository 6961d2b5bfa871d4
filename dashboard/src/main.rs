use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::state::AppState;

mod charts;
mod dashboard_config;
mod routes;
mod state;
mod styles;
mod views;

#[tokio::main]
async fn main() -> Result<()> {
    shared::init_tracing!()?;
    let config = shared::load_service_config!()?;

    let presets = dashboard_config::load(&config.presets_path).with_context(|| {
        format!(
            "failed to load chart presets from {}",
            config.presets_path.display()
        )
    })?;
    info!(
        presets = presets.charts.len(),
        path = %config.presets_path.display(),
        "loaded chart presets"
    );

    let app = routes::router(Arc::new(AppState::new(presets)));

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.addr))?;
    info!(addr = %config.addr, "dashboard listening");
    axum::serve(listener, app).await?;
    Ok(())
}
