use std::sync::Arc;

use anyhow::Context;

use piestand_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    piestand_observability::init_from_env();

    let config = AppConfig::from_env().context("invalid configuration")?;

    // Catalog loading talks to the store synchronously.
    let startup_config = config.clone();
    let services = tokio::task::spawn_blocking(move || {
        piestand_api::app::services::build_services(&startup_config)
    })
    .await
    .context("startup task failed")?
    .context("failed to build services")?;

    let app = piestand_api::app::build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
