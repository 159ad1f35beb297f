use crate::app_config::AppConfig;
use crate::appender::RecordAppender;
use crate::handler::handle;
use lambda_http::{Error, Request, run, service_fn};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app_config;
mod appender;
mod cdn;
mod domain;
mod handler;
mod storage;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .without_time()
        .init();

    info!("🪵 Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    info!(
        bucket = config.storage().bucket(),
        key = config.storage().key(),
        cache_enabled = config.cache().enabled(),
        "✅  Loaded configuration"
    );

    let store = storage::new_store(&config)?;
    let mut appender = RecordAppender::new(Arc::new(store), config.storage().key());

    if let Some(invalidator) = cdn::new_invalidator(&config).await {
        appender = appender.with_invalidation(Arc::new(invalidator), config.cache().cache_control());
        info!("✅  Initialized cache invalidation");
    }

    let appender = Arc::new(appender);
    info!("🔥 {} is up and running", env!("CARGO_PKG_NAME"));

    run(service_fn(move |request: Request| {
        let appender = appender.clone();
        async move { Ok::<_, Error>(handle(&appender, request).await) }
    }))
    .await
}
