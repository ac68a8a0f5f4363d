use crate::api::services::AppStartTime;
use crate::config::get_config;
use crate::services::{AdkClient, ArticleService, SummaryModel, SummaryService, VertexClient};
use crate::storage::{SeaOrmStorage, StorageFactory};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub article_service: Arc<ArticleService>,
    pub summary_service: Arc<SummaryService>,
    pub adk_client: Arc<AdkClient>,
    pub app_start_time: AppStartTime,
}

/// Install the process-wide rustls provider (idempotent)
pub fn install_crypto_provider() {
    // 已安装时返回 Err，可以忽略
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Storage plus the summary service, shared by the server and the CLI
pub async fn prepare_summary_service() -> Result<(Arc<SeaOrmStorage>, Arc<SummaryService>)> {
    install_crypto_provider();

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!(
        "Using storage backend: {}",
        storage.get_backend_config().storage_type
    );

    let config = get_config();
    let model: Arc<dyn SummaryModel> = Arc::new(VertexClient::new(&config.vertex));
    let summary_service = Arc::new(SummaryService::new(
        storage.clone(),
        model,
        &config.vertex,
    ));

    Ok((storage, summary_service))
}

/// 准备服务器启动的上下文
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    let (storage, summary_service) = prepare_summary_service().await?;

    let config = get_config();
    let adk_client = Arc::new(AdkClient::new(&config.adk));
    info!("ADK api_server: {}", adk_client.base_url());

    let article_service = Arc::new(ArticleService::new(storage.clone()));

    for warning in config.validate() {
        warn!("Configuration: {}", warning);
    }

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        storage,
        article_service,
        summary_service,
        adk_client,
        app_start_time,
    })
}
