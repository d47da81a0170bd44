use std::sync::Arc;

use anyhow::Context;
use bodega_server::core::{BackgroundTasks, Config, ServerState, TaskKind};
use bodega_server::db::OrderStore;
use bodega_server::documents::{AssetResolver, ReceiptRenderer};
use bodega_server::notify::{
    self, HttpApiChannel, MailChannel, NotificationDispatcher, NotificationWorker, SmtpChannel,
};
use bodega_server::orders::OrderLifecycleManager;
use bodega_server::services::CleanupScheduler;
use bodega_server::utils::logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Arc::new(Config::from_env());

    let log_dir = format!("{}/logs", config.work_dir);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {log_dir}"))?;
    logger::init_logger_with_file(std::env::var("LOG_LEVEL").ok().as_deref(), Some(&log_dir));

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "Bodega server starting"
    );

    let db_path = format!("{}/orders.redb", config.work_dir);
    let store = Arc::new(OrderStore::open(&db_path).context("failed to open order database")?);

    // Mail channels in priority order: SMTP first, HTTP API as fallback
    let mut channels: Vec<Arc<dyn MailChannel>> = Vec::new();
    if let Some(smtp) =
        SmtpChannel::from_config(&config.mail).context("invalid SMTP configuration")?
    {
        channels.push(Arc::new(smtp));
    }
    if let Some(api) = HttpApiChannel::from_config(&config.mail) {
        channels.push(Arc::new(api));
    }
    if channels.is_empty() {
        tracing::warn!("No mail channel configured, notifications cannot be delivered");
    }

    let (notify_tx, notify_rx) = notify::queue(config.notify_queue_capacity);
    let worker = NotificationWorker::new(
        notify_rx,
        NotificationDispatcher::new(channels),
        ReceiptRenderer::new(
            config.temp_dir.clone(),
            config.templates.clone(),
            AssetResolver::new(config.assets_dir.clone()),
        ),
        CleanupScheduler::new(config.cleanup_delay),
        store.clone(),
        config.store.clone(),
        config.job_deadline,
    );

    let mut tasks = BackgroundTasks::new();
    let shutdown_token = tasks.shutdown_token();
    tasks.spawn("notification_worker", TaskKind::Worker, async move {
        worker.run(shutdown_token).await;
    });

    let lifecycle = Arc::new(OrderLifecycleManager::new(
        store,
        notify_tx,
        config.delivery_lead_days,
        config.pickup_lead_days,
    ));
    let state = ServerState::new(config.clone(), lifecycle);

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, bodega_server::api::router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("HTTP server error")?;

    tasks.shutdown().await;
    tracing::info!("Bodega server stopped");
    Ok(())
}
