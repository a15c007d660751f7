use std::sync::Arc;

use postrider::{
    AppState, AuditLog, Config, Dispatcher, Server, Signal, SmtpRelayTransport, StatusRegistry,
    WorkerPool,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    postrider::logging::init();

    let config = Config::from_env();

    let audit_log = Arc::new(AuditLog::open(&config.audit_log_path).await?);
    tracing::info!(path = %audit_log.path().display(), "Audit log ready");

    let registry = StatusRegistry::new();
    let transport = Arc::new(SmtpRelayTransport::new(config.relay.clone()));
    let dispatcher = Dispatcher::new(transport, registry.clone(), audit_log, config.retry);
    let pool = WorkerPool::start(config.worker_count, config.queue_depth, dispatcher);

    let sender = config.sender.clone().map(Arc::new);
    if sender.is_none() {
        tracing::warn!("No sender credentials configured; send requests will be rejected");
    }

    let state = AppState {
        registry,
        pool,
        sender,
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received ctrl-c, shutting down");
            let _ = shutdown_tx.send(Signal::Shutdown);
        }
    });

    let server = Server::bind(&config.listen_address(), state).await?;
    server.serve(shutdown_rx).await?;

    Ok(())
}
