use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use container_pool::config::Config;
use container_pool::observability::PoolMetrics;
use container_pool::server::{run_internal_server, InternalState, PoolHandle};
use container_pool::{logging, CommandFactory, ContainerFactory, Pool, VERSION};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        e
    })?;

    logging::init(&config.logging)?;

    info!("Starting container_pool {}...", VERSION);
    config.log_summary();

    let metrics = Arc::new(PoolMetrics::new()?);
    let pool = Arc::new(Pool::start_with_metrics(
        CommandFactory::new(config.factory.clone()),
        config.pool.settings(),
        Arc::clone(&metrics),
    )?);

    // Creation runs on pool threads; the runtime only serves the internal
    // endpoints and the error drain.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(async_main(&config, Arc::clone(&pool), metrics));
    drop(runtime);

    let cleanup_timeout = config.pool.cleanup_timeout.unwrap_or(Duration::ZERO);
    match pool.cleanup(cleanup_timeout) {
        Ok(destroyed) => info!(destroyed, "Shutdown complete"),
        Err(e) => warn!(error = %e, "Shutdown incomplete"),
    }
    drain_errors(&pool);

    result
}

async fn async_main(
    config: &Config,
    pool: Arc<Pool<CommandFactory>>,
    metrics: Arc<PoolMetrics>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if let Some(addr) = config.server.internal_addr {
        let handle: Arc<dyn PoolHandle> = Arc::clone(&pool) as Arc<dyn PoolHandle>;
        let state = Arc::new(InternalState::new(handle, config.info()).with_metrics(metrics));

        tokio::spawn(async move {
            if let Err(e) = run_internal_server(addr, state).await {
                error!(error = %e, "Internal server error");
            }
        });
    }

    let mut drain = tokio::time::interval(config.pool.error_drain_interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = drain.tick() => drain_errors(&pool),
            result = &mut shutdown => {
                if let Err(e) = result {
                    error!(error = %e, "Failed to listen for shutdown signal");
                }
                info!("Shutting down...");
                break;
            }
        }
    }

    Ok(())
}

/// Empty the pool's error queue, logging a summary.
///
/// Each error was already logged when it happened; this keeps the queue
/// bounded and reports the rate.
fn drain_errors<F: ContainerFactory>(pool: &Pool<F>) {
    let errors = pool.errors().drain();
    let Some(last) = errors.last() else {
        return;
    };

    warn!(
        count = errors.len(),
        recent = pool.recent_error_count(),
        throttled = pool.is_throttled(),
        last_kind = %last.kind,
        last_error = %last.message,
        "Worker errors since last drain"
    );
}
