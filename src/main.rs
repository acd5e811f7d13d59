//! FlashKV Sessions - demo daemon
//!
//! Runs a session store over an in-memory table with a synthetic workload so
//! the sweep can be watched in the logs. Set `RUST_LOG=debug` to see every
//! page the sweep walks.

use flashkv_sessions::session::{
    Session, SessionBackend, SessionStore, StoreConfig, TracingObserver,
};
use flashkv_sessions::table::MemoryTable;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Demo workload settings
struct Workload {
    /// Time between simulated requests
    tick: Duration,
    /// Distinct session ids cycled through
    sessions: u64,
}

impl Default for Workload {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(20),
            sessions: 500,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set up logging
    let _subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    info!("FlashKV Sessions v{}", flashkv_sessions::VERSION);

    let table = Arc::new(MemoryTable::new("sessions").with_page_limit(100));
    let config = StoreConfig::new("sessions")
        .with_ttl(Duration::from_secs(3))
        .with_cleanup_interval(Duration::from_secs(5))
        .with_touch_after(Duration::from_secs(1))
        .with_auto_create(true);

    let store = SessionStore::builder(Arc::clone(&table), config)
        .observer(Arc::new(TracingObserver))
        .open()
        .await?;

    info!("Simulating session traffic, use Ctrl+C to stop");

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
        }
        info!("Shutdown signal received, stopping...");
    };

    tokio::select! {
        _ = traffic_loop(&store, Workload::default()) => {}
        _ = shutdown => {}
    }

    let stats = table.stats();
    info!(
        rows = stats.rows,
        puts = stats.put_ops,
        updates = stats.update_ops,
        deletes = stats.delete_ops,
        scans = stats.scan_ops,
        "Shutdown complete"
    );
    Ok(())
}

/// Creates, reads, touches and occasionally destroys sessions forever.
async fn traffic_loop(store: &SessionStore<MemoryTable>, workload: Workload) {
    let mut ticker = tokio::time::interval(workload.tick);
    let mut request = 0u64;

    loop {
        ticker.tick().await;
        request += 1;
        let sid = format!("sid-{}", request % workload.sessions);

        // Failures were already reported through the store's observer
        let _ = match store.get(&sid).await {
            Ok(Some(_)) if request % 97 == 0 => store.destroy(&sid).await,
            Ok(Some(session)) => store.touch(&sid, &session).await,
            Ok(None) => {
                let mut session = Session::new();
                session.insert("visits", json!(request));
                store.set(&sid, &session).await
            }
            Err(e) => Err(e),
        };
    }
}
