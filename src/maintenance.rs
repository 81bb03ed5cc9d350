//! Background endpoint maintenance
//!
//! Reorders endpoints by probe latency on an interval (once immediately),
//! runs one health check at startup and logs metrics periodically. A zero
//! interval disables that task.

use crate::dispatch::Dispatcher;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Handle to the maintenance tasks; dropping it stops them
#[derive(Debug)]
pub struct Maintenance {
    handles: Vec<JoinHandle<()>>,
}

impl Maintenance {
    /// Spawn the maintenance tasks on the current tokio runtime
    pub fn spawn(dispatcher: Arc<Dispatcher>) -> Self {
        let mut handles = Vec::new();
        let config = dispatcher.config();

        let reorder_interval = config.reorder_interval;
        if !reorder_interval.is_zero() {
            let dispatcher = dispatcher.clone();
            handles.push(tokio::spawn(async move {
                tracing::info!("Starting endpoint reorder task (interval: {:?})", reorder_interval);
                // First tick fires immediately
                let mut interval = tokio::time::interval(reorder_interval);
                loop {
                    interval.tick().await;
                    dispatcher.reorder_by_latency().await;
                }
            }));
        }

        {
            let dispatcher = dispatcher.clone();
            handles.push(tokio::spawn(async move {
                dispatcher.health_check().await;
            }));
        }

        let metrics_interval = config.metrics_interval;
        if !metrics_interval.is_zero() {
            let dispatcher = dispatcher.clone();
            handles.push(tokio::spawn(async move {
                let mut interval = tokio::time::interval(metrics_interval);
                interval.tick().await; // nothing to report yet
                loop {
                    interval.tick().await;
                    report_metrics(&dispatcher);
                }
            }));
        }

        Self { handles }
    }

    /// Number of running tasks
    pub fn task_count(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// Stop all tasks
    pub fn shutdown(mut self) {
        self.abort_all();
    }

    fn abort_all(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for Maintenance {
    fn drop(&mut self) {
        self.abort_all();
    }
}

fn report_metrics(dispatcher: &Dispatcher) {
    let purged = dispatcher.cache().purge_expired();
    tracing::info!(
        "Dispatch metrics: {} cache_entries={} purged={}",
        dispatcher.metrics(),
        dispatcher.cache().len(),
        purged
    );
    for (url, health) in dispatcher.pool().get_endpoint_health() {
        if let Some(health) = health {
            tracing::info!("  {}: {}", url, health);
        }
    }
}
