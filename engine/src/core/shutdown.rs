//! Centralized shutdown management

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use super::constants::SHUTDOWN_TIMEOUT_SECS;

/// Coordinates the stop signal and background task completion
#[derive(Clone)]
pub struct ShutdownService {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
    timeout: Duration,
}

impl Default for ShutdownService {
    fn default() -> Self {
        Self::new(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS))
    }
}

impl ShutdownService {
    pub fn new(timeout: Duration) -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
            handles: Arc::new(Mutex::new(Vec::new())),
            timeout,
        }
    }

    /// Register a background task handle to be awaited during shutdown
    pub async fn register(&self, handle: JoinHandle<()>) {
        self.handles.lock().await.push(handle);
    }

    /// Subscribe to shutdown signal
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.rx.clone()
    }

    /// Trigger shutdown
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    /// Check if shutdown was triggered
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Trigger shutdown and wait for registered tasks to drain
    pub async fn shutdown(&self) {
        tracing::debug!("Initiating graceful shutdown...");
        self.trigger();

        let handles = std::mem::take(&mut *self.handles.lock().await);
        tracing::debug!(
            count = handles.len(),
            "Waiting for background tasks to finish..."
        );

        match tokio::time::timeout(self.timeout, futures::future::join_all(handles)).await {
            Ok(results) => {
                for e in results.into_iter().filter_map(Result::err) {
                    tracing::warn!(error = %e, "Background task failed during shutdown");
                }
                tracing::debug!("All background tasks completed");
            }
            Err(_) => tracing::warn!(
                timeout_secs = self.timeout.as_secs(),
                "Timeout waiting for background tasks"
            ),
        }

        tracing::debug!("Shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_not_triggered_initially() {
        let shutdown = ShutdownService::default();
        assert!(!shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_subscriber_receives_shutdown() {
        let shutdown = ShutdownService::default();
        let rx = shutdown.subscribe();

        assert!(!*rx.borrow());
        shutdown.trigger();
        assert!(*rx.borrow());
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_registered_tasks() {
        let shutdown = ShutdownService::default();
        let mut rx = shutdown.subscribe();
        let finished = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = finished.clone();

        shutdown
            .register(tokio::spawn(async move {
                let _ = rx.wait_for(|&v| v).await;
                flag.store(true, std::sync::atomic::Ordering::SeqCst);
            }))
            .await;

        shutdown.shutdown().await;
        assert!(finished.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_shutdown_times_out_on_stuck_task() {
        let shutdown = ShutdownService::new(Duration::from_millis(20));
        shutdown
            .register(tokio::spawn(std::future::pending::<()>()))
            .await;

        tokio::time::timeout(Duration::from_secs(1), shutdown.shutdown())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_survives_panicked_task() {
        let shutdown = ShutdownService::default();
        let finished = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = finished.clone();
        let mut rx = shutdown.subscribe();

        shutdown
            .register(tokio::spawn(async { panic!("task failure") }))
            .await;
        shutdown
            .register(tokio::spawn(async move {
                let _ = rx.wait_for(|&v| v).await;
                flag.store(true, std::sync::atomic::Ordering::SeqCst);
            }))
            .await;

        shutdown.shutdown().await;
        assert!(finished.load(std::sync::atomic::Ordering::SeqCst));
    }
}
