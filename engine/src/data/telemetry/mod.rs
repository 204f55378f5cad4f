//! Best-effort telemetry emission
//!
//! Callers push events through a `TelemetryHandle` without waiting. A
//! background task batches them and flushes when the batch is full, when the
//! flush interval elapses, and once more on shutdown.

mod event;
mod sink;

pub use event::{TelemetryContext, TelemetryEvent, TelemetryEventKind};
pub use sink::{HttpTelemetrySink, LogSink, TelemetrySink};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::data::error::TelemetryError;

/// Non-blocking producer side of the emitter
#[derive(Debug, Clone)]
pub struct TelemetryHandle {
    tx: mpsc::Sender<TelemetryEvent>,
}

impl TelemetryHandle {
    /// Queue an event. A full buffer drops the event rather than waiting.
    pub fn emit(&self, event: TelemetryEvent) -> Result<(), TelemetryError> {
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(dropped) => {
                tracing::warn!(kind = ?dropped.kind, "Telemetry buffer full, dropping event");
                TelemetryError::BufferFull
            }
            mpsc::error::TrySendError::Closed(_) => TelemetryError::ChannelClosed,
        })
    }
}

pub struct TelemetryEmitter {
    sink: Arc<dyn TelemetrySink>,
    batch_size: usize,
    flush_interval: Duration,
}

impl TelemetryEmitter {
    pub fn new(sink: Arc<dyn TelemetrySink>, batch_size: usize, flush_interval: Duration) -> Self {
        Self {
            sink,
            batch_size: batch_size.max(1),
            flush_interval: flush_interval.max(Duration::from_millis(1)),
        }
    }

    /// Spawn the batching task
    pub fn start(
        self,
        buffer: usize,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> (TelemetryHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel(buffer.max(1));

        let task = tokio::spawn(async move {
            let mut batch: Vec<TelemetryEvent> = Vec::with_capacity(self.batch_size);
            let mut ticker = tokio::time::interval(self.flush_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            tracing::debug!("TelemetryEmitter received shutdown, draining...");
                            break;
                        }
                    }
                    received = rx.recv() => {
                        match received {
                            Some(event) => {
                                batch.push(event);
                                if batch.len() >= self.batch_size {
                                    self.flush(&mut batch).await;
                                }
                            }
                            None => break,
                        }
                    }
                    _ = ticker.tick() => {
                        self.flush(&mut batch).await;
                    }
                }
            }

            rx.close();
            while let Some(event) = rx.recv().await {
                batch.push(event);
                if batch.len() >= self.batch_size {
                    self.flush(&mut batch).await;
                }
            }
            self.flush(&mut batch).await;
            tracing::debug!(sink = self.sink.name(), "TelemetryEmitter shutdown complete");
        });

        (TelemetryHandle { tx }, task)
    }

    async fn flush(&self, batch: &mut Vec<TelemetryEvent>) {
        if batch.is_empty() {
            return;
        }
        if let Err(e) = self.sink.send_batch(batch).await {
            tracing::warn!(
                error = %e,
                sink = self.sink.name(),
                dropped = batch.len(),
                "Telemetry batch dropped"
            );
        }
        batch.clear();
    }
}

#[cfg(test)]
#[path = "emitter_tests.rs"]
mod tests;
