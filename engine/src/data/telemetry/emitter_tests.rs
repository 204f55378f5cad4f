use super::*;
use async_trait::async_trait;
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct CollectingSink {
    batches: Mutex<Vec<Vec<TelemetryEvent>>>,
}

impl CollectingSink {
    fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().iter().map(Vec::len).collect()
    }

    fn total(&self) -> usize {
        self.batch_sizes().iter().sum()
    }
}

#[async_trait]
impl TelemetrySink for CollectingSink {
    async fn send_batch(&self, batch: &[TelemetryEvent]) -> Result<(), TelemetryError> {
        self.batches.lock().push(batch.to_vec());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "collecting"
    }
}

#[derive(Debug)]
struct FailingSink;

#[async_trait]
impl TelemetrySink for FailingSink {
    async fn send_batch(&self, _batch: &[TelemetryEvent]) -> Result<(), TelemetryError> {
        Err(TelemetryError::Sink("collector down".into()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

fn context() -> TelemetryContext {
    TelemetryContext {
        agent_id: "agent".into(),
        agent_version: "0.1.0".into(),
        decision_type: None,
        execution_ref: None,
    }
}

#[tokio::test]
async fn test_flushes_full_batches_and_drains_on_shutdown() {
    let sink = Arc::new(CollectingSink::default());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let emitter = TelemetryEmitter::new(sink.clone(), 2, Duration::from_secs(3600));
    let (handle, task) = emitter.start(16, shutdown_rx);

    for _ in 0..5 {
        handle.emit(context().execution_started()).unwrap();
    }
    shutdown_tx.send(true).unwrap();
    task.await.unwrap();

    assert_eq!(sink.total(), 5);
    assert!(sink.batch_sizes().iter().all(|&n| n <= 2));
}

#[tokio::test]
async fn test_interval_flushes_partial_batch() {
    let sink = Arc::new(CollectingSink::default());
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let emitter = TelemetryEmitter::new(sink.clone(), 100, Duration::from_millis(10));
    let (handle, _task) = emitter.start(16, shutdown_rx);

    handle.emit(context().execution_started()).unwrap();
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        if sink.total() == 1 {
            break;
        }
    }
    assert_eq!(sink.total(), 1);
}

#[tokio::test]
async fn test_full_buffer_drops_event() {
    let sink = Arc::new(CollectingSink::default());
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let emitter = TelemetryEmitter::new(sink, 10, Duration::from_secs(3600));
    let (handle, _task) = emitter.start(1, shutdown_rx);

    // current-thread runtime: the task cannot drain between these calls
    handle.emit(context().execution_started()).unwrap();
    let err = handle.emit(context().execution_started()).unwrap_err();
    assert!(matches!(err, TelemetryError::BufferFull));
}

#[tokio::test]
async fn test_closed_channel_reported() {
    let sink = Arc::new(CollectingSink::default());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let emitter = TelemetryEmitter::new(sink, 10, Duration::from_secs(3600));
    let (handle, task) = emitter.start(4, shutdown_rx);
    shutdown_tx.send(true).unwrap();
    task.await.unwrap();

    let err = handle.emit(context().execution_started()).unwrap_err();
    assert!(matches!(err, TelemetryError::ChannelClosed));
}

#[tokio::test]
async fn test_sink_failure_is_swallowed() {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let emitter = TelemetryEmitter::new(Arc::new(FailingSink), 1, Duration::from_secs(3600));
    let (handle, task) = emitter.start(4, shutdown_rx);
    handle.emit(context().execution_started()).unwrap();
    shutdown_tx.send(true).unwrap();
    assert!(task.await.is_ok());
}

#[tokio::test]
async fn test_dropping_all_handles_stops_task() {
    let sink = Arc::new(CollectingSink::default());
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let emitter = TelemetryEmitter::new(sink.clone(), 10, Duration::from_secs(3600));
    let (handle, task) = emitter.start(4, shutdown_rx);
    handle.emit(context().execution_started()).unwrap();
    drop(handle);
    task.await.unwrap();
    assert_eq!(sink.total(), 1);
}
