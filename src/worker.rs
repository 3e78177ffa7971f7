use crate::queue::LogQueue;
use crate::store::LogStore;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Floor for the periodic flush interval; anything lower would have the
/// worker spinning on an empty queue.
const MIN_FLUSH_INTERVAL: Duration = Duration::from_millis(10);

/// Sole consumer of the shared [`LogQueue`].
///
/// Each flush cycle drains the queue in one atomic snapshot and writes the
/// drained records to the [`LogStore`] one at a time. A record whose insert
/// fails is reported through `tracing` and dropped; the cycle continues
/// with the remaining records. Cycles never overlap: the queue drain is not
/// reentrant-safe with a second consumer, so an invocation that finds a
/// cycle already running skips without touching the queue.
pub struct LogFlushWorker {
    queue: Arc<LogQueue>,
    store: Arc<dyn LogStore>,
    in_flight: AtomicBool,
    /// Records drained from the queue since startup.
    pub drained_total: AtomicU64,
    /// Records durably accepted by the store.
    pub inserted_total: AtomicU64,
    /// Records dropped after a failed insert.
    pub failed_total: AtomicU64,
}

/// Counts for a single completed flush cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlushStats {
    pub drained: usize,
    pub inserted: usize,
    pub failed: usize,
}

/// Result of one [`LogFlushWorker::run_cycle`] invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed(FlushStats),
    /// Another cycle was still running; the queue was left untouched.
    Skipped,
}

impl LogFlushWorker {
    pub fn new(queue: Arc<LogQueue>, store: Arc<dyn LogStore>) -> Self {
        LogFlushWorker {
            queue,
            store,
            in_flight: AtomicBool::new(false),
            drained_total: AtomicU64::new(0),
            inserted_total: AtomicU64::new(0),
            failed_total: AtomicU64::new(0),
        }
    }

    /// Run one drain-and-insert cycle.
    ///
    /// Callable from any task: the periodic timer, a shutdown hook, or a
    /// test. An empty queue makes the cycle a no-op with zero store calls.
    pub async fn run_cycle(&self) -> CycleOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return CycleOutcome::Skipped;
        }
        let stats = self.drain_and_insert().await;
        self.in_flight.store(false, Ordering::Release);
        CycleOutcome::Completed(stats)
    }

    async fn drain_and_insert(&self) -> FlushStats {
        let records = self.queue.drain_all();
        let mut stats = FlushStats {
            drained: records.len(),
            ..FlushStats::default()
        };
        self.drained_total
            .fetch_add(records.len() as u64, Ordering::Relaxed);

        for record in &records {
            match self.store.insert(record).await {
                Ok(()) => {
                    stats.inserted += 1;
                    self.inserted_total.fetch_add(1, Ordering::Relaxed);
                }
                Err(error) => {
                    stats.failed += 1;
                    self.failed_total.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        record_id = %record.id,
                        source = %record.source,
                        %error,
                        "access log insert failed, dropping record"
                    );
                }
            }
        }
        stats
    }

    /// Spawn the periodic flush task.
    ///
    /// The task runs [`run_cycle`] every `flush_interval` (clamped to a
    /// small floor; missed ticks are skipped, not replayed) until the
    /// returned [`PipelineHandle`] signals shutdown. On shutdown one final
    /// forced cycle runs first, so records enqueued after the last tick
    /// still reach the store before the task exits.
    ///
    /// [`run_cycle`]: LogFlushWorker::run_cycle
    pub fn spawn_periodic(self: Arc<Self>, flush_interval: Duration) -> PipelineHandle {
        let flush_interval = flush_interval.max(MIN_FLUSH_INTERVAL);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let worker = self;
        let join = tokio::spawn(async move {
            let mut ticker = interval(flush_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::debug!(?flush_interval, "access log flush worker started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        worker.run_cycle().await;
                    }
                    // Resolves on explicit shutdown and when the handle is
                    // dropped; both end with a final forced drain.
                    _ = &mut shutdown_rx => {
                        worker.run_cycle().await;
                        tracing::debug!("access log flush worker stopped");
                        break;
                    }
                }
            }
        });

        PipelineHandle { shutdown_tx, join }
    }
}

/// Controls the lifetime of the spawned flush task.
pub struct PipelineHandle {
    shutdown_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl PipelineHandle {
    /// Stop the periodic task after its final forced flush completes.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(error) = self.join.await {
            tracing::warn!(%error, "access log flush worker task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::AccessLogBuilder;
    use crate::clock::FixedClock;
    use crate::memory_store::MemoryStore;
    use crate::record::{AccessLogRecord, Source};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::error::Error;
    use tokio::sync::Notify;

    fn record(message: &str) -> AccessLogRecord {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap());
        AccessLogBuilder::new(Source::Oauth2Server)
            .with_message(message)
            .finalize(&clock)
    }

    #[tokio::test]
    async fn empty_cycle_is_a_no_op() {
        let queue = Arc::new(LogQueue::new());
        let store = Arc::new(MemoryStore::new());
        let worker = LogFlushWorker::new(Arc::clone(&queue), Arc::clone(&store) as Arc<dyn LogStore>);

        let outcome = worker.run_cycle().await;

        assert_eq!(outcome, CycleOutcome::Completed(FlushStats::default()));
        assert_eq!(store.attempts(), 0);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn single_record_reaches_the_store() {
        let queue = Arc::new(LogQueue::new());
        let store = Arc::new(MemoryStore::new());
        let worker = LogFlushWorker::new(Arc::clone(&queue), Arc::clone(&store) as Arc<dyn LogStore>);

        queue.enqueue_all(vec![record("Test message")]);
        let outcome = worker.run_cycle().await;

        assert_eq!(
            outcome,
            CycleOutcome::Completed(FlushStats {
                drained: 1,
                inserted: 1,
                failed: 0,
            })
        );
        let stored = store.records();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].message, "Test message");
        assert_eq!(stored[0].source, Source::Oauth2Server);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn failed_insert_is_dropped_and_the_cycle_continues() {
        let queue = Arc::new(LogQueue::new());
        let store = Arc::new(MemoryStore::failing_when(|r| r.message == "second"));
        let worker = LogFlushWorker::new(Arc::clone(&queue), Arc::clone(&store) as Arc<dyn LogStore>);

        queue.enqueue_all(vec![record("first"), record("second"), record("third")]);
        let outcome = worker.run_cycle().await;

        assert_eq!(
            outcome,
            CycleOutcome::Completed(FlushStats {
                drained: 3,
                inserted: 2,
                failed: 1,
            })
        );
        // All three were attempted, the failed one exactly once.
        assert_eq!(store.attempts(), 3);
        let stored: Vec<_> = store.records().iter().map(|r| r.message.clone()).collect();
        assert_eq!(stored, ["first", "third"]);
        assert!(queue.is_empty());

        // The failed record is gone for good: the next cycle sees nothing.
        let next = worker.run_cycle().await;
        assert_eq!(next, CycleOutcome::Completed(FlushStats::default()));
        assert_eq!(store.attempts(), 3);
    }

    /// Store that parks inside `insert` until released, to hold a cycle
    /// open while a second invocation is attempted.
    struct GateStore {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl LogStore for GateStore {
        async fn insert(
            &self,
            _record: &AccessLogRecord,
        ) -> Result<(), Box<dyn Error + Send + Sync>> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn overlapping_cycle_is_skipped() {
        let queue = Arc::new(LogQueue::new());
        let store = Arc::new(GateStore {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let worker = Arc::new(LogFlushWorker::new(
            Arc::clone(&queue),
            Arc::clone(&store) as Arc<dyn LogStore>,
        ));

        queue.enqueue_all(vec![record("held")]);

        let first = {
            let worker = Arc::clone(&worker);
            tokio::spawn(async move { worker.run_cycle().await })
        };
        store.entered.notified().await;

        // First cycle is parked inside the store; a second invocation must
        // not drain concurrently.
        assert_eq!(worker.run_cycle().await, CycleOutcome::Skipped);

        store.release.notify_one();
        let outcome = first.await.unwrap();
        assert_eq!(
            outcome,
            CycleOutcome::Completed(FlushStats {
                drained: 1,
                inserted: 1,
                failed: 0,
            })
        );
    }
}
