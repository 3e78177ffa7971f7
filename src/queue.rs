use crate::record::AccessLogRecord;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Process-wide FIFO hand-off between request contexts and the flush
/// worker.
///
/// One instance is created at startup and shared (via `Arc`) by every
/// producer and the single consumer. Both operations take the lock only for
/// the duration of a pointer-sized splice, so producers are never blocked
/// on store I/O.
///
/// The queue is unbounded: if the durable store stalls, memory grows until
/// the store recovers. That trades bounded memory for the guarantee that no
/// accepted record is ever dropped before a drain. Deployments with a
/// flaky store should monitor [`len`].
///
/// [`len`]: LogQueue::len
#[derive(Debug, Default)]
pub struct LogQueue {
    inner: Mutex<VecDeque<AccessLogRecord>>,
}

impl LogQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of records atomically with respect to other enqueues
    /// and drains. Records from one call are never interleaved with records
    /// from another.
    pub fn enqueue_all(&self, records: impl IntoIterator<Item = AccessLogRecord>) {
        let mut queue = self.lock();
        queue.extend(records);
    }

    /// Remove and return everything currently queued, oldest first.
    ///
    /// A record enqueued concurrently with a drain lands either in the
    /// returned batch or in the queue for the next drain; it is never lost.
    pub fn drain_all(&self) -> Vec<AccessLogRecord> {
        let mut queue = self.lock();
        queue.drain(..).collect()
    }

    /// Current depth, exported as a gauge by callers that monitor the
    /// pipeline.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A producer panicking mid-request must not take logging down with it,
    // so poisoned locks are recovered rather than propagated.
    fn lock(&self) -> MutexGuard<'_, VecDeque<AccessLogRecord>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::AccessLogBuilder;
    use crate::clock::FixedClock;
    use crate::record::Source;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use std::thread;

    fn record(message: String) -> AccessLogRecord {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap());
        AccessLogBuilder::new(Source::Oauth2Server)
            .with_message(message)
            .finalize(&clock)
    }

    #[test]
    fn drain_preserves_enqueue_order() {
        let queue = LogQueue::new();
        queue.enqueue_all(vec![record("r1".into()), record("r2".into())]);
        queue.enqueue_all(vec![record("r3".into())]);

        let drained = queue.drain_all();
        let messages: Vec<_> = drained.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, ["r1", "r2", "r3"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_on_empty_queue_returns_empty() {
        let queue = LogQueue::new();
        assert!(queue.drain_all().is_empty());
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn no_loss_under_concurrent_enqueue_and_drain() {
        const PRODUCERS: usize = 8;
        const PER_PRODUCER: usize = 100;

        let queue = Arc::new(LogQueue::new());

        let drainer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let mut collected = Vec::new();
                while collected.len() < PRODUCERS * PER_PRODUCER {
                    collected.extend(queue.drain_all());
                    thread::yield_now();
                }
                collected
            })
        };

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        queue.enqueue_all(vec![record(format!("{p}:{i}"))]);
                    }
                })
            })
            .collect();

        for producer in producers {
            producer.join().unwrap();
        }
        let collected = drainer.join().unwrap();

        // Exactly N*M records, no duplicates.
        assert_eq!(collected.len(), PRODUCERS * PER_PRODUCER);
        let mut seen: Vec<_> = collected.iter().map(|r| r.message.clone()).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), PRODUCERS * PER_PRODUCER);

        // Records from one producer come out in the order they went in.
        for p in 0..PRODUCERS {
            let sequence: Vec<usize> = collected
                .iter()
                .filter_map(|r| {
                    let (producer, index) = r.message.split_once(':')?;
                    (producer == p.to_string()).then(|| index.parse().unwrap())
                })
                .collect();
            assert!(
                sequence.windows(2).all(|w| w[0] < w[1]),
                "producer {p} records drained out of order: {sequence:?}"
            );
        }
    }
}
