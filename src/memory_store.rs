use crate::record::AccessLogRecord;
use crate::store::LogStore;
use async_trait::async_trait;
use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

type FailPredicate = dyn Fn(&AccessLogRecord) -> bool + Send + Sync;

/// In-process [`LogStore`] backed by a `Vec`.
///
/// Primarily a test double: it counts every insert attempt and can be
/// configured to reject records matching a predicate, which is how the
/// partial-failure paths of the flush worker are exercised.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<AccessLogRecord>>,
    attempts: AtomicU64,
    fail_when: Option<Box<FailPredicate>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects any record matching `predicate` with an error,
    /// while accepting everything else.
    pub fn failing_when(
        predicate: impl Fn(&AccessLogRecord) -> bool + Send + Sync + 'static,
    ) -> Self {
        MemoryStore {
            fail_when: Some(Box::new(predicate)),
            ..Self::default()
        }
    }

    /// Snapshot of the successfully stored records, in insert order.
    pub fn records(&self) -> Vec<AccessLogRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Total `insert` calls, including rejected ones.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LogStore for MemoryStore {
    async fn insert(&self, record: &AccessLogRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if let Some(fail_when) = &self.fail_when {
            if fail_when(record) {
                return Err(format!("memory store rejected record {}", record.id).into());
            }
        }
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}
