use crate::record::AccessLogRecord;
use async_trait::async_trait;
use std::error::Error;

/// Durable destination for finalized [`AccessLogRecord`]s.
///
/// Implementations transport records to concrete storage (Postgres, an
/// in-memory table for tests, etc). The flush worker calls `insert` from
/// its own background task, never on a request thread, so implementations
/// may block on network I/O.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Persist a single record.
    ///
    /// **Parameters**
    /// - `record`: fully-populated [`AccessLogRecord`] drained from the
    ///   shared queue.
    ///
    /// **Returns**
    /// - `Ok(())` if the record was durably accepted.
    /// - `Err(..)` if the backend failed (connection error, constraint
    ///   violation, etc.). Failure must surface as an `Err`, never as a
    ///   silent no-op: the worker reports it and drops the record — there
    ///   is no automatic redelivery.
    async fn insert(&self, record: &AccessLogRecord) -> Result<(), Box<dyn Error + Send + Sync>>;
}
