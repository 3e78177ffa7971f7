use crate::record::AccessLogRecord;
use crate::store::LogStore;
use async_trait::async_trait;
use std::error::Error;

/// A store that simply drops all records.
///
/// Useful for measuring the overhead of the pipeline itself without any
/// external I/O, and for deployments that want the request-path plumbing
/// with persistence switched off.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopStore;

#[async_trait]
impl LogStore for NoopStore {
    async fn insert(&self, _record: &AccessLogRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
