use crate::buffer::RequestLogBuffer;
use crate::builder::AccessLogBuilder;
use crate::clock::Clock;
use crate::queue::LogQueue;
use crate::record::Source;
use std::collections::HashSet;
use std::sync::Arc;

/// Producer-side facade of the pipeline.
///
/// One instance per deployment flavor, bound to that deployment's default
/// [`Source`]: request handlers build entries through it and hand the
/// request's accumulated records to the shared queue just before the
/// response goes out. Everything on this path is synchronous and cheap;
/// store I/O happens only in the flush worker.
pub struct AccessLogService {
    queue: Arc<LogQueue>,
    clock: Arc<dyn Clock>,
    source: Source,
    enabled_sources: HashSet<Source>,
}

impl AccessLogService {
    pub fn new(
        queue: Arc<LogQueue>,
        clock: Arc<dyn Clock>,
        source: Source,
        enabled_sources: HashSet<Source>,
    ) -> Self {
        AccessLogService {
            queue,
            clock,
            source,
            enabled_sources,
        }
    }

    /// New builder bound to this service's source.
    pub fn builder(&self) -> AccessLogBuilder {
        AccessLogBuilder::new(self.source)
    }

    /// Finalize `builder` with `message` and append the record to the
    /// request buffer.
    ///
    /// Records whose source is disabled by configuration are discarded
    /// here, before any allocation in the shared queue.
    pub fn create(
        &self,
        buffer: &mut RequestLogBuffer,
        builder: AccessLogBuilder,
        message: impl Into<String>,
    ) {
        if !self.enabled_sources.contains(&builder.source()) {
            return;
        }
        buffer.append(builder.with_message(message).finalize(self.clock.as_ref()));
    }

    /// Move the request's buffered records into the shared queue.
    ///
    /// Request handlers call this once before returning; the records become
    /// visible to the next flush cycle in their buffered order.
    pub fn process_buffered(&self, buffer: &mut RequestLogBuffer) {
        let records = buffer.drain_local();
        if records.is_empty() {
            return;
        }
        self.queue.enqueue_all(records);
    }

    /// The shared queue this service enqueues into.
    pub fn queue(&self) -> &Arc<LogQueue> {
        &self.queue
    }
}
