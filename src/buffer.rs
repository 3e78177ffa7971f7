use crate::record::AccessLogRecord;

/// Append-only record buffer owned by a single request context.
///
/// The buffer is carried through request handling as part of the
/// request-scoped state and is never shared, so appends need no
/// synchronization. Nothing drains it in the background: entries sit here
/// until the owning context calls [`drain_local`], which request handlers
/// do once before returning.
///
/// [`drain_local`]: RequestLogBuffer::drain_local
#[derive(Debug, Default)]
pub struct RequestLogBuffer {
    entries: Vec<AccessLogRecord>,
}

impl RequestLogBuffer {
    /// Empty buffer. Does not allocate until the first append.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: AccessLogRecord) {
        self.entries.push(record);
    }

    /// Return the buffered records in append order, leaving the buffer
    /// empty.
    pub fn drain_local(&mut self) -> Vec<AccessLogRecord> {
        std::mem::take(&mut self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
