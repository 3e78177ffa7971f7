use crate::clock::SystemClock;
use crate::env::{ACCESS_LOG_FLUSH_INTERVAL_MS_ENV, ACCESS_LOG_SOURCES_ENV};
use crate::queue::LogQueue;
use crate::record::{Source, SourceParseError};
use crate::service::AccessLogService;
use crate::store::LogStore;
use crate::worker::{LogFlushWorker, PipelineHandle};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Pipeline configuration.
///
/// **Fields**
/// - `flush_interval`: cadence of the background flush worker. A small
///   floor is enforced when the worker is spawned.
/// - `enabled_sources`: records from any source outside this set are
///   discarded on the producer side before buffering.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub flush_interval: Duration,
    pub enabled_sources: HashSet<Source>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_secs(1),
            enabled_sources: Source::ALL.into_iter().collect(),
        }
    }
}

impl PipelineConfig {
    /// Read configuration from the process environment, keeping defaults
    /// for anything unset.
    ///
    /// `ACCESS_LOG_FLUSH_INTERVAL_MS` must be an integer millisecond count
    /// (non-numeric values are ignored); `ACCESS_LOG_SOURCES` is a
    /// comma-separated source list and fails fast on an unrecognized name.
    pub fn from_env() -> Result<Self, SourceParseError> {
        let mut config = Self::default();
        if let Ok(value) = std::env::var(ACCESS_LOG_FLUSH_INTERVAL_MS_ENV) {
            if let Ok(millis) = value.parse::<u64>() {
                config.flush_interval = Duration::from_millis(millis);
            }
        }
        if let Ok(value) = std::env::var(ACCESS_LOG_SOURCES_ENV) {
            config.enabled_sources = value
                .split(',')
                .map(|name| name.trim().parse())
                .collect::<Result<_, _>>()?;
        }
        Ok(config)
    }
}

/// Construct the full pipeline around `store` and spawn its periodic flush
/// worker.
///
/// **Parameters**
/// - `store`: implementation of [`LogStore`] receiving drained records.
/// - `source`: default [`Source`] for records built through the returned
///   service; each deployment flavor of the server reports under its own.
///
/// **Returns**
/// - The producer-side [`AccessLogService`] for request handlers.
/// - The [`PipelineHandle`] owning the background task; call
///   [`PipelineHandle::shutdown`] during process teardown so the final
///   forced flush runs before exit.
///
/// Must be called from within a tokio runtime. Equivalent to
/// [`start_pipeline_with_config`] with [`PipelineConfig::default`].
pub fn start_pipeline(
    store: Arc<dyn LogStore>,
    source: Source,
) -> (AccessLogService, PipelineHandle) {
    start_pipeline_with_config(store, source, PipelineConfig::default())
}

/// [`start_pipeline`] with explicit [`PipelineConfig`] control over the
/// flush cadence and the enabled-source set.
pub fn start_pipeline_with_config(
    store: Arc<dyn LogStore>,
    source: Source,
    config: PipelineConfig,
) -> (AccessLogService, PipelineHandle) {
    let queue = Arc::new(LogQueue::new());
    let worker = Arc::new(LogFlushWorker::new(Arc::clone(&queue), store));
    let handle = worker.spawn_periodic(config.flush_interval);
    let service = AccessLogService::new(
        queue,
        Arc::new(SystemClock),
        source,
        config.enabled_sources,
    );
    (service, handle)
}
