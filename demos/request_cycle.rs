use access_log_pipeline::buffer::RequestLogBuffer;
use access_log_pipeline::init::{start_pipeline_with_config, PipelineConfig};
use access_log_pipeline::memory_store::MemoryStore;
use access_log_pipeline::record::Source;
use access_log_pipeline::store::LogStore;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    let store = Arc::new(MemoryStore::new());
    let (service, handle) = start_pipeline_with_config(
        Arc::clone(&store) as Arc<dyn LogStore>,
        Source::Oauth2Server,
        PipelineConfig {
            flush_interval: Duration::from_millis(200),
            ..PipelineConfig::default()
        },
    );

    // One simulated request, logged the way the server's request filter
    // does it: an entry at the start, one at the end, then the hand-off.
    let mut buffer = RequestLogBuffer::new();
    service.create(
        &mut buffer,
        service
            .builder()
            .with_request_id("req-42")
            .with_ip("127.0.0.1")
            .with_user_agent("curl/8.5.0"),
        "Request started: POST /oauth/token",
    );
    service.create(
        &mut buffer,
        service
            .builder()
            .with_request_id("req-42")
            .with_status_code(200)
            .with_duration(Duration::from_millis(12)),
        "Request finished",
    );
    service.process_buffered(&mut buffer);

    tokio::time::sleep(Duration::from_millis(500)).await;
    println!("stored {} records", store.len());
    for record in store.records() {
        println!("  [{}] {} {}", record.create_time, record.source, record.message);
    }

    handle.shutdown().await;
}
