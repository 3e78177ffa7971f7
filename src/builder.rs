use crate::clock::Clock;
use crate::record::{AccessLogRecord, Source};
use std::time::Duration;
use uuid::Uuid;

/// Accumulator for the attributes of a single access-log event.
///
/// A builder is owned by exactly one request context, so the fluent setters
/// take and return the builder by value. Setting the same attribute twice
/// overwrites the previous value.
///
/// [`finalize`] consumes the builder, stamps the id and capture time, and
/// yields the immutable [`AccessLogRecord`]. Any use after finalization is
/// rejected at compile time:
///
/// ```compile_fail
/// use access_log_pipeline::builder::AccessLogBuilder;
/// use access_log_pipeline::clock::SystemClock;
/// use access_log_pipeline::record::Source;
///
/// let builder = AccessLogBuilder::new(Source::Oauth2Server);
/// let record = builder.finalize(&SystemClock);
/// let _ = builder.with_message("too late");
/// ```
///
/// [`finalize`]: AccessLogBuilder::finalize
#[derive(Debug)]
pub struct AccessLogBuilder {
    source: Source,
    organization_id: Option<String>,
    oauth_token_id: Option<String>,
    client_id: Option<String>,
    request_id: Option<String>,
    duration: Option<Duration>,
    message: Option<String>,
    error: Option<String>,
    status_code: Option<u16>,
    ip: Option<String>,
    user_agent: Option<String>,
}

impl AccessLogBuilder {
    /// Start a builder bound to one log [`Source`]. The source is fixed for
    /// the lifetime of the builder.
    pub fn new(source: Source) -> Self {
        AccessLogBuilder {
            source,
            organization_id: None,
            oauth_token_id: None,
            client_id: None,
            request_id: None,
            duration: None,
            message: None,
            error: None,
            status_code: None,
            ip: None,
            user_agent: None,
        }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_organization_id(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    pub fn with_oauth_token_id(mut self, oauth_token_id: impl Into<String>) -> Self {
        self.oauth_token_id = Some(oauth_token_id.into());
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Stamp the id and capture time and produce the finalized record.
    ///
    /// The timestamp comes from the supplied [`Clock`], so records built in
    /// sequence by one producer carry non-decreasing capture times as long
    /// as the clock itself is monotonic.
    pub fn finalize(self, clock: &dyn Clock) -> AccessLogRecord {
        AccessLogRecord {
            id: Uuid::new_v4().to_string(),
            create_time: clock.now(),
            organization_id: self.organization_id,
            oauth_token_id: self.oauth_token_id,
            client_id: self.client_id,
            request_id: self.request_id,
            source: self.source,
            duration: self.duration,
            message: self.message.unwrap_or_default(),
            error: self.error,
            status_code: self.status_code,
            ip: self.ip,
            user_agent: self.user_agent,
        }
    }
}
