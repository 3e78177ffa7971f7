use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Origin of an access-log record. Each deployment flavor of the
/// authorization server reports under its own source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Source {
    Oauth2Server,
    WebManagementPortal,
    TokenEndpoint,
}

impl Source {
    pub const ALL: [Source; 3] = [
        Source::Oauth2Server,
        Source::WebManagementPortal,
        Source::TokenEndpoint,
    ];

    /// Canonical name as stored in the `source` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Oauth2Server => "Oauth2Server",
            Source::WebManagementPortal => "WebManagementPortal",
            Source::TokenEndpoint => "TokenEndpoint",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a source name from configuration or storage does
/// not match any recognized value.
#[derive(thiserror::Error, Debug)]
#[error("unrecognized access log source: {0}")]
pub struct SourceParseError(pub String);

impl FromStr for Source {
    type Err = SourceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Oauth2Server" => Ok(Source::Oauth2Server),
            "WebManagementPortal" => Ok(Source::WebManagementPortal),
            "TokenEndpoint" => Ok(Source::TokenEndpoint),
            other => Err(SourceParseError(other.to_string())),
        }
    }
}

/// Finalized access-log entry.
///
/// Produced exclusively by [`AccessLogBuilder::finalize`] and never mutated
/// afterwards: producers move records into the request buffer and then into
/// the shared queue, so no other context ever holds a live reference.
///
/// [`AccessLogBuilder::finalize`]: crate::builder::AccessLogBuilder::finalize
#[derive(Debug, Clone, Serialize)]
pub struct AccessLogRecord {
    pub id: String,
    pub create_time: DateTime<Utc>,
    pub organization_id: Option<String>,
    pub oauth_token_id: Option<String>,
    pub client_id: Option<String>,
    pub request_id: Option<String>,
    pub source: Source,
    pub duration: Option<Duration>,
    pub message: String,
    pub error: Option<String>,
    pub status_code: Option<u16>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_roundtrips_through_canonical_name() {
        for source in Source::ALL {
            assert_eq!(source.as_str().parse::<Source>().unwrap(), source);
        }
    }

    #[test]
    fn unknown_source_name_is_rejected() {
        let err = "GraphqlGateway".parse::<Source>().unwrap_err();
        assert!(err.to_string().contains("GraphqlGateway"));
    }
}
