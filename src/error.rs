use std::time::Duration;

use thiserror::Error;

/// Failures raised while acquiring jobs from one source.
///
/// None of these leave the dispatcher: each is caught at the smallest
/// enclosing unit (record, page, provider call, source) and turned into
/// "zero jobs from this unit".
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("network error: {0}")]
    Network(String),

    #[error("http status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("credentials missing: {0}")]
    CredentialsMissing(String),

    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("unknown source type '{0}'")]
    UnknownKind(String),

    #[error("invalid source: {0}")]
    InvalidSource(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl AcquireError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            let url = err.url().map(|u| u.to_string()).unwrap_or_default();
            return AcquireError::HttpStatus { status: status.as_u16(), url };
        }
        AcquireError::Network(err.to_string())
    }

    /// 403 and 503 are what job boards answer when they decide we are a bot.
    pub fn is_blocking(&self) -> bool {
        matches!(self, AcquireError::HttpStatus { status: 403 | 503, .. })
    }
}
