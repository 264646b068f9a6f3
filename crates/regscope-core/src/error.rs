use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegScopeError {
    /// Network failure, timeout or non-success status from the upstream service
    #[error("Upstream unavailable: {reason}")]
    UpstreamUnavailable {
        reason: String,
        /// HTTP status when the service answered with a non-success code
        status: Option<u16>,
    },

    /// Body received but could not be parsed
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Every sampled title for an agency failed, or none existed
    #[error("Sample exhausted for agency: {0}")]
    SampleExhausted(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegScopeError {
    /// Upstream could not be reached, or the connection broke mid-response.
    pub fn upstream(reason: impl Into<String>) -> Self {
        RegScopeError::UpstreamUnavailable {
            reason: reason.into(),
            status: None,
        }
    }

    /// Upstream answered with a non-success HTTP status.
    pub fn from_status(endpoint: &str, status: u16) -> Self {
        RegScopeError::UpstreamUnavailable {
            reason: format!("{} returned HTTP {}", endpoint, status),
            status: Some(status),
        }
    }

    /// HTTP status carried by an upstream failure, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            RegScopeError::UpstreamUnavailable { status, .. } => *status,
            _ => None,
        }
    }

    /// Transient failures worth another attempt: network errors, timeouts, 5xx and 429.
    pub fn is_retryable(&self) -> bool {
        match self {
            RegScopeError::UpstreamUnavailable { status, .. } => match status {
                Some(code) => *code == 429 || (500..600).contains(code),
                None => true,
            },
            _ => false,
        }
    }
}

impl From<serde_json::Error> for RegScopeError {
    fn from(err: serde_json::Error) -> Self {
        RegScopeError::MalformedResponse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RegScopeError>;
