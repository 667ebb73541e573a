use thiserror::Error;

/// Every failure the network layer can hand back to a cache or a caller.
///
/// The set is closed: transport and HTTP failures are folded into one of
/// these kinds so view-models only ever match on six cases.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("No connectivity: {0}")]
    NoConnectivity(String),

    #[error("Malformed response: {0}")]
    Serialization(String),

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 | 403 => ApiError::Unauthorized,
            409 => ApiError::Conflict(truncated),
            500..=599 => ApiError::Server(truncated),
            _ => ApiError::Unknown(format!("Status {}: {}", status, truncated)),
        }
    }

    /// Short, stable name of the error kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::NoConnectivity(_) => "no_connectivity",
            ApiError::Serialization(_) => "serialization",
            ApiError::Unauthorized => "unauthorized",
            ApiError::Conflict(_) => "conflict",
            ApiError::Server(_) => "server",
            ApiError::Unknown(_) => "unknown",
        }
    }

    /// Text a screen shows next to its Retry control.
    pub fn user_message(&self) -> &'static str {
        match self {
            ApiError::NoConnectivity(_) => {
                "You appear to be offline. Check your connection and try again."
            }
            ApiError::Serialization(_) => "We received an unexpected response. Please try again.",
            ApiError::Unauthorized => "Your session has expired. Please sign in again.",
            ApiError::Conflict(_) => "This item was changed elsewhere. Refresh and try again.",
            ApiError::Server(_) => "Our servers are having trouble. Please try again shortly.",
            ApiError::Unknown(_) => "Something went wrong. Please try again.",
        }
    }

    /// Whether a Retry control makes sense for this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::NoConnectivity(_) | ApiError::Server(_) | ApiError::Unknown(_)
        )
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            ApiError::NoConnectivity(err.to_string())
        } else if err.is_decode() {
            ApiError::Serialization(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::from_status(status, &err.to_string())
        } else {
            ApiError::Unknown(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Serialization(err.to_string())
    }
}
