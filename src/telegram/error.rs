//! Bot API error types

use thiserror::Error;

/// Bot API error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Network, message)
    }

    pub fn http(status: u16, description: Option<&str>) -> Self {
        let message = match description {
            Some(d) => format!("Telegram API responded with status {status}: {d}"),
            None => format!("Telegram API responded with status {status}"),
        };
        Self::new(ApiErrorKind::Http { status }, message)
    }

    pub fn api(description: Option<&str>) -> Self {
        Self::new(
            ApiErrorKind::Api,
            format!("Telegram API Error: {}", description.unwrap_or("Unknown error")),
        )
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Decode, message)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::decode(e.to_string())
        } else {
            Self::network(e.to_string())
        }
    }
}

/// Error classification for logging and retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Connection failures and timeouts
    Network,
    /// Non-success HTTP status
    Http { status: u16 },
    /// HTTP success but `ok: false` in the envelope
    Api,
    /// Response body did not match the expected shape
    Decode,
}

impl ApiErrorKind {
    pub fn is_retryable(self) -> bool {
        match self {
            Self::Network => true,
            Self::Http { status } => status == 429 || status >= 500,
            Self::Api | Self::Decode => false,
        }
    }
}
