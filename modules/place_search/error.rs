use thiserror::Error;

/// Failure of a single search call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Status 120: too many requests per second.
    #[error("rate limited: {0}")]
    RateLimited(String),
    /// Status 121: daily quota used up.
    #[error("quota exhausted: {0}")]
    QuotaExhausted(String),
    /// Any other non-zero status.
    #[error("api error {status}: {message}")]
    Api {
        /// Provider status code.
        status: i64,
        /// Provider message.
        message: String,
    },
    /// Network failure, timeout or non-2xx HTTP status.
    #[error("transport error: {0}")]
    Transport(String),
    /// Body was not the expected JSON.
    #[error("invalid response: {0}")]
    Decode(String),
    /// Credential variable unset or empty.
    #[error("missing credential: environment variable {0} is not set")]
    MissingCredential(String),
}

impl SearchError {
    /// Whether another attempt may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Transport(_))
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Failure of a page after retries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Quota exhausted; the whole run must stop.
    #[error("quota exhausted: {0}")]
    QuotaExhausted(String),
    /// Page given up on; later pages of the keyword are skipped.
    #[error("page {page_index} abandoned after {attempts} attempt(s): {source}")]
    Abandoned {
        /// Page that failed.
        page_index: u32,
        /// Attempts made.
        attempts: u32,
        /// Last error seen.
        #[source]
        source: SearchError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rate_limit_and_transport_retry() {
        assert!(SearchError::RateLimited("qps".into()).is_retryable());
        assert!(SearchError::Transport("timeout".into()).is_retryable());
        assert!(!SearchError::QuotaExhausted("daily".into()).is_retryable());
        assert!(!SearchError::Api {
            status: 311,
            message: "key format error".into()
        }
        .is_retryable());
    }

    #[test]
    fn abandoned_message_names_the_page() {
        let err = FetchError::Abandoned {
            page_index: 3,
            attempts: 10,
            source: SearchError::Transport("timed out".into()),
        };
        assert_eq!(
            err.to_string(),
            "page 3 abandoned after 10 attempt(s): transport error: timed out"
        );
    }
}
