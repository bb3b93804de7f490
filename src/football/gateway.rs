use async_trait::async_trait;
use thiserror::Error;

/// Why a provider request produced no usable `response` payload.
///
/// Kept separate from an empty payload: "no events" is `Ok(vec![])`.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{path} returned HTTP {status}")]
    Status {
        path: String,
        status: reqwest::StatusCode,
    },

    #[error("{path} reported errors: {errors}")]
    Provider { path: String, errors: String },

    #[error("malformed payload from {path}: {reason}")]
    Malformed { path: String, reason: String },
}

/// Authenticated GET access to the sports-data provider.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Fetch `path` (with query string) and return the provider's
    /// `response` array.
    async fn fetch_response(&self, path: &str) -> Result<Vec<serde_json::Value>, GatewayError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
