use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::gateway::{Gateway, GatewayError};

/// Gateway backed by API-Football v3.
/// Docs: <https://www.api-football.com/documentation-v3>
pub struct ApiFootball {
    http: Client,
    base_url: Url,
    host: String,
    api_key: String,
}

impl ApiFootball {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).context("Invalid API-Football base URL")?;
        let host = base_url
            .host_str()
            .context("API-Football base URL has no host")?
            .to_string();
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiFootball {
            http,
            base_url,
            host,
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl Gateway for ApiFootball {
    fn name(&self) -> &str {
        "API-Football"
    }

    async fn fetch_response(&self, path: &str) -> Result<Vec<serde_json::Value>, GatewayError> {
        let url = self.base_url.join(path).map_err(|e| GatewayError::Malformed {
            path: path.to_string(),
            reason: format!("cannot build request URL: {}", e),
        })?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .header("x-rapidapi-host", &self.host)
            .header("x-rapidapi-key", &self.api_key)
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                path: path.to_string(),
                source,
            })?;

        if !resp.status().is_success() {
            return Err(GatewayError::Status {
                path: path.to_string(),
                status: resp.status(),
            });
        }

        let raw: serde_json::Value = resp.json().await.map_err(|e| GatewayError::Malformed {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        extract_response(path, raw)
    }
}

/// Pull the `response` array out of an API-Football envelope.
///
/// API-Football answers auth and quota problems with HTTP 200, an empty
/// `response` and a populated `errors` field, so that field is checked first.
pub fn extract_response(
    path: &str,
    mut raw: serde_json::Value,
) -> Result<Vec<serde_json::Value>, GatewayError> {
    let has_errors = match raw.get("errors") {
        Some(serde_json::Value::Object(map)) => !map.is_empty(),
        Some(serde_json::Value::Array(list)) => !list.is_empty(),
        _ => false,
    };
    if has_errors {
        return Err(GatewayError::Provider {
            path: path.to_string(),
            errors: raw["errors"].to_string(),
        });
    }

    match raw.get_mut("response").map(serde_json::Value::take) {
        Some(serde_json::Value::Array(items)) => Ok(items),
        Some(other) => Err(GatewayError::Malformed {
            path: path.to_string(),
            reason: format!("'response' is not an array: {}", other),
        }),
        None => Err(GatewayError::Malformed {
            path: path.to_string(),
            reason: "missing 'response' field".to_string(),
        }),
    }
}
