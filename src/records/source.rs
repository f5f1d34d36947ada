use crate::config::RecordSourceConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// A raw, not-yet-validated record as the external store returns it
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Fetches batches of raw customer records from an external tabular store.
///
/// Output must be coerced into `FeatureRecord` by `records::validate` before
/// it reaches any engine. At-most-one-attempt semantics: a failure is final
/// for the request and is never retried here.
#[async_trait]
pub trait RecordFetcher: Send + Sync {
    async fn fetch_raw(&self, limit: usize) -> Result<Vec<RawRecord>>;
}

#[derive(Debug, Deserialize)]
struct RecordPage {
    list: Vec<RawRecord>,
}

/// NocoDB-backed record source: paginated HTTP GET with an API token header
pub struct NocoDbSource {
    client: Client,
    config: RecordSourceConfig,
}

impl NocoDbSource {
    pub fn new(config: RecordSourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl RecordFetcher for NocoDbSource {
    async fn fetch_raw(&self, limit: usize) -> Result<Vec<RawRecord>> {
        let token = self.config.token().ok_or_else(|| {
            AppError::UpstreamAuth(format!(
                "Record store credential is absent; set the {} environment variable",
                self.config.token_env
            ))
        })?;

        debug!(limit, url = %self.config.base_url, "Fetching records from store");

        let response = self
            .client
            .get(&self.config.base_url)
            .header("xc-token", token)
            .query(&[
                ("offset", "0".to_string()),
                ("limit", limit.to_string()),
                ("viewId", self.config.view_id.clone()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::UpstreamFetch(format!(
                        "Record store request timed out after {} seconds",
                        self.config.fetch_timeout_secs
                    ))
                } else {
                    AppError::UpstreamFetch(format!("Record store request failed: {e}"))
                }
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AppError::UpstreamAuth(format!(
                "Record store rejected the credential ({status})"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamFetch(format!(
                "Record store returned status {status}: {body}"
            )));
        }

        let page: RecordPage = response
            .json()
            .await
            .map_err(|e| AppError::UpstreamFetch(format!("Failed to decode record page: {e}")))?;

        info!(fetched = page.list.len(), limit, "Fetched records from store");
        Ok(page.list)
    }
}
