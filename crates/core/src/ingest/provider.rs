use crate::config::Settings;
use crate::ingest::error::ProviderHttpError;
use crate::ingest::types::RatingsPage;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRIES: u32 = 3;
const PROVIDER_NAME: &str = "external_ratings_api";

#[async_trait::async_trait]
pub trait RatingsProviderClient: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Fetches one page; `None` requests the first page.
    async fn fetch_page(&self, next_page: Option<&str>) -> Result<RatingsPage>;
}

#[derive(Debug, Clone)]
pub struct HttpJsonRatingsProvider {
    http: reqwest::Client,
    url: String,
    token: Option<String>,
    retries: u32,
}

impl HttpJsonRatingsProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let url = settings.require_external_api_url()?.to_string();
        let token = settings.external_api_token.clone();

        let timeout_secs = std::env::var("EXTERNAL_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("EXTERNAL_API_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES)
            .max(1);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build ratings provider http client")?;

        Ok(Self {
            http,
            url,
            token,
            retries,
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}"))
                    .context("EXTERNAL_API_TOKEN is not a valid header value")?,
            );
        }
        Ok(headers)
    }

    async fn fetch_once(&self, next_page: Option<&str>) -> Result<RatingsPage> {
        let headers = self.headers()?;

        let mut req = self.http.get(&self.url).headers(headers);
        if let Some(cursor) = next_page {
            req = req.query(&[("next_page", cursor)]);
        }

        let res = req.send().await.context("ratings provider request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read ratings provider response")?;

        if !status.is_success() {
            return Err(ProviderHttpError {
                provider: PROVIDER_NAME,
                status: status.as_u16(),
                raw_body: text,
            }
            .into());
        }

        let page = serde_json::from_str::<RatingsPage>(&text)
            .with_context(|| format!("failed to parse ratings provider response: {text}"))?;
        Ok(page)
    }
}

#[async_trait::async_trait]
impl RatingsProviderClient for HttpJsonRatingsProvider {
    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn fetch_page(&self, next_page: Option<&str>) -> Result<RatingsPage> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once(next_page).await {
                Ok(page) => return Ok(page),
                Err(err) => {
                    if attempt >= self.retries || !is_retryable(&err) {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(attempt, ?backoff, ?next_page, error = %err, "ratings fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

/// Transport and decode failures are retried; HTTP errors only when the status allows it.
fn is_retryable(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ProviderHttpError>()
        .map_or(true, ProviderHttpError::is_retryable)
}
