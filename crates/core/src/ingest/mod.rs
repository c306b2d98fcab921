pub mod error;
pub mod provider;
pub mod types;

use crate::domain::rating_event::RatingEvent;
use anyhow::Result;
use provider::RatingsProviderClient;
use std::collections::HashSet;

const DEFAULT_MAX_PAGES: usize = 1000;

#[derive(Debug, Clone, Default)]
pub struct FetchSummary {
    pub events: Vec<RatingEvent>,
    pub pages: usize,
    pub skipped: usize,
}

/// Follows `next_page` cursors until the feed is exhausted, validating every item.
///
/// Invalid items are skipped and counted; transport errors abort the whole fetch.
pub async fn fetch_all_events(client: &dyn RatingsProviderClient) -> Result<FetchSummary> {
    let max_pages = std::env::var("EXTERNAL_API_MAX_PAGES")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_MAX_PAGES);
    fetch_all_events_bounded(client, max_pages).await
}

pub async fn fetch_all_events_bounded(
    client: &dyn RatingsProviderClient,
    max_pages: usize,
) -> Result<FetchSummary> {
    anyhow::ensure!(max_pages >= 1, "EXTERNAL_API_MAX_PAGES must be >= 1");

    let mut out = FetchSummary::default();
    let mut seen_cursors = HashSet::<String>::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = client.fetch_page(cursor.as_deref()).await?;
        out.pages += 1;

        for item in page.items.iter().cloned() {
            match item.validate_and_into_event() {
                Ok(event) => out.events.push(event),
                Err(err) => {
                    out.skipped += 1;
                    tracing::warn!(provider = client.provider_name(), page = out.pages, error = %err, "skipping invalid rating item");
                }
            }
        }

        let Some(next) = page.next_cursor() else {
            break;
        };
        anyhow::ensure!(
            seen_cursors.insert(next.to_string()),
            "ratings provider returned a repeated cursor: {next}"
        );
        if out.pages >= max_pages {
            tracing::warn!(max_pages, "ratings fetch stopped at page limit");
            break;
        }
        cursor = Some(next.to_string());
    }

    tracing::info!(
        provider = client.provider_name(),
        pages = out.pages,
        events = out.events.len(),
        skipped = out.skipped,
        "fetched rating events"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::RatingsPage;
    use serde_json::{json, Value};
    use std::collections::HashMap;

    struct StaticPages {
        pages: HashMap<Option<String>, Value>,
    }

    #[async_trait::async_trait]
    impl RatingsProviderClient for StaticPages {
        fn provider_name(&self) -> &'static str {
            "static"
        }

        async fn fetch_page(&self, next_page: Option<&str>) -> Result<RatingsPage> {
            let raw = self
                .pages
                .get(&next_page.map(str::to_string))
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("unknown cursor {next_page:?}"))?;
            Ok(serde_json::from_value(raw)?)
        }
    }

    fn item(ticker: &str) -> Value {
        json!({
            "ticker": ticker,
            "company": format!("{ticker} Corp"),
            "rating_to": "Buy",
            "time": "2025-03-04T14:30:00Z",
        })
    }

    #[tokio::test]
    async fn follows_cursors_and_skips_invalid_items() {
        let client = StaticPages {
            pages: HashMap::from([
                (None, json!({"items": [item("AAPL"), item("")], "next_page": "p2"})),
                (Some("p2".to_string()), json!({"items": [item("MSFT")], "next_page": ""})),
            ]),
        };

        let summary = fetch_all_events_bounded(&client, 10).await.unwrap();
        assert_eq!(summary.pages, 2);
        assert_eq!(summary.skipped, 1);
        let tickers: Vec<&str> = summary.events.iter().map(|e| e.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["AAPL", "MSFT"]);
    }

    #[tokio::test]
    async fn repeated_cursor_is_an_error() {
        let client = StaticPages {
            pages: HashMap::from([
                (None, json!({"items": [], "next_page": "p2"})),
                (Some("p2".to_string()), json!({"items": [], "next_page": "p2"})),
            ]),
        };
        assert!(fetch_all_events_bounded(&client, 10).await.is_err());
    }

    #[tokio::test]
    async fn stops_at_page_limit() {
        let client = StaticPages {
            pages: HashMap::from([
                (None, json!({"items": [item("AAPL")], "next_page": "p2"})),
                (Some("p2".to_string()), json!({"items": [item("MSFT")]})),
            ]),
        };
        let summary = fetch_all_events_bounded(&client, 1).await.unwrap();
        assert_eq!(summary.pages, 1);
        assert_eq!(summary.events.len(), 1);
    }
}
