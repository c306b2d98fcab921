use crate::domain::rating_event::RatingEvent;
use anyhow::ensure;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One item as delivered by the external ratings feed, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedRatingItem {
    #[serde(default)]
    pub ticker: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub brokerage: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub rating_from: String,
    #[serde(default)]
    pub rating_to: String,
    #[serde(default)]
    pub target_from: String,
    #[serde(default)]
    pub target_to: String,
    pub time: Option<DateTime<Utc>>,
}

impl FeedRatingItem {
    pub fn validate_and_into_event(self) -> anyhow::Result<RatingEvent> {
        let ticker = self.ticker.trim().to_ascii_uppercase();
        ensure!(!ticker.is_empty(), "ticker must be non-empty");

        let company = self.company.trim().to_string();
        ensure!(!company.is_empty(), "company must be non-empty (ticker={ticker})");

        let Some(time) = self.time else {
            anyhow::bail!("time is required (ticker={ticker})");
        };
        // Zero-valued timestamps from the feed serialize as the epoch or year 1.
        ensure!(
            time.timestamp() > 0,
            "time must be set (ticker={ticker}, got {time})"
        );

        Ok(RatingEvent {
            ticker,
            company,
            brokerage: self.brokerage.trim().to_string(),
            action: self.action.trim().to_string(),
            rating_from: self.rating_from.trim().to_string(),
            rating_to: self.rating_to.trim().to_string(),
            target_from: self.target_from.trim().to_string(),
            target_to: self.target_to.trim().to_string(),
            time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn item(v: serde_json::Value) -> FeedRatingItem {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn accepts_complete_item_and_normalizes_ticker() {
        let time = Utc.with_ymd_and_hms(2025, 3, 4, 14, 30, 0).unwrap();
        let event = item(json!({
            "ticker": " aapl ",
            "company": "Apple Inc.",
            "brokerage": "Goldman Sachs",
            "action": "initiated by",
            "rating_from": "Hold",
            "rating_to": "Strong Buy",
            "target_from": "$150.00",
            "target_to": "$180.00",
            "time": time,
        }))
        .validate_and_into_event()
        .unwrap();

        assert_eq!(event.ticker, "AAPL");
        assert_eq!(event.company, "Apple Inc.");
        assert_eq!(event.target_to, "$180.00");
        assert_eq!(event.time, time);
    }

    #[test]
    fn optional_fields_default_to_empty() {
        let event = item(json!({
            "ticker": "TSLA",
            "company": "Tesla Inc.",
            "time": "2025-03-04T14:30:00Z",
        }))
        .validate_and_into_event()
        .unwrap();

        assert!(event.rating_from.is_empty());
        assert!(event.brokerage.is_empty());
        assert!(event.target_from.is_empty());
    }

    #[test]
    fn rejects_missing_ticker_or_company() {
        let no_ticker = item(json!({
            "company": "Apple Inc.",
            "time": "2025-03-04T14:30:00Z",
        }));
        assert!(no_ticker.validate_and_into_event().is_err());

        let no_company = item(json!({
            "ticker": "AAPL",
            "company": "   ",
            "time": "2025-03-04T14:30:00Z",
        }));
        assert!(no_company.validate_and_into_event().is_err());
    }

    #[test]
    fn rejects_zero_or_missing_time() {
        let zero = item(json!({
            "ticker": "AAPL",
            "company": "Apple Inc.",
            "time": "0001-01-01T00:00:00Z",
        }));
        assert!(zero.validate_and_into_event().is_err());

        let missing = item(json!({
            "ticker": "AAPL",
            "company": "Apple Inc.",
        }));
        assert!(missing.validate_and_into_event().is_err());
    }
}
