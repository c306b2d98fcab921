use anyhow::Context;
use chrono::{DateTime, Utc};
use equisignal_core::domain::rating_event::RatingEvent;
use std::path::Path;

/// Reference time for a ranking run: the `--now` override, or `fallback`.
pub fn resolve_now(now_arg: Option<&str>, fallback: DateTime<Utc>) -> anyhow::Result<DateTime<Utc>> {
    match now_arg {
        Some(s) => Ok(DateTime::parse_from_rfc3339(s.trim())
            .with_context(|| format!("--now must be RFC 3339 (got {s})"))?
            .with_timezone(&Utc)),
        None => Ok(fallback),
    }
}

pub fn load_events_file(path: &Path) -> anyhow::Result<Vec<RatingEvent>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read events file {}", path.display()))?;
    parse_events(&text).with_context(|| format!("invalid events file {}", path.display()))
}

fn parse_events(text: &str) -> anyhow::Result<Vec<RatingEvent>> {
    let events: Vec<RatingEvent> =
        serde_json::from_str(text).context("events file must be a JSON array of rating events")?;
    for (idx, event) in events.iter().enumerate() {
        anyhow::ensure!(!event.ticker.trim().is_empty(), "event #{idx}: ticker must be non-empty");
        anyhow::ensure!(!event.company.trim().is_empty(), "event #{idx}: company must be non-empty");
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn now_override_is_normalized_to_utc() {
        let fallback = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let now = resolve_now(Some("2025-03-05T11:00:00-05:00"), fallback).unwrap();
        assert_eq!(now, Utc.with_ymd_and_hms(2025, 3, 5, 16, 0, 0).unwrap());
        assert_eq!(resolve_now(None, fallback).unwrap(), fallback);
        assert!(resolve_now(Some("yesterday"), fallback).is_err());
    }

    #[test]
    fn parses_event_array_with_optional_fields() {
        let text = json!([
            {
                "ticker": "AAPL",
                "company": "Apple Inc.",
                "brokerage": "Goldman Sachs",
                "action": "Initiates",
                "rating_from": "Hold",
                "rating_to": "Strong Buy",
                "target_from": "$150.00",
                "target_to": "$180.00",
                "time": "2025-03-05T14:00:00Z"
            },
            {
                "ticker": "MSFT",
                "company": "Microsoft Corporation",
                "time": "2025-03-04T14:00:00Z"
            }
        ])
        .to_string();

        let events = parse_events(&text).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[1].rating_to.is_empty());
    }

    #[test]
    fn rejects_blank_ticker() {
        let text = json!([{ "ticker": " ", "company": "X", "time": "2025-03-05T14:00:00Z" }]).to_string();
        assert!(parse_events(&text).is_err());
    }
}
