use crate::domain::rating_event::RatingEvent;
use crate::scoring::{signed, SubScore};
use chrono::{DateTime, Datelike, Utc, Weekday};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// `(max elapsed days, score, label, window)`, checked top-down.
const RECENCY_BUCKETS: &[(f64, f64, &str, &str)] = &[
    (1.0, 6.0, "Breaking news", "<1 day"),
    (3.0, 5.0, "Very recent", "1-3 days"),
    (7.0, 4.0, "Recent", "3-7 days"),
    (14.0, 3.0, "Current", "1-2 weeks"),
    (30.0, 1.5, "Relevant", "2-4 weeks"),
    (60.0, 0.5, "Aging", "1-2 months"),
];
const STALE_SCORE: f64 = -1.0;
const MARKET_TIMING_BONUS: f64 = 0.5;

/// Fractional days between the event and `now`; negative for future-dated events.
pub fn elapsed_days(time: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - time).num_milliseconds() as f64 / MILLIS_PER_DAY
}

pub fn score_temporal(event: &RatingEvent, now: DateTime<Utc>) -> SubScore {
    let days = elapsed_days(event.time, now);
    if days < 0.0 {
        tracing::debug!(ticker = %event.ticker, time = %event.time, %now, "rating event is dated in the future");
    }

    let mut out = RECENCY_BUCKETS
        .iter()
        .find(|(max_days, _, _, _)| days <= *max_days)
        .map(|(_, score, label, window)| {
            SubScore::new(*score, format!("{label} ({window}, {})", signed(*score)))
        })
        .unwrap_or_else(|| {
            SubScore::new(
                STALE_SCORE,
                format!("Stale ({days:.0} days, {})", signed(STALE_SCORE)),
            )
        });

    if is_trading_weekday(event.time) {
        out.adjust(
            MARKET_TIMING_BONUS,
            &format!("Market timing ({})", signed(MARKET_TIMING_BONUS)),
        );
    }

    out
}

fn is_trading_weekday(time: DateTime<Utc>) -> bool {
    !matches!(time.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    // 2025-03-05 is a Wednesday.
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 5, 16, 0, 0).unwrap()
    }

    fn event_at(time: DateTime<Utc>) -> RatingEvent {
        RatingEvent {
            ticker: "NVDA".to_string(),
            company: "NVIDIA Corporation".to_string(),
            brokerage: String::new(),
            action: String::new(),
            rating_from: String::new(),
            rating_to: String::new(),
            target_from: String::new(),
            target_to: String::new(),
            time,
        }
    }

    #[test]
    fn fresh_weekday_event_gets_top_bucket_and_timing_bonus() {
        let s = score_temporal(&event_at(now() - Duration::hours(2)), now());
        assert_eq!(s.score, 6.5);
        assert_eq!(s.reason, "Breaking news (<1 day, +6.0); Market timing (+0.5)");
    }

    #[test]
    fn weekend_event_gets_no_timing_bonus() {
        // Sunday 2025-03-02, three days before now.
        let sunday = Utc.with_ymd_and_hms(2025, 3, 2, 16, 0, 0).unwrap();
        let s = score_temporal(&event_at(sunday), now());
        assert_eq!(s.score, 5.0);
        assert_eq!(s.reason, "Very recent (1-3 days, +5.0)");
    }

    #[test]
    fn bucket_upper_bounds_are_inclusive() {
        let cases = [(1, 6.5), (7, 4.5), (14, 3.5), (30, 2.0), (60, 1.0)];
        for (days, expected) in cases {
            let time = now() - Duration::days(days);
            let bonus = if is_trading_weekday(time) { 0.0 } else { -0.5 };
            let s = score_temporal(&event_at(time), now());
            assert_eq!(s.score, expected + bonus, "{days} days");
        }
    }

    #[test]
    fn old_event_is_stale_and_negative() {
        let time = now() - Duration::days(61);
        let s = score_temporal(&event_at(time), now());
        assert!(s.score < 0.0);
        assert!(s.reason.starts_with("Stale (61 days, -1.0)"));
    }

    #[test]
    fn future_event_falls_in_first_bucket() {
        let s = score_temporal(&event_at(now() + Duration::days(2)), now());
        assert!(s.reason.starts_with("Breaking news"));
    }

    #[test]
    fn epoch_timestamp_reports_large_day_count() {
        let epoch = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        let s = score_temporal(&event_at(epoch), now());
        // 1970-01-01 was a Thursday.
        assert_eq!(s.score, -0.5);
        assert!(s.reason.starts_with("Stale (20153 days"));
    }
}
