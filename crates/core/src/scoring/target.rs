use crate::domain::rating_event::RatingEvent;
use crate::scoring::price::parse_price;
use crate::scoring::{signed, SubScore};

/// `(lower bound in percent, score, label)`, checked top-down.
const TARGET_BUCKETS: &[(f64, f64, &str)] = &[
    (20.0, 8.0, "Major target increase"),
    (10.0, 6.0, "Strong target increase"),
    (5.0, 4.0, "Moderate target increase"),
    (0.0, 2.0, "Small target increase"),
    (-5.0, -2.0, "Minor target decrease"),
    (-10.0, -4.0, "Moderate target decrease"),
    (-20.0, -6.0, "Strong target decrease"),
];
const BELOW_ALL_BUCKETS: (f64, &str) = (-8.0, "Major target decrease");

const NO_DATA_SCORE: f64 = 2.0;
const INVALID_DATA_SCORE: f64 = 1.0;
const HIGH_TARGET_THRESHOLD: f64 = 100.0;
const HIGH_TARGET_BONUS: f64 = 1.0;

pub fn score_target(event: &RatingEvent) -> SubScore {
    if event.target_from.is_empty() || event.target_to.is_empty() {
        return SubScore::new(
            NO_DATA_SCORE,
            format!("No target data ({})", signed(NO_DATA_SCORE)),
        );
    }

    let from = parse_price(&event.target_from);
    let to = parse_price(&event.target_to);
    if from == 0.0 || to == 0.0 {
        return SubScore::new(
            INVALID_DATA_SCORE,
            format!("Invalid target data ({})", signed(INVALID_DATA_SCORE)),
        );
    }

    let pct = (to - from) / from * 100.0;
    let (score, label) = TARGET_BUCKETS
        .iter()
        .find(|(lower, _, _)| pct >= *lower)
        .map(|(_, score, label)| (*score, *label))
        .unwrap_or(BELOW_ALL_BUCKETS);

    let mut out = SubScore::new(score, format!("{label} ({pct:+.1}%, {})", signed(score)));
    if to > HIGH_TARGET_THRESHOLD {
        out.adjust(
            HIGH_TARGET_BONUS,
            &format!("High target confidence ({})", signed(HIGH_TARGET_BONUS)),
        );
    }
    out
}
