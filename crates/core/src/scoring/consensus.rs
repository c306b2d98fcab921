use crate::domain::rating_event::RatingEvent;
use crate::scoring::rating::{sentiment_of, Sentiment};
use crate::scoring::{signed, SubScore};

/// `(min positive ratio, score, label)`, checked top-down.
const CONSENSUS_BUCKETS: &[(f64, f64, &str)] = &[
    (0.8, 5.0, "Strong consensus"),
    (0.6, 3.0, "Good consensus"),
    (0.4, 1.0, "Mixed consensus"),
    (0.2, -1.0, "Negative consensus"),
];
const BELOW_ALL_BUCKETS: (f64, &str) = (-3.0, "Very negative consensus");
const SINGLE_ANALYSIS_SCORE: f64 = 1.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SentimentCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl SentimentCounts {
    pub fn tally<'a>(group: impl IntoIterator<Item = &'a RatingEvent>) -> Self {
        let mut out = Self::default();
        for event in group {
            match sentiment_of(&event.rating_to) {
                Sentiment::Positive => out.positive += 1,
                Sentiment::Negative => out.negative += 1,
                Sentiment::Neutral => out.neutral += 1,
            }
        }
        out
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }
}

/// Scores agreement among every event sharing a ticker. `group` is read, never modified.
pub fn score_consensus(group: &[&RatingEvent]) -> SubScore {
    if group.len() <= 1 {
        return SubScore::new(
            SINGLE_ANALYSIS_SCORE,
            format!("Single analysis ({})", signed(SINGLE_ANALYSIS_SCORE)),
        );
    }

    let counts = SentimentCounts::tally(group.iter().copied());
    let total = counts.total();
    let ratio = counts.positive as f64 / total as f64;

    let (score, label) = CONSENSUS_BUCKETS
        .iter()
        .find(|(min_ratio, _, _)| ratio >= *min_ratio)
        .map(|(_, score, label)| (*score, *label))
        .unwrap_or(BELOW_ALL_BUCKETS);

    SubScore::new(
        score,
        format!(
            "{label} ({}/{total} positive, {})",
            counts.positive,
            signed(score)
        ),
    )
}
