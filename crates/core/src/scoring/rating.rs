use crate::domain::rating_event::RatingEvent;
use crate::scoring::{signed, SubScore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingTier {
    StrongBuy,
    Buy,
    Hold,
    Underperform,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// Normalized (lower-case, trimmed) rating labels and the tier each maps to.
pub const RATING_LABELS: &[(&str, RatingTier)] = &[
    ("strong buy", RatingTier::StrongBuy),
    ("outperform", RatingTier::StrongBuy),
    ("overweight", RatingTier::StrongBuy),
    ("buy", RatingTier::Buy),
    ("positive", RatingTier::Buy),
    ("hold", RatingTier::Hold),
    ("neutral", RatingTier::Hold),
    ("market perform", RatingTier::Hold),
    ("underweight", RatingTier::Underperform),
    ("underperform", RatingTier::Underperform),
    ("sell", RatingTier::Sell),
    ("strong sell", RatingTier::Sell),
];

const UNKNOWN_RATING_SCORE: f64 = 2.0;
const NEUTRAL_RANK: f64 = 3.0;
const UPGRADE_STEP: f64 = 2.5;
const DOWNGRADE_STEP: f64 = 1.5;

impl RatingTier {
    pub fn classify(label: &str) -> Option<Self> {
        let normalized = label.trim().to_lowercase();
        RATING_LABELS
            .iter()
            .find(|(l, _)| *l == normalized)
            .map(|(_, tier)| *tier)
    }

    pub fn base_score(self) -> f64 {
        match self {
            Self::StrongBuy => 10.0,
            Self::Buy => 7.5,
            Self::Hold => 3.0,
            Self::Underperform => -5.0,
            Self::Sell => -10.0,
        }
    }

    /// Position on the 1 (sell) ..= 5 (strong buy) ladder.
    pub fn rank(self) -> f64 {
        match self {
            Self::StrongBuy => 5.0,
            Self::Buy => 4.0,
            Self::Hold => 3.0,
            Self::Underperform => 2.0,
            Self::Sell => 1.0,
        }
    }

    pub fn display(self) -> &'static str {
        match self {
            Self::StrongBuy => "Strong Buy",
            Self::Buy => "Buy",
            Self::Hold => "Hold",
            Self::Underperform => "Underperform",
            Self::Sell => "Sell",
        }
    }

    pub fn sentiment(self) -> Sentiment {
        match self {
            Self::StrongBuy | Self::Buy => Sentiment::Positive,
            Self::Hold => Sentiment::Neutral,
            Self::Underperform | Self::Sell => Sentiment::Negative,
        }
    }
}

/// Sentiment of a raw label; unrecognized labels are neutral.
pub fn sentiment_of(label: &str) -> Sentiment {
    RatingTier::classify(label)
        .map(RatingTier::sentiment)
        .unwrap_or(Sentiment::Neutral)
}

fn rank_of(label: &str) -> f64 {
    RatingTier::classify(label)
        .map(RatingTier::rank)
        .unwrap_or(NEUTRAL_RANK)
}

pub fn score_rating(event: &RatingEvent) -> SubScore {
    let mut out = match RatingTier::classify(&event.rating_to) {
        Some(tier) => SubScore::new(
            tier.base_score(),
            format!("{} rating ({})", tier.display(), signed(tier.base_score())),
        ),
        None => SubScore::new(
            UNKNOWN_RATING_SCORE,
            format!("Unknown rating ({})", signed(UNKNOWN_RATING_SCORE)),
        ),
    };

    if event.rating_from.is_empty() || event.rating_to.is_empty() {
        return out;
    }

    let from = rank_of(&event.rating_from);
    let to = rank_of(&event.rating_to);
    if to > from {
        let bonus = (to - from) * UPGRADE_STEP;
        out.adjust(bonus, &format!("Upgrade bonus ({})", signed(bonus)));
    } else if to < from {
        let penalty = (from - to) * DOWNGRADE_STEP;
        out.adjust(-penalty, &format!("Downgrade penalty ({})", signed(-penalty)));
    }

    out
}
