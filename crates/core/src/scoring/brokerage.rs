use crate::domain::rating_event::RatingEvent;
use crate::scoring::config::ScoringConfig;
use crate::scoring::{signed, SubScore};

const CREDIBILITY_SCALE: f64 = 5.0;

pub fn score_brokerage(event: &RatingEvent, config: &ScoringConfig) -> SubScore {
    let weight = config.brokerage_weight(&event.brokerage);
    let score = weight * CREDIBILITY_SCALE;

    SubScore::new(
        score,
        format!(
            "{} credibility ({weight:.1}x, {})",
            event.brokerage,
            signed(score)
        ),
    )
}
