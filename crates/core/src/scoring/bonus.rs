use crate::domain::rating_event::RatingEvent;
use crate::scoring::config::ScoringConfig;
use crate::scoring::{join_reasons, signed, SubScore};
use chrono::{DateTime, Utc};

/// Lower-cased action verbs and the adjustment each earns.
pub const ACTION_BONUSES: &[(&[&str], f64, &str)] = &[
    (&["initiates", "initiated"], 2.0, "New coverage"),
    (&["reiterates", "reiterated"], 1.0, "Reaffirmed position"),
    (&["raises", "raised"], 1.5, "Raised expectations"),
    (&["lowers", "lowered"], -1.5, "Lowered expectations"),
];

const HIGH_PROFILE_BONUS: f64 = 1.0;

/// Discrete adjustments added to the composite unweighted.
///
/// `now` is not consulted by the current rules.
pub fn score_bonus(event: &RatingEvent, config: &ScoringConfig, _now: DateTime<Utc>) -> SubScore {
    let mut total = 0.0;
    let mut reasons: Vec<String> = Vec::new();

    let action = event.action.trim().to_lowercase();
    if let Some((_, bonus, label)) = ACTION_BONUSES
        .iter()
        .find(|(verbs, _, _)| verbs.contains(&action.as_str()))
    {
        total += bonus;
        reasons.push(format!("{label} ({})", signed(*bonus)));
    }

    let company = event.company.to_lowercase();
    if config
        .high_profile_keywords
        .iter()
        .any(|k| company.contains(&k.to_lowercase()))
    {
        total += HIGH_PROFILE_BONUS;
        reasons.push(format!("High-profile company ({})", signed(HIGH_PROFILE_BONUS)));
    }

    SubScore::new(total, join_reasons(reasons))
}
