//! Multi-factor scoring of analyst rating events.
//!
//! Each sub-scorer maps one aspect of an event to a raw score plus a reason
//! fragment; [`ranking::Recommender`] weights and combines them.

pub mod bonus;
pub mod brokerage;
pub mod config;
pub mod consensus;
pub mod price;
pub mod ranking;
pub mod rating;
pub mod target;
pub mod temporal;

pub use config::{ComponentWeights, ScoringConfig};
pub use ranking::{rank, Recommender, TickerIndex};

/// Raw score contributed by one sub-scorer, with its audit fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct SubScore {
    pub score: f64,
    pub reason: String,
}

impl SubScore {
    pub fn new(score: f64, reason: impl Into<String>) -> Self {
        Self {
            score,
            reason: reason.into(),
        }
    }

    /// Adds an adjustment and appends its fragment to the reason.
    pub(crate) fn adjust(&mut self, delta: f64, reason: &str) {
        self.score += delta;
        self.reason = join_reasons([self.reason.as_str(), reason]);
    }
}

/// Formats a score with an explicit sign and one decimal, e.g. `+7.5` / `-1.5`.
pub(crate) fn signed(v: f64) -> String {
    format!("{v:+.1}")
}

pub(crate) fn join_reasons<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for part in parts {
        let part = part.as_ref();
        if part.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push_str("; ");
        }
        out.push_str(part);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_always_carries_a_sign() {
        assert_eq!(signed(7.5), "+7.5");
        assert_eq!(signed(-1.5), "-1.5");
        assert_eq!(signed(0.0), "+0.0");
    }

    #[test]
    fn join_reasons_skips_empty_fragments() {
        assert_eq!(join_reasons(["a", "", "b"]), "a; b");
        assert_eq!(join_reasons(Vec::<String>::new()), "");
    }

    #[test]
    fn adjust_accumulates_score_and_reason() {
        let mut s = SubScore::new(2.0, "Base (+2.0)");
        s.adjust(1.0, "Bonus (+1.0)");
        assert_eq!(s.score, 3.0);
        assert_eq!(s.reason, "Base (+2.0); Bonus (+1.0)");

        let mut e = SubScore::new(0.0, "");
        e.adjust(-1.5, "Penalty (-1.5)");
        assert_eq!(e.reason, "Penalty (-1.5)");
    }
}
