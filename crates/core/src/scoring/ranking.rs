use crate::domain::rating_event::RatingEvent;
use crate::domain::recommendation::{ScoreBreakdown, ScoredRecommendation};
use crate::scoring::bonus::score_bonus;
use crate::scoring::brokerage::score_brokerage;
use crate::scoring::config::ScoringConfig;
use crate::scoring::consensus::score_consensus;
use crate::scoring::join_reasons;
use crate::scoring::rating::score_rating;
use crate::scoring::target::score_target;
use crate::scoring::temporal::score_temporal;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// Events grouped by ticker. Built once per ranking pass and only read afterwards.
#[derive(Debug, Default)]
pub struct TickerIndex<'a> {
    groups: HashMap<&'a str, Vec<&'a RatingEvent>>,
}

impl<'a> TickerIndex<'a> {
    pub fn build(events: &'a [RatingEvent]) -> Self {
        let mut groups: HashMap<&'a str, Vec<&'a RatingEvent>> = HashMap::new();
        for event in events {
            groups.entry(event.ticker.as_str()).or_default().push(event);
        }
        Self { groups }
    }

    pub fn group(&self, ticker: &str) -> &[&'a RatingEvent] {
        self.groups.get(ticker).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn ticker_count(&self) -> usize {
        self.groups.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Recommender {
    config: ScoringConfig,
}

impl Recommender {
    pub fn try_new(config: ScoringConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Scores every event, keeps the best one per ticker and returns at most `limit`
    /// recommendations ordered by score, then recency.
    ///
    /// A non-positive `limit` yields an empty result.
    pub fn rank(
        &self,
        events: &[RatingEvent],
        limit: i64,
        now: DateTime<Utc>,
    ) -> Vec<ScoredRecommendation> {
        let limit = match usize::try_from(limit) {
            Ok(n) if n > 0 => n,
            _ => return Vec::new(),
        };

        let index = TickerIndex::build(events);
        let mut scored: Vec<ScoredRecommendation> = events
            .par_iter()
            .map(|event| self.score_event(event, &index, now))
            .collect();

        sort_recommendations(&mut scored);
        let mut out = dedup_by_ticker(scored);
        out.truncate(limit);

        tracing::debug!(
            events = events.len(),
            tickers = index.ticker_count(),
            limit,
            returned = out.len(),
            "ranked rating events"
        );
        out
    }

    pub fn score_event(
        &self,
        event: &RatingEvent,
        index: &TickerIndex<'_>,
        now: DateTime<Utc>,
    ) -> ScoredRecommendation {
        let w = &self.config.weights;

        let rating = score_rating(event);
        let target = score_target(event);
        let temporal = score_temporal(event, now);
        let brokerage = score_brokerage(event, &self.config);
        let consensus = score_consensus(index.group(&event.ticker));
        let bonus = score_bonus(event, &self.config, now);

        let composite = rating.score * w.rating
            + target.score * w.target
            + temporal.score * w.temporal
            + brokerage.score * w.brokerage
            + consensus.score * w.consensus
            + bonus.score;

        let breakdown = ScoreBreakdown {
            rating: rating.score,
            target: target.score,
            temporal: temporal.score,
            brokerage: brokerage.score,
            consensus: consensus.score,
            bonus: bonus.score,
            composite,
        };

        ScoredRecommendation {
            ticker: event.ticker.clone(),
            company: event.company.clone(),
            score: (composite * 10.0).round() as i64,
            reason: join_reasons([
                rating.reason,
                target.reason,
                temporal.reason,
                brokerage.reason,
                consensus.reason,
                bonus.reason,
            ]),
            rating: event.rating_to.clone(),
            target_from: event.target_from.clone(),
            target_to: event.target_to.clone(),
            time: event.time,
            breakdown,
        }
    }
}

/// Ranks with the default scoring tables.
pub fn rank(events: &[RatingEvent], limit: i64, now: DateTime<Utc>) -> Vec<ScoredRecommendation> {
    Recommender::default().rank(events, limit, now)
}

fn sort_recommendations(recs: &mut [ScoredRecommendation]) {
    recs.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.time.cmp(&a.time))
            .then_with(|| a.ticker.cmp(&b.ticker))
    });
}

/// Keeps the first entry per ticker; on sorted input that is the best one.
fn dedup_by_ticker(sorted: Vec<ScoredRecommendation>) -> Vec<ScoredRecommendation> {
    let mut seen = HashSet::new();
    sorted
        .into_iter()
        .filter(|rec| seen.insert(rec.ticker.clone()))
        .collect()
}
