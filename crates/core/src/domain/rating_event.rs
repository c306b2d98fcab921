use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One analyst action on a ticker, as published by the ratings feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingEvent {
    pub ticker: String,
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
    pub time: DateTime<Utc>,
}

/// A persisted rating event. The identity columns are never read by the scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRatingEvent {
    pub id: Uuid,
    #[serde(flatten)]
    pub event: RatingEvent,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredRatingEvent {
    pub fn into_event(self) -> RatingEvent {
        self.event
    }
}
