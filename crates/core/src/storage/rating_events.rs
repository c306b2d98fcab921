use crate::domain::rating_event::{RatingEvent, StoredRatingEvent};
use anyhow::Context;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const MAX_PAGE_SIZE: i64 = 1000;

type EventRow = (
    Uuid,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
    DateTime<Utc>,
);

const SELECT_COLUMNS: &str = "SELECT id, ticker, company, brokerage, action, rating_from, rating_to, \
     target_from, target_to, time, created_at, updated_at FROM rating_events";

/// Validated paging and search parameters for listing stored events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub page: i64,
    pub page_size: i64,
    pub search: Option<String>,
}

impl EventQuery {
    pub fn new(page: i64, page_size: i64, search: Option<String>) -> anyhow::Result<Self> {
        anyhow::ensure!(page >= 1, "page must be >= 1 (got {page})");
        anyhow::ensure!(
            (1..=MAX_PAGE_SIZE).contains(&page_size),
            "page_size must be 1..={MAX_PAGE_SIZE} (got {page_size})"
        );

        let search = search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            page,
            page_size,
            search,
        })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }

    /// `LIKE` pattern matching the search term anywhere, case-insensitively.
    fn like_pattern(&self) -> Option<String> {
        self.search.as_ref().map(|s| {
            let escaped = s
                .to_lowercase()
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{escaped}%")
        })
    }
}

pub fn total_pages(total: i64, page_size: i64) -> i64 {
    if total <= 0 || page_size <= 0 {
        return 0;
    }
    (total + page_size - 1) / page_size
}

pub async fn insert_events_atomic(
    pool: &sqlx::PgPool,
    events: &[RatingEvent],
) -> anyhow::Result<u64> {
    if events.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await.context("begin transaction failed")?;

    let chunk_size: usize = std::env::var("RATING_EVENTS_INSERT_BATCH")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(200);
    anyhow::ensure!(chunk_size >= 1, "RATING_EVENTS_INSERT_BATCH must be >= 1");

    let mut inserted: u64 = 0;
    for (batch_idx, chunk) in events.chunks(chunk_size).enumerate() {
        let t0 = std::time::Instant::now();
        let mut qb = sqlx::QueryBuilder::new(
            "INSERT INTO rating_events \
             (ticker, company, brokerage, action, rating_from, rating_to, target_from, target_to, time) ",
        );
        qb.push_values(chunk, |mut b, event| {
            b.push_bind(&event.ticker)
                .push_bind(&event.company)
                .push_bind(&event.brokerage)
                .push_bind(&event.action)
                .push_bind(&event.rating_from)
                .push_bind(&event.rating_to)
                .push_bind(&event.target_from)
                .push_bind(&event.target_to)
                .push_bind(event.time);
        });
        qb.push(
            " ON CONFLICT (ticker, brokerage, action, rating_to, target_to, time) DO NOTHING",
        );

        let res = qb
            .build()
            .persistent(false)
            .execute(&mut *tx)
            .await
            .context("batch insert rating_events failed")?;
        inserted += res.rows_affected();

        tracing::debug!(
            batch_idx,
            batch_size = chunk.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "rating_events batch insert"
        );
    }

    tx.commit().await.context("commit transaction failed")?;
    Ok(inserted)
}

/// Returns one page of stored events, newest first, plus the total matching count.
pub async fn list_events(
    pool: &sqlx::PgPool,
    query: &EventQuery,
) -> anyhow::Result<(Vec<StoredRatingEvent>, i64)> {
    let pattern = query.like_pattern();

    let (rows, total) = match &pattern {
        Some(like) => {
            let filter = " WHERE LOWER(ticker) LIKE $1 OR LOWER(company) LIKE $1 OR LOWER(brokerage) LIKE $1";
            let total: i64 =
                sqlx::query_scalar(&format!("SELECT COUNT(*) FROM rating_events{filter}"))
                    .bind(like)
                    .fetch_one(pool)
                    .await
                    .context("count rating_events failed")?;
            let rows = sqlx::query_as::<_, EventRow>(&format!(
                "{SELECT_COLUMNS}{filter} ORDER BY time DESC, id ASC LIMIT $2 OFFSET $3"
            ))
            .bind(like)
            .bind(query.page_size)
            .bind(query.offset())
            .fetch_all(pool)
            .await
            .context("select rating_events page failed")?;
            (rows, total)
        }
        None => {
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rating_events")
                .fetch_one(pool)
                .await
                .context("count rating_events failed")?;
            let rows = sqlx::query_as::<_, EventRow>(&format!(
                "{SELECT_COLUMNS} ORDER BY time DESC, id ASC LIMIT $1 OFFSET $2"
            ))
            .bind(query.page_size)
            .bind(query.offset())
            .fetch_all(pool)
            .await
            .context("select rating_events page failed")?;
            (rows, total)
        }
    };

    Ok((rows.into_iter().map(from_row).collect(), total))
}

/// Every stored event, the snapshot the ranking engine runs over.
pub async fn load_all_events(pool: &sqlx::PgPool) -> anyhow::Result<Vec<RatingEvent>> {
    let rows = sqlx::query_as::<_, EventRow>(&format!("{SELECT_COLUMNS} ORDER BY time DESC, id ASC"))
        .fetch_all(pool)
        .await
        .context("select all rating_events failed")?;

    Ok(rows
        .into_iter()
        .map(|row| from_row(row).into_event())
        .collect())
}

fn from_row(row: EventRow) -> StoredRatingEvent {
    let (
        id,
        ticker,
        company,
        brokerage,
        action,
        rating_from,
        rating_to,
        target_from,
        target_to,
        time,
        created_at,
        updated_at,
    ) = row;

    StoredRatingEvent {
        id,
        event: RatingEvent {
            ticker,
            company,
            brokerage,
            action,
            rating_from,
            rating_to,
            target_from,
            target_to,
            time,
        },
        created_at,
        updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(100, 10), 10);
        assert_eq!(total_pages(105, 10), 11);
        assert_eq!(total_pages(5, 10), 1);
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(1_000_000, 50), 20_000);
    }

    #[test]
    fn query_validates_paging() {
        assert!(EventQuery::new(1, 10, None).is_ok());
        assert!(EventQuery::new(100, 50, None).is_ok());
        assert!(EventQuery::new(1, 1000, None).is_ok());
        assert!(EventQuery::new(0, 10, None).is_err());
        assert!(EventQuery::new(-1, 10, None).is_err());
        assert!(EventQuery::new(1, 0, None).is_err());
        assert!(EventQuery::new(1, -5, None).is_err());
        assert!(EventQuery::new(1, 10_000, None).is_err());
    }

    #[test]
    fn query_offset_and_search_normalization() {
        let q = EventQuery::new(3, 20, Some("  MSFT ".to_string())).unwrap();
        assert_eq!(q.offset(), 40);
        assert_eq!(q.search.as_deref(), Some("MSFT"));
        assert_eq!(q.like_pattern().as_deref(), Some("%msft%"));

        let blank = EventQuery::new(1, 10, Some("   ".to_string())).unwrap();
        assert_eq!(blank.search, None);
        assert_eq!(blank.like_pattern(), None);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        let q = EventQuery::new(1, 10, Some("50%_off".to_string())).unwrap();
        assert_eq!(q.like_pattern().as_deref(), Some("%50\\%\\_off%"));
    }
}
