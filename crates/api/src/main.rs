use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use equisignal_core::config::Settings;
use equisignal_core::domain::rating_event::StoredRatingEvent;
use equisignal_core::domain::recommendation::ScoredRecommendation;
use equisignal_core::ingest::error::ProviderHttpError;
use equisignal_core::ingest::provider::HttpJsonRatingsProvider;
use equisignal_core::scoring::{Recommender, ScoringConfig};
use equisignal_core::storage::rating_events::{self, EventQuery};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_PAGE_SIZE: i64 = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let recommender = Recommender::try_new(ScoringConfig::from_env()?)?;

    let pool: Option<PgPool> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match equisignal_core::storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            None
        }
    };

    let cors = cors_layer(settings.frontend_url.as_deref());
    let state = AppState {
        pool,
        recommender: Arc::new(recommender),
        settings: Arc::new(settings),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/stocks", get(list_stocks))
        .route("/api/stocks/recommend", get(recommend_stocks))
        .route(
            "/api/external/update-stocks",
            get(update_stocks).post(update_stocks),
        )
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Clone)]
struct AppState {
    pool: Option<PgPool>,
    recommender: Arc<Recommender>,
    settings: Arc<Settings>,
}

#[derive(Debug, Default, Deserialize)]
struct StocksParams {
    page: Option<i64>,
    #[serde(alias = "pageSize")]
    page_size: Option<i64>,
    search: Option<String>,
}

impl StocksParams {
    fn into_query(self) -> anyhow::Result<EventQuery> {
        EventQuery::new(
            self.page.unwrap_or(DEFAULT_PAGE),
            self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            self.search,
        )
    }
}

#[derive(Debug, Serialize)]
struct StocksPage {
    data: Vec<StoredRatingEvent>,
    total: i64,
    page: i64,
    #[serde(rename = "pageSize")]
    page_size: i64,
    total_pages: i64,
}

async fn list_stocks(
    State(state): State<AppState>,
    Query(params): Query<StocksParams>,
) -> Result<Json<StocksPage>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let query = params.into_query().map_err(|e| {
        tracing::debug!(error = %e, "rejected stocks query");
        StatusCode::BAD_REQUEST
    })?;

    let (data, total) = rating_events::list_events(pool, &query)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(StocksPage {
        data,
        total,
        page: query.page,
        page_size: query.page_size,
        total_pages: rating_events::total_pages(total, query.page_size),
    }))
}

#[derive(Debug, Default, Deserialize)]
struct RecommendParams {
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
struct RecommendResponse {
    generated_at: DateTime<Utc>,
    limit: i64,
    data: Vec<ScoredRecommendation>,
}

async fn recommend_stocks(
    State(state): State<AppState>,
    Query(params): Query<RecommendParams>,
) -> Result<Json<RecommendResponse>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let limit = params
        .limit
        .unwrap_or(state.settings.recommend_default_limit);

    let events = rating_events::load_all_events(pool).await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let now = Utc::now();
    let recommender = state.recommender.clone();
    let data = tokio::task::spawn_blocking(move || recommender.rank(&events, limit, now))
        .await
        .map_err(|e| {
            let err = anyhow::Error::new(e).context("ranking task failed");
            sentry_anyhow::capture_anyhow(&err);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(RecommendResponse {
        generated_at: now,
        limit,
        data,
    }))
}

#[derive(Debug, Serialize)]
struct SyncResponse {
    pages: usize,
    fetched: usize,
    skipped: usize,
    inserted: u64,
}

async fn update_stocks(State(state): State<AppState>) -> Result<Json<SyncResponse>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let provider = HttpJsonRatingsProvider::from_settings(&state.settings).map_err(|e| {
        tracing::error!(error = %e, "ratings provider not configured");
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    let summary = equisignal_core::ingest::fetch_all_events(&provider)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            let upstream_status = e.downcast_ref::<ProviderHttpError>().map(|h| h.status);
            tracing::error!(error = %e, ?upstream_status, "ratings sync failed");
            sync_failure_status(&e)
        })?;

    let inserted = rating_events::insert_events_atomic(pool, &summary.events)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    tracing::info!(
        pages = summary.pages,
        fetched = summary.events.len(),
        skipped = summary.skipped,
        inserted,
        "ratings sync finished"
    );

    Ok(Json(SyncResponse {
        pages: summary.pages,
        fetched: summary.events.len(),
        skipped: summary.skipped,
        inserted,
    }))
}

/// Upstream rate limiting is passed through so callers know to back off;
/// every other feed failure is a bad gateway.
fn sync_failure_status(err: &anyhow::Error) -> StatusCode {
    match err.downcast_ref::<ProviderHttpError>() {
        Some(http) if http.status == 429 => StatusCode::TOO_MANY_REQUESTS,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn cors_layer(frontend_url: Option<&str>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([header::CONTENT_LENGTH])
        .max_age(Duration::from_secs(12 * 3600));

    match frontend_url
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| HeaderValue::from_str(s).ok())
    {
        Some(origin) => base.allow_origin(origin).allow_credentials(true),
        None => base,
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stocks_params_default_to_first_page() {
        let q = StocksParams::default().into_query().unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.page_size, 10);
        assert_eq!(q.search, None);
    }

    #[test]
    fn stocks_params_accept_camel_case_page_size() {
        let params: StocksParams =
            serde_json::from_value(serde_json::json!({"page": 2, "pageSize": 25})).unwrap();
        let q = params.into_query().unwrap();
        assert_eq!(q.page_size, 25);
        assert_eq!(q.offset(), 25);
    }

    #[test]
    fn stocks_page_serializes_camel_case_page_size() {
        let page = StocksPage {
            data: Vec::new(),
            total: 0,
            page: 1,
            page_size: 10,
            total_pages: 0,
        };
        let v = serde_json::to_value(&page).unwrap();
        assert_eq!(v["pageSize"], 10);
        assert_eq!(v["total_pages"], 0);
        assert!(v.get("page_size").is_none());
    }

    #[test]
    fn sync_failures_map_upstream_status() {
        let http = |status| -> anyhow::Error {
            ProviderHttpError {
                provider: "test",
                status,
                raw_body: String::new(),
            }
            .into()
        };
        assert_eq!(sync_failure_status(&http(429)), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(sync_failure_status(&http(401)), StatusCode::BAD_GATEWAY);
        assert_eq!(
            sync_failure_status(&anyhow::anyhow!("connection reset")),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn stocks_params_reject_oversized_pages() {
        let params = StocksParams {
            page: Some(1),
            page_size: Some(5000),
            search: None,
        };
        assert!(params.into_query().is_err());
    }
}
