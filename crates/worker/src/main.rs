use anyhow::Context;
use clap::{Parser, Subcommand};
use equisignal_core::ingest::error::ProviderHttpError;
use equisignal_core::ingest::provider::{HttpJsonRatingsProvider, RatingsProviderClient};
use equisignal_core::scoring::{Recommender, ScoringConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod snapshot;

#[derive(Debug, Parser)]
#[command(name = "equisignal_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Pull every page from the external ratings API and store new events.
    Sync {
        /// Fetch and validate, but do not write to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Rank stored (or file-provided) rating events and print the result as JSON.
    Recommend {
        /// Maximum number of recommendations. Defaults to RECOMMEND_DEFAULT_LIMIT.
        #[arg(long, allow_hyphen_values = true)]
        limit: Option<i64>,

        /// Reference time (RFC 3339). Defaults to the current time.
        #[arg(long)]
        now: Option<String>,

        /// JSON file with an array of rating events; skips the database.
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = equisignal_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let res = match args.command {
        Command::Sync { dry_run } => run_sync(&settings, dry_run).await,
        Command::Recommend { limit, now, input } => {
            run_recommend(&settings, limit, now.as_deref(), input).await
        }
    };

    if let Err(err) = &res {
        sentry_anyhow::capture_anyhow(err);
        match err.downcast_ref::<ProviderHttpError>() {
            Some(http) => tracing::error!(
                provider = http.provider,
                upstream_status = http.status,
                retryable = http.is_retryable(),
                body = %http.raw_body,
                "worker run failed: ratings provider rejected the request"
            ),
            None => tracing::error!(error = %err, "worker run failed"),
        }
    }
    res
}

async fn run_sync(
    settings: &equisignal_core::config::Settings,
    dry_run: bool,
) -> anyhow::Result<()> {
    let provider = HttpJsonRatingsProvider::from_settings(settings)?;
    let summary = equisignal_core::ingest::fetch_all_events(&provider).await?;

    if dry_run {
        tracing::info!(
            provider = provider.provider_name(),
            dry_run = true,
            pages = summary.pages,
            fetched = summary.events.len(),
            skipped = summary.skipped,
            "ratings sync (dry-run)"
        );
        return Ok(());
    }

    let pool = connect(settings).await?;
    let inserted =
        equisignal_core::storage::rating_events::insert_events_atomic(&pool, &summary.events)
            .await?;

    tracing::info!(
        provider = provider.provider_name(),
        pages = summary.pages,
        fetched = summary.events.len(),
        skipped = summary.skipped,
        inserted,
        "ratings sync finished"
    );
    Ok(())
}

async fn run_recommend(
    settings: &equisignal_core::config::Settings,
    limit: Option<i64>,
    now_arg: Option<&str>,
    input: Option<PathBuf>,
) -> anyhow::Result<()> {
    let now = snapshot::resolve_now(now_arg, chrono::Utc::now())?;
    let limit = limit.unwrap_or(settings.recommend_default_limit);
    let recommender = Recommender::try_new(ScoringConfig::from_env()?)?;

    let events = match input {
        Some(path) => snapshot::load_events_file(&path)?,
        None => {
            let pool = connect(settings).await?;
            equisignal_core::storage::rating_events::load_all_events(&pool).await?
        }
    };

    let recs = recommender.rank(&events, limit, now);
    tracing::info!(%now, limit, events = events.len(), returned = recs.len(), "ranked rating events");

    let out = serde_json::to_string_pretty(&recs).context("failed to serialize recommendations")?;
    println!("{out}");
    Ok(())
}

async fn connect(settings: &equisignal_core::config::Settings) -> anyhow::Result<sqlx::PgPool> {
    let db_url = settings.require_database_url()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    equisignal_core::storage::migrate(&pool).await?;
    Ok(pool)
}

fn init_sentry(settings: &equisignal_core::config::Settings) -> Option<sentry::ClientInitGuard> {
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
    fn parses_recommend_flags() {
        let args = Args::try_parse_from([
            "equisignal_worker",
            "recommend",
            "--limit",
            "-1",
            "--now",
            "2025-03-05T16:00:00Z",
        ])
        .unwrap();

        match args.command {
            Command::Recommend { limit, now, input } => {
                assert_eq!(limit, Some(-1));
                assert_eq!(now.as_deref(), Some("2025-03-05T16:00:00Z"));
                assert!(input.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_sync_dry_run() {
        let args = Args::try_parse_from(["equisignal_worker", "sync", "--dry-run"]).unwrap();
        assert!(matches!(args.command, Command::Sync { dry_run: true }));
    }
}
