pub mod domain;
pub mod ingest;
pub mod scoring;
pub mod storage;

pub mod config {
    use anyhow::Context;

    const DEFAULT_RECOMMEND_LIMIT: i64 = 10;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub external_api_url: Option<String>,
        pub external_api_token: Option<String>,
        pub frontend_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub recommend_default_limit: i64,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let recommend_default_limit = match std::env::var("RECOMMEND_DEFAULT_LIMIT") {
                Ok(s) => s
                    .trim()
                    .parse::<i64>()
                    .with_context(|| format!("RECOMMEND_DEFAULT_LIMIT is not an integer: {s}"))?,
                Err(_) => DEFAULT_RECOMMEND_LIMIT,
            };

            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                external_api_url: std::env::var("EXTERNAL_API_URL").ok(),
                external_api_token: std::env::var("EXTERNAL_API_TOKEN").ok(),
                frontend_url: std::env::var("FRONTEND_URL").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                recommend_default_limit,
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_external_api_url(&self) -> anyhow::Result<&str> {
            self.external_api_url
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .context("EXTERNAL_API_URL is required")
        }
    }
}
