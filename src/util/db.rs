use anyhow::Result;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
    PgPool,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct Db {
    pub pool: PgPool,
}

impl Db {
    // SECURITY: never include raw DSNs in tracing spans (they may contain credentials).
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let mut connect_options = PgConnectOptions::from_str(database_url)?;

        // Be explicit about TLS when the DSN asks for it.
        if database_url.contains("sslmode=require") && !database_url.contains("sslmode=disable") {
            connect_options = connect_options.ssl_mode(PgSslMode::Require);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(600))
            .connect_with(connect_options)
            .await?;
        info!("connected to db");

        // Optional auto-migrate gate (default: OFF) so the server can run
        // against an externally managed schema. Enable with AUTO_MIGRATE=1.
        if crate::util::env::env_flag("AUTO_MIGRATE", false) {
            info!("running migrations (AUTO_MIGRATE=on)");
            sqlx::migrate!("./migrations").run(&pool).await?;
        } else {
            info!("AUTO_MIGRATE disabled; skipping migrations");
        }
        Ok(Self { pool })
    }

    /// Connect with exponential backoff. A database that is still unreachable
    /// after `attempts` tries is a fatal startup error for the caller.
    pub async fn connect_with_retry(
        database_url: &str,
        max_connections: u32,
        attempts: u32,
    ) -> Result<Self> {
        let mut delay = Duration::from_secs(1);
        let mut last_err = None;
        for attempt in 1..=attempts {
            match Self::connect(database_url, max_connections).await {
                Ok(db) => return Ok(db),
                Err(e) => {
                    warn!(attempt, attempts, error = %e, "db connect failed; retrying");
                    last_err = Some(e);
                }
            }
            if attempt < attempts {
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(Duration::from_secs(30));
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("db connect failed")))
    }
}
