// API server implementation using actix-web

use std::time::Duration;

use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};

use crate::api::{middleware, routes};
use crate::auth::{google::OAuthConfig, TokenKeys};
use crate::scrape::ScrapePool;
use crate::search::SearchConfig;
use crate::util::db::Db;
use crate::util::env as env_util;

/// Shared per-worker state handed to every handler.
pub struct AppState {
    pub db: Db,
    pub scraper: ScrapePool,
    pub keys: TokenKeys,
    pub oauth: OAuthConfig,
    pub search: SearchConfig,
    pub http: reqwest::Client,
}

pub struct ApiServer {
    pub host: String,
    pub port: u16,
    pub allowed_origins: String,
    keys: TokenKeys,
    oauth: OAuthConfig,
    search: SearchConfig,
    max_browsers: usize,
    scrape_timeout: Duration,
}

impl ApiServer {
    /// Create server from environment variables
    pub fn from_env() -> Result<Self> {
        env_util::init_env();
        env_util::preflight_check(
            "steamlist api",
            &[
                "JWT_SECRET",
                "GOOGLE_API_KEY",
                "GOOGLE_ENGINE",
                "GOOGLE_CLIENT_ID",
                "GOOGLE_CLIENT_SECRET",
                "GOOGLE_REDIRECT_URI",
            ],
            &[
                "API_HOST",
                "API_PORT",
                "ALLOWED_ORIGINS",
                "SCRAPE_MAX_BROWSERS",
                "SCRAPE_TIMEOUT_SECS",
                "DATABASE_URL",
            ],
        )?;

        let host = env_util::env_opt("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = env_util::env_opt("API_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .context("Invalid API_PORT")?;

        let allowed_origins = env_util::env_opt("ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000,http://localhost:8000".to_string());

        let keys = TokenKeys::new(&env_util::env_req("JWT_SECRET")?);
        let oauth = OAuthConfig {
            client_id: env_util::env_req("GOOGLE_CLIENT_ID")?,
            client_secret: env_util::env_req("GOOGLE_CLIENT_SECRET")?,
            redirect_uri: env_util::env_req("GOOGLE_REDIRECT_URI")?,
        };
        let search = SearchConfig::new(
            env_util::env_req("GOOGLE_API_KEY")?,
            env_util::env_req("GOOGLE_ENGINE")?,
        );

        let max_browsers = env_util::env_parse("SCRAPE_MAX_BROWSERS", 2usize);
        let scrape_timeout =
            Duration::from_secs(env_util::env_parse("SCRAPE_TIMEOUT_SECS", 60u64));

        Ok(Self {
            host,
            port,
            allowed_origins,
            keys,
            oauth,
            search,
            max_browsers,
            scrape_timeout,
        })
    }

    /// Start the HTTP server
    pub async fn run(self, db: Db) -> Result<()> {
        let bind_addr = format!("{}:{}", self.host, self.port);

        tracing::info!(
            host = %self.host,
            port = %self.port,
            max_browsers = self.max_browsers,
            "Starting steamlist API server"
        );

        let state = web::Data::new(AppState {
            db,
            scraper: ScrapePool::new(self.max_browsers, self.scrape_timeout),
            keys: self.keys.clone(),
            oauth: self.oauth.clone(),
            search: self.search.clone(),
            http: reqwest::Client::new(),
        });
        let keys = self.keys.clone();
        let allowed_origins = self.allowed_origins.clone();

        HttpServer::new(move || {
            let (logger, compress) = middleware::setup_middleware();
            let cors = middleware::setup_cors(&allowed_origins);
            let keys = keys.clone();

            App::new()
                .app_data(state.clone())
                .wrap(logger)
                .wrap(compress)
                .wrap(cors)
                .configure(|cfg| routes::configure_routes(cfg, &keys))
        })
        .bind(&bind_addr)
        .with_context(|| format!("Failed to bind to {}", bind_addr))?
        .run()
        .await
        .context("HTTP server error")?;

        Ok(())
    }
}
