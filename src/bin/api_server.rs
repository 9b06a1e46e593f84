// HTTP API server binary for steamlist
// Searches the Steam storefront, scrapes listing prices, manages saved lists.

use anyhow::Result;
use steamlist::api::ApiServer;
use steamlist::util::db::Db;
use steamlist::util::env as env_util;

#[actix_web::main]
async fn main() -> Result<()> {
    steamlist::tracing::init_tracing("info,sqlx=warn")?;

    tracing::info!("Initializing steamlist API server");

    // Load dotenv/env once (safe to call multiple times)
    env_util::init_env();

    // Load configuration from environment
    let server = ApiServer::from_env()?;

    // Connect the pool with backoff; an unreachable database is fatal.
    let database_url = env_util::db_url()?;
    let max_connections: u32 = env_util::env_parse("DB_MAX_CONNS", 10u32);
    let attempts: u32 = env_util::env_parse("DB_CONNECT_ATTEMPTS", 5u32);
    let db = Db::connect_with_retry(&database_url, max_connections, attempts).await?;

    tracing::info!("Database connected successfully");

    // Start HTTP server
    server.run(db).await?;

    Ok(())
}
