//! Backend entry-point: wires REST endpoints, persistence, and OpenAPI docs.

use actix_web::web;
use clap::Parser;
use diesel::{Connection, PgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use bookshop_backend::inbound::http::health::HealthState;
use bookshop_backend::outbound::persistence::{DbPool, PoolConfig, seed_demo_data};
use bookshop_backend::server::{ServerConfig, ServerOptions, create_server};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Bring the schema up to date over a blocking connection.
fn run_migrations(database_url: &str) -> std::io::Result<()> {
    let mut conn = PgConnection::establish(database_url)
        .map_err(|err| std::io::Error::other(format!("database connection failed: {err}")))?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| std::io::Error::other(format!("migrations failed: {err}")))?;
    info!(count = applied.len(), "migrations applied");
    Ok(())
}

async fn build_pool(options: &ServerOptions, database_url: &str) -> std::io::Result<DbPool> {
    let url = database_url.to_owned();
    tokio::task::spawn_blocking(move || run_migrations(&url))
        .await
        .map_err(|err| std::io::Error::other(format!("migration task failed: {err}")))??;

    let pool_config = PoolConfig::new(database_url)
        .with_max_size(options.pool_max_size)
        .with_min_idle(Some(options.pool_min_idle))
        .with_connection_timeout(std::time::Duration::from_secs(options.db_connect_timeout_secs));
    DbPool::new(pool_config).await.map_err(std::io::Error::other)
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let options = ServerOptions::parse();
    let mut config = ServerConfig::new(options.bind_addr);

    if let Some(database_url) = options.database_url.clone() {
        let pool = build_pool(&options, &database_url).await?;
        if options.seed_demo_data {
            let outcome = seed_demo_data(&pool)
                .await
                .map_err(std::io::Error::other)?;
            info!(?outcome, "demo seed checked");
        }
        config = config.with_db_pool(pool);
    } else {
        info!("no database configured; serving the in-memory fixture");
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    server.await
}
