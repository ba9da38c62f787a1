//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use clap::Parser;

use crate::outbound::persistence::DbPool;

/// Command-line and environment options for the server binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "bookshop-backend", about = "REST backend for the bookshop")]
pub struct ServerOptions {
    /// Socket address the HTTP listener binds to.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: SocketAddr,

    /// PostgreSQL connection string. Requests are served from the in-memory
    /// fixture when absent.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum connections held by the database pool.
    #[arg(long, env = "DB_POOL_MAX_SIZE", default_value_t = 10)]
    pub pool_max_size: u32,

    /// Idle connections the pool keeps warm.
    #[arg(long, env = "DB_POOL_MIN_IDLE", default_value_t = 2)]
    pub pool_min_idle: u32,

    /// Seconds to wait for a pooled connection before failing the checkout.
    #[arg(long, env = "DB_CONNECT_TIMEOUT_SECS", default_value_t = 30)]
    pub db_connect_timeout_secs: u64,

    /// Insert the demo members, books, and orders at startup when the
    /// database is empty.
    #[arg(long, env = "SEED_DEMO_DATA", default_value_t = false)]
    pub seed_demo_data: bool,
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Construct a server configuration for the given bind address.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            db_pool: None,
        }
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// When provided, the server wires the Diesel-backed repositories;
    /// otherwise the in-memory fixture serves every port.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn options_parse_explicit_flags() {
        let options = ServerOptions::try_parse_from([
            "bookshop-backend",
            "--bind-addr",
            "127.0.0.1:9999",
            "--pool-max-size",
            "3",
            "--pool-min-idle",
            "1",
            "--db-connect-timeout-secs",
            "5",
            "--seed-demo-data",
        ])
        .expect("options should parse");

        assert_eq!(options.bind_addr.to_string(), "127.0.0.1:9999");
        assert_eq!(options.pool_max_size, 3);
        assert_eq!(options.pool_min_idle, 1);
        assert_eq!(options.db_connect_timeout_secs, 5);
        assert!(options.seed_demo_data);
    }

    #[rstest]
    fn config_starts_without_a_pool() {
        let config = ServerConfig::new("127.0.0.1:8080".parse().expect("addr"));

        assert!(config.db_pool.is_none());
        assert_eq!(config.bind_addr().port(), 8080);
    }
}
