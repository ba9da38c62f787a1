//! Builders selecting the port implementations behind the HTTP state.

use std::sync::Arc;

use actix_web::web;

use crate::inbound::http::state::{HttpState, StatePorts};
use crate::outbound::persistence::{
    DieselItemRepository, DieselMemberRepository, DieselOrderQueryRepository,
    DieselOrderRepository,
};

use super::ServerConfig;

/// Build the shared HTTP state from the configured ports.
///
/// Diesel adapters serve every port when a pool is attached; without one the
/// seeded in-memory fixture stands in, which keeps the server usable for
/// demos and tests without a database.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let state = match &config.db_pool {
        Some(pool) => HttpState::new(StatePorts {
            members: Arc::new(DieselMemberRepository::new(pool.clone())),
            items: Arc::new(DieselItemRepository::new(pool.clone())),
            orders: Arc::new(DieselOrderRepository::new(pool.clone())),
            order_queries: Arc::new(DieselOrderQueryRepository::new(pool.clone())),
        }),
        None => HttpState::fixture(),
    };
    web::Data::new(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn pool_absent_selects_the_seeded_fixture() {
        let config = ServerConfig::new("127.0.0.1:8080".parse().expect("addr"));

        let state = build_http_state(&config);

        let members = state.members().list().await.expect("fixture listing");
        assert_eq!(members.len(), 2);
    }
}
