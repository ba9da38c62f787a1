//! Shared application state for HTTP handlers.
//!
//! Handlers depend on the port traits only; which implementation sits behind
//! them (Diesel adapters or the in-memory fixture) is decided once at
//! startup.

use std::sync::Arc;

use crate::domain::OrderService;
use crate::domain::ports::{
    FixtureShop, ItemRepository, MemberRepository, OrderQueryRepository, OrderRepository,
};

/// The port implementations the HTTP layer is wired to.
pub struct StatePorts {
    /// Member storage.
    pub members: Arc<dyn MemberRepository>,
    /// Catalogue item storage.
    pub items: Arc<dyn ItemRepository>,
    /// Order storage and listing strategies.
    pub orders: Arc<dyn OrderRepository>,
    /// Wire-shaped order projections.
    pub order_queries: Arc<dyn OrderQueryRepository>,
}

/// Application state shared across HTTP workers.
#[derive(Clone)]
pub struct HttpState {
    members: Arc<dyn MemberRepository>,
    items: Arc<dyn ItemRepository>,
    orders: Arc<dyn OrderRepository>,
    order_queries: Arc<dyn OrderQueryRepository>,
    order_service: OrderService,
}

impl HttpState {
    /// Build the state from a set of ports.
    #[must_use]
    pub fn new(ports: StatePorts) -> Self {
        let order_service = OrderService::new(
            ports.members.clone(),
            ports.items.clone(),
            ports.orders.clone(),
        );
        Self {
            members: ports.members,
            items: ports.items,
            orders: ports.orders,
            order_queries: ports.order_queries,
            order_service,
        }
    }

    /// State backed by the seeded in-memory fixture.
    #[must_use]
    pub fn fixture() -> Self {
        let shop = Arc::new(FixtureShop::seeded());
        Self::new(StatePorts {
            members: shop.clone(),
            items: shop.clone(),
            orders: shop.clone(),
            order_queries: shop,
        })
    }

    /// State backed by an empty in-memory fixture.
    #[must_use]
    pub fn empty_fixture() -> Self {
        let shop = Arc::new(FixtureShop::empty());
        Self::new(StatePorts {
            members: shop.clone(),
            items: shop.clone(),
            orders: shop.clone(),
            order_queries: shop,
        })
    }

    /// Member storage port.
    #[must_use]
    pub fn members(&self) -> &dyn MemberRepository {
        self.members.as_ref()
    }

    /// Item storage port.
    #[must_use]
    pub fn items(&self) -> &dyn ItemRepository {
        self.items.as_ref()
    }

    /// Order storage port.
    #[must_use]
    pub fn orders(&self) -> &dyn OrderRepository {
        self.orders.as_ref()
    }

    /// Order projection port.
    #[must_use]
    pub fn order_queries(&self) -> &dyn OrderQueryRepository {
        self.order_queries.as_ref()
    }

    /// Order placement/cancellation use cases.
    #[must_use]
    pub fn order_service(&self) -> &OrderService {
        &self.order_service
    }
}
