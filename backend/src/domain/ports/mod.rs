//! Driven ports decoupling the domain from persistence adapters.
//!
//! Each port is an async trait with a typed error enum. Production adapters
//! live under `outbound::persistence`; [`FixtureShop`] provides an in-memory
//! implementation for tests and database-free operation.

mod fixtures;
mod item_repository;
mod member_repository;
mod order_query_repository;
mod order_repository;

pub use fixtures::FixtureShop;
pub use item_repository::{ItemPersistenceError, ItemRepository};
pub use member_repository::{MemberPersistenceError, MemberRepository};
pub use order_query_repository::{
    OrderFlatRow, OrderLineSummary, OrderProjectionError, OrderQueryRepository, OrderSummary,
    SimpleOrderSummary,
};
pub use order_repository::{OrderPersistenceError, OrderRepository, StockAdjustment};

#[cfg(test)]
pub use item_repository::MockItemRepository;
#[cfg(test)]
pub use member_repository::MockMemberRepository;
#[cfg(test)]
pub use order_query_repository::MockOrderQueryRepository;
#[cfg(test)]
pub use order_repository::MockOrderRepository;
