//! Port abstraction for order persistence adapters.
//!
//! The listing methods deliberately span the whole loading-strategy spectrum
//! the order endpoints demonstrate: bare roots (callers fetch associations
//! per row), joined to-one loads, a paginated to-one load with a separate
//! batched line fetch, and a fully joined detail load. Adapters document the
//! number of queries each method issues.

use std::collections::HashMap;

use async_trait::async_trait;
use pagination::PageRequest;
use thiserror::Error;

use crate::domain::{
    Delivery, DeliveryId, ItemId, NewOrder, Order, OrderDetail, OrderHead, OrderId, OrderLine,
    OrderSearch, OrderWithParties,
};

/// Persistence errors raised by order repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderPersistenceError {
    /// Repository connection could not be established.
    #[error("order repository connection failed: {message}")]
    Connection {
        /// Adapter-supplied failure description.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("order repository query failed: {message}")]
    Query {
        /// Adapter-supplied failure description.
        message: String,
    },
}

impl OrderPersistenceError {
    /// Helper for connection failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Signed stock change to apply to an item alongside an order mutation.
///
/// The adapter applies the delta to the stored quantity inside the same
/// transaction as the order rows, so concurrent placements cannot lose each
/// other's decrements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockAdjustment {
    /// Item whose stock changes.
    pub item_id: ItemId,
    /// Change to apply: negative for a placement, positive for a restore.
    pub delta: i32,
}

/// Driven port for order storage and the listing strategies.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist a placement: delivery, order, lines, and the stock writes, all
    /// in one transaction.
    async fn place(
        &self,
        order: &NewOrder,
        stock: &[StockAdjustment],
    ) -> Result<OrderId, OrderPersistenceError>;

    /// Persist a cancellation: status flip plus the stock restores, all in
    /// one transaction.
    async fn mark_cancelled(
        &self,
        id: OrderId,
        stock: &[StockAdjustment],
    ) -> Result<(), OrderPersistenceError>;

    /// Load the full order aggregate for a mutation.
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, OrderPersistenceError>;

    /// Load order roots only; associations are left to the caller.
    ///
    /// This is the per-row strategy's first query: listing n orders this way
    /// costs 1 + n member + n delivery lookups downstream.
    async fn find_heads(
        &self,
        search: &OrderSearch,
    ) -> Result<Vec<OrderHead>, OrderPersistenceError>;

    /// Fetch one delivery (per-row strategy companion to [`Self::find_heads`]).
    async fn find_delivery(
        &self,
        id: DeliveryId,
    ) -> Result<Option<Delivery>, OrderPersistenceError>;

    /// Fetch the lines of one order with item names resolved.
    async fn find_lines(&self, order_id: OrderId)
    -> Result<Vec<OrderLine>, OrderPersistenceError>;

    /// Fetch the lines of many orders in a single `IN` query, grouped by
    /// order. This is the batched collection load that keeps the paginated
    /// listing at two queries total.
    async fn find_lines_for_orders(
        &self,
        order_ids: &[OrderId],
    ) -> Result<HashMap<OrderId, Vec<OrderLine>>, OrderPersistenceError>;

    /// Load orders with member and delivery joined in one query.
    async fn find_with_parties(
        &self,
        search: &OrderSearch,
    ) -> Result<Vec<OrderWithParties>, OrderPersistenceError>;

    /// Paginated variant of [`Self::find_with_parties`]. Only to-one
    /// associations are joined, so row count equals order count and
    /// offset/limit stay correct; collections must be loaded separately via
    /// [`Self::find_lines_for_orders`].
    async fn find_page_with_parties(
        &self,
        search: &OrderSearch,
        page: &PageRequest,
    ) -> Result<Vec<OrderWithParties>, OrderPersistenceError>;

    /// Load orders with everything joined, lines included, in one query.
    /// Joining the line collection fans the root out to one row per line, so
    /// adapters must collapse duplicates; the result is not pageable.
    async fn find_detailed(
        &self,
        search: &OrderSearch,
    ) -> Result<Vec<OrderDetail>, OrderPersistenceError>;
}
