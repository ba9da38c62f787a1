//! Port abstraction for wire-shaped order projections.
//!
//! These queries bypass the aggregate read models entirely and select exactly
//! the columns the response needs. They trade reusability for transfer size:
//! the projection is fitted to one screen, so a response change means a
//! repository change.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::domain::{Address, OrderSearch, OrderStatus};

/// Errors raised by order projection adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderProjectionError {
    /// Repository connection could not be established.
    #[error("order projection connection failed: {message}")]
    Connection {
        /// Adapter-supplied failure description.
        message: String,
    },
    /// Query failed during execution.
    #[error("order projection query failed: {message}")]
    Query {
        /// Adapter-supplied failure description.
        message: String,
    },
}

impl OrderProjectionError {
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

/// Line projection inside an [`OrderSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineSummary {
    /// Item name.
    pub item_name: String,
    /// Unit price captured at placement time.
    pub order_price: i32,
    /// Units ordered.
    pub count: i32,
}

/// Wire-shaped order projection with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    /// Order identifier.
    pub order_id: i64,
    /// Ordering member's name.
    pub member_name: String,
    /// Placement timestamp.
    pub ordered_at: DateTime<Utc>,
    /// Lifecycle state.
    pub status: OrderStatus,
    /// Delivery destination.
    pub address: Address,
    /// Line projections.
    pub lines: Vec<OrderLineSummary>,
}

/// Wire-shaped to-one order projection (no lines).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimpleOrderSummary {
    /// Order identifier.
    pub order_id: i64,
    /// Ordering member's name.
    pub member_name: String,
    /// Placement timestamp.
    pub ordered_at: DateTime<Utc>,
    /// Lifecycle state.
    pub status: OrderStatus,
    /// Delivery destination.
    pub address: Address,
}

/// One denormalised row of the flat projection: order fields repeat for every
/// line the order has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderFlatRow {
    /// Order identifier (repeats per line).
    pub order_id: i64,
    /// Ordering member's name (repeats per line).
    pub member_name: String,
    /// Placement timestamp (repeats per line).
    pub ordered_at: DateTime<Utc>,
    /// Lifecycle state (repeats per line).
    pub status: OrderStatus,
    /// Delivery destination (repeats per line).
    pub address: Address,
    /// Item name of this line.
    pub item_name: String,
    /// Unit price of this line.
    pub order_price: i32,
    /// Units ordered on this line.
    pub count: i32,
}

/// Driven port for wire-shaped order projections.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderQueryRepository: Send + Sync {
    /// Project order summaries with one root query plus one line query per
    /// order (1 + n queries).
    async fn find_summaries(
        &self,
        search: &OrderSearch,
    ) -> Result<Vec<OrderSummary>, OrderProjectionError>;

    /// Project order summaries with one root query plus a single `IN` line
    /// query, stitched in memory (2 queries).
    async fn find_summaries_batched(
        &self,
        search: &OrderSearch,
    ) -> Result<Vec<OrderSummary>, OrderProjectionError>;

    /// Project the flat denormalised rows in a single query. One row per
    /// line, so the result cannot be paginated by order.
    async fn find_flat_rows(
        &self,
        search: &OrderSearch,
    ) -> Result<Vec<OrderFlatRow>, OrderProjectionError>;

    /// Project to-one order summaries, selecting exactly the response's
    /// columns in a single query.
    async fn find_simple_summaries(
        &self,
        search: &OrderSearch,
    ) -> Result<Vec<SimpleOrderSummary>, OrderProjectionError>;
}
