//! Order aggregate, its read models, and the listing filter.
//!
//! The write model ([`Order`]) owns the cancellation rules. The read models
//! (`OrderHead`, `OrderWithParties`, `OrderDetail`) mirror the loading
//! strategies the repository offers: roots only, roots with their to-one
//! associations, and fully joined detail. There is no lazy loading in this
//! codebase; whichever shape an endpoint needs is loaded explicitly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::{Address, ItemId, Member, MemberId};

/// Order primary key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct OrderId(i64);

impl OrderId {
    /// Wrap a raw database identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Raw identifier value.
    #[must_use]
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Delivery primary key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct DeliveryId(i64);

impl DeliveryId {
    /// Wrap a raw database identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Raw identifier value.
    #[must_use]
    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Placed and active.
    Order,
    /// Cancelled; deducted stock has been restored.
    Cancel,
}

impl OrderStatus {
    /// Discriminator string persisted in the orders table.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Order => "ORDER",
            Self::Cancel => "CANCEL",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ORDER" => Ok(Self::Order),
            "CANCEL" => Ok(Self::Cancel),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// Shipment state of a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    /// Awaiting shipment.
    Ready,
    /// Delivered; the order can no longer be cancelled.
    Completed,
}

impl DeliveryStatus {
    /// Discriminator string persisted in the deliveries table.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Completed => "COMPLETED",
        }
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "READY" => Ok(Self::Ready),
            "COMPLETED" => Ok(Self::Completed),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// A status string that matches no known discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown status {0:?}")]
pub struct UnknownStatus(pub String);

/// Shipment record attached to an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Primary key.
    pub id: DeliveryId,
    /// Destination captured from the member at placement time.
    pub address: Address,
    /// Shipment state.
    pub status: DeliveryStatus,
}

/// A line item: one catalogue item at a captured unit price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    /// Ordered item.
    pub item_id: ItemId,
    /// Item name captured at placement time.
    pub item_name: String,
    /// Unit price captured at placement time.
    pub order_price: i32,
    /// Units ordered.
    pub count: i32,
}

impl OrderLine {
    /// Line total: captured price times count, widened so large but valid
    /// lines cannot overflow.
    #[must_use]
    pub fn total_price(&self) -> i64 {
        i64::from(self.order_price) * i64::from(self.count)
    }
}

/// Reasons an order cannot be cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CancelError {
    /// The delivery already completed; goods cannot be recalled.
    #[error("delivered orders cannot be cancelled")]
    DeliveryCompleted,
    /// The order was already cancelled; stock must not be restored twice.
    #[error("order is already cancelled")]
    AlreadyCancelled,
}

/// The order write model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    member_id: MemberId,
    delivery: Delivery,
    lines: Vec<OrderLine>,
    status: OrderStatus,
    ordered_at: DateTime<Utc>,
}

impl Order {
    /// Rehydrate an order aggregate from persisted state.
    #[must_use]
    pub fn new(
        id: OrderId,
        member_id: MemberId,
        delivery: Delivery,
        lines: Vec<OrderLine>,
        status: OrderStatus,
        ordered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            member_id,
            delivery,
            lines,
            status,
            ordered_at,
        }
    }

    /// Primary key.
    #[must_use]
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Ordering member.
    #[must_use]
    pub fn member_id(&self) -> MemberId {
        self.member_id
    }

    /// Shipment record.
    #[must_use]
    pub fn delivery(&self) -> &Delivery {
        &self.delivery
    }

    /// Line items.
    #[must_use]
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Lifecycle state.
    #[must_use]
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Placement timestamp.
    #[must_use]
    pub fn ordered_at(&self) -> DateTime<Utc> {
        self.ordered_at
    }

    /// Derived total: sum of line totals. Never stored.
    #[must_use]
    pub fn total_price(&self) -> i64 {
        self.lines.iter().map(OrderLine::total_price).sum()
    }

    /// Flip the order to CANCEL.
    ///
    /// # Errors
    ///
    /// Returns [`CancelError`] when the delivery already completed or the
    /// order was cancelled before; both would corrupt stock bookkeeping.
    pub fn cancel(&mut self) -> Result<(), CancelError> {
        if self.delivery.status == DeliveryStatus::Completed {
            return Err(CancelError::DeliveryCompleted);
        }
        if self.status == OrderStatus::Cancel {
            return Err(CancelError::AlreadyCancelled);
        }
        self.status = OrderStatus::Cancel;
        Ok(())
    }
}

/// A draft line for order placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    /// Ordered item.
    pub item_id: ItemId,
    /// Item name captured at placement time.
    pub item_name: String,
    /// Unit price captured at placement time.
    pub order_price: i32,
    /// Units ordered.
    pub count: i32,
}

/// An order awaiting persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// Ordering member.
    pub member_id: MemberId,
    /// Destination for the new READY delivery.
    pub delivery_address: Address,
    /// Draft line items.
    pub lines: Vec<NewOrderLine>,
    /// Placement timestamp.
    pub ordered_at: DateTime<Utc>,
}

/// Order root row without any associations loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderHead {
    /// Primary key.
    pub id: OrderId,
    /// Ordering member (not loaded).
    pub member_id: MemberId,
    /// Shipment record (not loaded).
    pub delivery_id: DeliveryId,
    /// Lifecycle state.
    pub status: OrderStatus,
    /// Placement timestamp.
    pub ordered_at: DateTime<Utc>,
}

/// Order root joined with its to-one associations (member and delivery).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderWithParties {
    /// Primary key.
    pub id: OrderId,
    /// Ordering member, loaded in the same query.
    pub member: Member,
    /// Shipment record, loaded in the same query.
    pub delivery: Delivery,
    /// Lifecycle state.
    pub status: OrderStatus,
    /// Placement timestamp.
    pub ordered_at: DateTime<Utc>,
}

/// Order with every association loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetail {
    /// Primary key.
    pub id: OrderId,
    /// Ordering member.
    pub member: Member,
    /// Shipment record.
    pub delivery: Delivery,
    /// Line items with their item names resolved.
    pub lines: Vec<OrderLine>,
    /// Lifecycle state.
    pub status: OrderStatus,
    /// Placement timestamp.
    pub ordered_at: DateTime<Utc>,
}

/// Optional filters shared by every order listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderSearch {
    /// Substring match on the ordering member's name.
    pub member_name: Option<String>,
    /// Exact match on the order status.
    pub status: Option<OrderStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn delivery(status: DeliveryStatus) -> Delivery {
        Delivery {
            id: DeliveryId::new(1),
            address: Address::new("Seoul", "Teheran-ro 1", "06234").expect("valid address"),
            status,
        }
    }

    fn order(status: OrderStatus, delivery_status: DeliveryStatus) -> Order {
        Order::new(
            OrderId::new(1),
            MemberId::new(1),
            delivery(delivery_status),
            vec![
                OrderLine {
                    item_id: ItemId::new(1),
                    item_name: "JPA1 BOOK".into(),
                    order_price: 10_000,
                    count: 1,
                },
                OrderLine {
                    item_id: ItemId::new(2),
                    item_name: "JPA2 BOOK".into(),
                    order_price: 20_000,
                    count: 2,
                },
            ],
            status,
            Utc::now(),
        )
    }

    #[rstest]
    fn total_price_is_derived_from_lines() {
        let order = order(OrderStatus::Order, DeliveryStatus::Ready);
        assert_eq!(order.total_price(), 50_000);
    }

    #[rstest]
    fn total_price_handles_large_valid_lines() {
        let line = OrderLine {
            item_id: ItemId::new(1),
            item_name: "WAREHOUSE LOT".into(),
            order_price: 1_000_000,
            count: 3_000,
        };
        assert_eq!(line.total_price(), 3_000_000_000);
    }

    #[rstest]
    fn cancel_flips_status() {
        let mut order = order(OrderStatus::Order, DeliveryStatus::Ready);
        order.cancel().expect("cancellable");
        assert_eq!(order.status(), OrderStatus::Cancel);
    }

    #[rstest]
    fn cancel_rejects_completed_delivery() {
        let mut order = order(OrderStatus::Order, DeliveryStatus::Completed);
        assert_eq!(order.cancel(), Err(CancelError::DeliveryCompleted));
        assert_eq!(order.status(), OrderStatus::Order);
    }

    #[rstest]
    fn cancel_rejects_repeat_cancellation() {
        let mut order = order(OrderStatus::Cancel, DeliveryStatus::Ready);
        assert_eq!(order.cancel(), Err(CancelError::AlreadyCancelled));
    }

    #[rstest]
    #[case("ORDER", OrderStatus::Order)]
    #[case("CANCEL", OrderStatus::Cancel)]
    fn order_status_parses_discriminators(#[case] raw: &str, #[case] expected: OrderStatus) {
        assert_eq!(raw.parse::<OrderStatus>(), Ok(expected));
        assert_eq!(expected.as_str(), raw);
    }

    #[rstest]
    fn order_status_rejects_unknown_strings() {
        assert!("SHIPPED".parse::<OrderStatus>().is_err());
    }

    #[rstest]
    fn statuses_serialise_screaming_snake_case() {
        assert_eq!(
            serde_json::to_value(OrderStatus::Order).expect("serialisable"),
            "ORDER"
        );
        assert_eq!(
            serde_json::to_value(DeliveryStatus::Completed).expect("serialisable"),
            "COMPLETED"
        );
    }
}
