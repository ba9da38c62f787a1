//! Order placement and cancellation use cases.
//!
//! The service owns the cross-aggregate choreography: it loads the member and
//! the item, lets the aggregates enforce their own invariants, and hands the
//! resulting writes to the order port as one transactional unit.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::domain::item::NotEnoughStock;
use crate::domain::order::CancelError;
use crate::domain::ports::{
    ItemPersistenceError, ItemRepository, MemberPersistenceError, MemberRepository,
    OrderPersistenceError, OrderRepository, StockAdjustment,
};
use crate::domain::{ItemId, MemberId, NewOrder, NewOrderLine, OrderId};

/// Failures raised by the order use cases.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderServiceError {
    /// The requested count must be strictly positive.
    #[error("order count must be positive, got {0}")]
    InvalidCount(i32),
    /// The ordering member does not exist.
    #[error("member {0} not found")]
    MemberNotFound(MemberId),
    /// The ordered item does not exist.
    #[error("item {0} not found")]
    ItemNotFound(ItemId),
    /// The order does not exist.
    #[error("order {0} not found")]
    OrderNotFound(OrderId),
    /// The item's remaining stock cannot cover the requested count.
    #[error(transparent)]
    NotEnoughStock(#[from] NotEnoughStock),
    /// The order's lifecycle forbids cancellation.
    #[error(transparent)]
    Cancel(#[from] CancelError),
    /// The backing store rejected a query.
    #[error("order storage failed: {0}")]
    Repository(String),
    /// The backing store is unreachable.
    #[error("order storage unavailable: {0}")]
    Unavailable(String),
}

impl From<MemberPersistenceError> for OrderServiceError {
    fn from(err: MemberPersistenceError) -> Self {
        match err {
            MemberPersistenceError::Connection { message } => Self::Unavailable(message),
            MemberPersistenceError::Query { message } => Self::Repository(message),
        }
    }
}

impl From<ItemPersistenceError> for OrderServiceError {
    fn from(err: ItemPersistenceError) -> Self {
        match err {
            ItemPersistenceError::Connection { message } => Self::Unavailable(message),
            ItemPersistenceError::Query { message } => Self::Repository(message),
        }
    }
}

impl From<OrderPersistenceError> for OrderServiceError {
    fn from(err: OrderPersistenceError) -> Self {
        match err {
            OrderPersistenceError::Connection { message } => Self::Unavailable(message),
            OrderPersistenceError::Query { message } => Self::Repository(message),
        }
    }
}

/// Use-case service for placing and cancelling orders.
#[derive(Clone)]
pub struct OrderService {
    members: Arc<dyn MemberRepository>,
    items: Arc<dyn ItemRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl OrderService {
    /// Wire the service to its ports.
    #[must_use]
    pub fn new(
        members: Arc<dyn MemberRepository>,
        items: Arc<dyn ItemRepository>,
        orders: Arc<dyn OrderRepository>,
    ) -> Self {
        Self {
            members,
            items,
            orders,
        }
    }

    /// Place a single-item order for a member.
    ///
    /// Captures the item's name and current price on the line, checks the
    /// count against stock through the aggregate, and persists the order
    /// together with a signed stock decrement the adapter applies inside the
    /// same transaction. The delivery is created READY at the member's
    /// address.
    ///
    /// # Errors
    ///
    /// Returns [`OrderServiceError::InvalidCount`] for non-positive counts,
    /// `MemberNotFound`/`ItemNotFound` for dangling references, and
    /// [`OrderServiceError::NotEnoughStock`] when stock cannot cover the
    /// count; in every failure case no state changes.
    pub async fn place_order(
        &self,
        member_id: MemberId,
        item_id: ItemId,
        count: i32,
    ) -> Result<OrderId, OrderServiceError> {
        if count <= 0 {
            return Err(OrderServiceError::InvalidCount(count));
        }
        let member = self
            .members
            .find_by_id(member_id)
            .await?
            .ok_or(OrderServiceError::MemberNotFound(member_id))?;
        let mut item = self
            .items
            .find_by_id(item_id)
            .await?
            .ok_or(OrderServiceError::ItemNotFound(item_id))?;

        item.remove_stock(count)?;

        let order = NewOrder {
            member_id,
            delivery_address: member.address().clone(),
            lines: vec![NewOrderLine {
                item_id,
                item_name: item.name().to_owned(),
                order_price: item.price(),
                count,
            }],
            ordered_at: Utc::now(),
        };
        let adjustment = StockAdjustment {
            item_id,
            delta: -count,
        };
        Ok(self.orders.place(&order, &[adjustment]).await?)
    }

    /// Cancel an order, restoring the stock its lines consumed via positive
    /// per-line deltas applied in the cancellation transaction.
    ///
    /// # Errors
    ///
    /// Returns [`OrderServiceError::OrderNotFound`] for unknown orders and
    /// [`OrderServiceError::Cancel`] when the delivery has already completed
    /// or the order was already cancelled.
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<(), OrderServiceError> {
        let mut order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or(OrderServiceError::OrderNotFound(order_id))?;

        order.cancel()?;

        let adjustments: Vec<StockAdjustment> = order
            .lines()
            .iter()
            .map(|line| StockAdjustment {
                item_id: line.item_id,
                delta: line.count,
            })
            .collect();
        Ok(self.orders.mark_cancelled(order_id, &adjustments).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{FixtureShop, MockItemRepository, MockMemberRepository, MockOrderRepository};
    use crate::domain::{
        Address, Delivery, DeliveryId, DeliveryStatus, Order, OrderLine, OrderStatus,
    };
    use chrono::Utc;
    use rstest::rstest;

    fn service_over(shop: Arc<FixtureShop>) -> OrderService {
        OrderService::new(shop.clone(), shop.clone(), shop)
    }

    const USER_A: MemberId = MemberId::new(1);
    const JPA1_BOOK: ItemId = ItemId::new(3);

    #[rstest]
    #[tokio::test]
    async fn placing_an_order_decrements_stock_and_records_the_total() {
        let shop = Arc::new(FixtureShop::seeded());
        let service = service_over(shop.clone());

        let order_id = service
            .place_order(USER_A, JPA1_BOOK, 2)
            .await
            .expect("order placed");

        let order = OrderRepository::find_by_id(shop.as_ref(), order_id)
            .await
            .expect("lookup")
            .expect("order exists");
        assert_eq!(order.status(), OrderStatus::Order);
        assert_eq!(order.total_price(), 20_000);
        assert_eq!(order.lines().len(), 1);

        let item = ItemRepository::find_by_id(shop.as_ref(), JPA1_BOOK)
            .await
            .expect("lookup")
            .expect("item exists");
        assert_eq!(item.stock_quantity(), 97);
    }

    #[rstest]
    #[tokio::test]
    async fn ordering_beyond_stock_fails_and_leaves_stock_unchanged() {
        let shop = Arc::new(FixtureShop::seeded());
        let service = service_over(shop.clone());

        let err = service
            .place_order(USER_A, JPA1_BOOK, 1_000)
            .await
            .expect_err("stock exceeded");

        assert!(matches!(err, OrderServiceError::NotEnoughStock(_)));
        assert_eq!(err.to_string(), "not enough stock remaining");

        let item = ItemRepository::find_by_id(shop.as_ref(), JPA1_BOOK)
            .await
            .expect("lookup")
            .expect("item exists");
        assert_eq!(item.stock_quantity(), 99);
    }

    #[rstest]
    #[case(0)]
    #[case(-3)]
    #[tokio::test]
    async fn non_positive_counts_are_rejected(#[case] count: i32) {
        let service = service_over(Arc::new(FixtureShop::seeded()));
        let err = service
            .place_order(USER_A, JPA1_BOOK, count)
            .await
            .expect_err("invalid count");
        assert_eq!(err, OrderServiceError::InvalidCount(count));
    }

    #[rstest]
    #[tokio::test]
    async fn ordering_for_an_unknown_member_fails() {
        let service = service_over(Arc::new(FixtureShop::seeded()));
        let err = service
            .place_order(MemberId::new(999), JPA1_BOOK, 1)
            .await
            .expect_err("unknown member");
        assert_eq!(err, OrderServiceError::MemberNotFound(MemberId::new(999)));
    }

    #[rstest]
    #[tokio::test]
    async fn cancelling_restores_stock_and_flips_the_status() {
        let shop = Arc::new(FixtureShop::seeded());
        let service = service_over(shop.clone());

        let order_id = service
            .place_order(USER_A, JPA1_BOOK, 5)
            .await
            .expect("order placed");
        service.cancel_order(order_id).await.expect("cancelled");

        let order = OrderRepository::find_by_id(shop.as_ref(), order_id)
            .await
            .expect("lookup")
            .expect("order exists");
        assert_eq!(order.status(), OrderStatus::Cancel);

        let item = ItemRepository::find_by_id(shop.as_ref(), JPA1_BOOK)
            .await
            .expect("lookup")
            .expect("item exists");
        assert_eq!(item.stock_quantity(), 99);
    }

    #[rstest]
    #[tokio::test]
    async fn placing_sends_a_negative_stock_delta_to_the_repository() {
        let shop = Arc::new(FixtureShop::seeded());
        let mut orders = MockOrderRepository::new();
        orders
            .expect_place()
            .withf(|_, stock| {
                stock.len() == 1 && stock[0].item_id == JPA1_BOOK && stock[0].delta == -2
            })
            .return_once(|_, _| Ok(OrderId::new(42)));

        let service = OrderService::new(shop.clone(), shop, Arc::new(orders));
        let order_id = service
            .place_order(USER_A, JPA1_BOOK, 2)
            .await
            .expect("order placed");
        assert_eq!(order_id, OrderId::new(42));
    }

    #[rstest]
    #[tokio::test]
    async fn cancelling_sends_positive_per_line_deltas_to_the_repository() {
        let mut orders = MockOrderRepository::new();
        let address = Address::new("Seoul", "Teheran-ro 1", "06234").expect("valid address");
        let placed = Order::new(
            OrderId::new(7),
            USER_A,
            Delivery {
                id: DeliveryId::new(7),
                address,
                status: DeliveryStatus::Ready,
            },
            vec![
                OrderLine {
                    item_id: JPA1_BOOK,
                    item_name: "JPA1 BOOK".into(),
                    order_price: 10_000,
                    count: 3,
                },
                OrderLine {
                    item_id: ItemId::new(4),
                    item_name: "JPA2 BOOK".into(),
                    order_price: 20_000,
                    count: 1,
                },
            ],
            OrderStatus::Order,
            Utc::now(),
        );
        orders
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(placed)));
        orders
            .expect_mark_cancelled()
            .withf(|id, stock| {
                *id == OrderId::new(7)
                    && stock.len() == 2
                    && stock[0] == StockAdjustment {
                        item_id: JPA1_BOOK,
                        delta: 3,
                    }
                    && stock[1] == StockAdjustment {
                        item_id: ItemId::new(4),
                        delta: 1,
                    }
            })
            .return_once(|_, _| Ok(()));

        let service = OrderService::new(
            Arc::new(MockMemberRepository::new()),
            Arc::new(MockItemRepository::new()),
            Arc::new(orders),
        );
        service
            .cancel_order(OrderId::new(7))
            .await
            .expect("cancelled");
    }

    #[rstest]
    #[tokio::test]
    async fn cancelling_a_delivered_order_is_rejected() {
        let mut orders = MockOrderRepository::new();
        let address = Address::new("Seoul", "Teheran-ro 1", "06234").expect("valid address");
        let delivered = Order::new(
            OrderId::new(1),
            USER_A,
            Delivery {
                id: DeliveryId::new(1),
                address,
                status: DeliveryStatus::Completed,
            },
            vec![OrderLine {
                item_id: JPA1_BOOK,
                item_name: "JPA1 BOOK".into(),
                order_price: 10_000,
                count: 1,
            }],
            OrderStatus::Order,
            Utc::now(),
        );
        orders
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(delivered)));
        orders.expect_mark_cancelled().never();

        let service = OrderService::new(
            Arc::new(MockMemberRepository::new()),
            Arc::new(MockItemRepository::new()),
            Arc::new(orders),
        );
        let err = service
            .cancel_order(OrderId::new(1))
            .await
            .expect_err("delivered order");
        assert_eq!(err, OrderServiceError::Cancel(CancelError::DeliveryCompleted));
    }

    #[rstest]
    #[tokio::test]
    async fn cancelling_twice_is_rejected() {
        let shop = Arc::new(FixtureShop::seeded());
        let service = service_over(shop.clone());

        let order_id = service
            .place_order(USER_A, JPA1_BOOK, 1)
            .await
            .expect("order placed");
        service.cancel_order(order_id).await.expect("cancelled");
        let err = service
            .cancel_order(order_id)
            .await
            .expect_err("already cancelled");
        assert_eq!(err, OrderServiceError::Cancel(CancelError::AlreadyCancelled));
    }
}
