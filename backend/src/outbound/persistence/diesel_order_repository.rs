//! PostgreSQL-backed `OrderRepository` implementation using Diesel.
//!
//! Mutations run inside a single transaction so the order rows and the stock
//! writes commit or roll back together. Each listing method documents the
//! number of queries it issues; the spread is deliberate, the order endpoints
//! exist to contrast the strategies.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use pagination::PageRequest;

use crate::domain::ports::{OrderPersistenceError, OrderRepository, StockAdjustment};
use crate::domain::{
    Delivery, DeliveryId, DeliveryStatus, ItemId, MemberId, NewOrder, Order, OrderDetail,
    OrderHead, OrderId, OrderLine, OrderSearch, OrderStatus, OrderWithParties,
};

use super::diesel_helpers::{
    delivery_from_row, map_diesel_error, map_pool_error, member_from_row, order_status_from_column,
};
use super::models::{
    DeliveryRow, MemberRow, NewDeliveryRow, NewOrderItemRow, NewOrderRow, OrderRow,
};
use super::pool::DbPool;
use super::schema::{deliveries, items, members, order_items, orders};

/// Line columns selected alongside joined item names.
type LineColumns = (i64, String, i32, i32);

/// Diesel-backed implementation of the `OrderRepository` port.
#[derive(Clone)]
pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: super::pool::PoolError) -> OrderPersistenceError {
    map_pool_error(error, OrderPersistenceError::connection)
}

fn map_diesel(error: diesel::result::Error) -> OrderPersistenceError {
    map_diesel_error(
        error,
        OrderPersistenceError::query,
        OrderPersistenceError::connection,
    )
}

fn line_from_columns((item_id, item_name, order_price, count): LineColumns) -> OrderLine {
    OrderLine {
        item_id: ItemId::new(item_id),
        item_name,
        order_price,
        count,
    }
}

fn parties_from_rows(
    order: OrderRow,
    member: MemberRow,
    delivery: DeliveryRow,
) -> Result<OrderWithParties, OrderPersistenceError> {
    Ok(OrderWithParties {
        id: OrderId::new(order.id),
        member: member_from_row(member).map_err(OrderPersistenceError::query)?,
        delivery: delivery_from_row(delivery).map_err(OrderPersistenceError::query)?,
        status: order_status_from_column(&order.status).map_err(OrderPersistenceError::query)?,
        ordered_at: order.ordered_at,
    })
}

/// `LIKE` pattern for the member-name substring filter.
fn name_pattern(name: &str) -> String {
    format!("%{name}%")
}

#[async_trait]
impl OrderRepository for DieselOrderRepository {
    async fn place(
        &self,
        order: &NewOrder,
        stock: &[StockAdjustment],
    ) -> Result<OrderId, OrderPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let order_id = conn
            .transaction(|conn| {
                async move {
                    let delivery_row = NewDeliveryRow {
                        city: order.delivery_address.city(),
                        street: order.delivery_address.street(),
                        zipcode: order.delivery_address.zipcode(),
                        status: DeliveryStatus::Ready.as_str(),
                    };
                    let delivery_id: i64 = diesel::insert_into(deliveries::table)
                        .values(&delivery_row)
                        .returning(deliveries::id)
                        .get_result(conn)
                        .await?;

                    let order_row = NewOrderRow {
                        member_id: order.member_id.value(),
                        delivery_id,
                        status: OrderStatus::Order.as_str(),
                        ordered_at: order.ordered_at,
                    };
                    let order_id: i64 = diesel::insert_into(orders::table)
                        .values(&order_row)
                        .returning(orders::id)
                        .get_result(conn)
                        .await?;

                    let line_rows: Vec<NewOrderItemRow> = order
                        .lines
                        .iter()
                        .map(|line| NewOrderItemRow {
                            order_id,
                            item_id: line.item_id.value(),
                            order_price: line.order_price,
                            quantity: line.count,
                        })
                        .collect();
                    diesel::insert_into(order_items::table)
                        .values(&line_rows)
                        .execute(conn)
                        .await?;

                    for adjustment in stock {
                        diesel::update(items::table.find(adjustment.item_id.value()))
                            .set(
                                items::stock_quantity.eq(items::stock_quantity + adjustment.delta),
                            )
                            .execute(conn)
                            .await?;
                    }

                    Ok::<i64, diesel::result::Error>(order_id)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel)?;

        Ok(OrderId::new(order_id))
    }

    async fn mark_cancelled(
        &self,
        id: OrderId,
        stock: &[StockAdjustment],
    ) -> Result<(), OrderPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        conn.transaction(|conn| {
            async move {
                let updated = diesel::update(orders::table.find(id.value()))
                    .set(orders::status.eq(OrderStatus::Cancel.as_str()))
                    .execute(conn)
                    .await?;
                if updated == 0 {
                    return Err(diesel::result::Error::NotFound);
                }

                for adjustment in stock {
                    diesel::update(items::table.find(adjustment.item_id.value()))
                        .set(items::stock_quantity.eq(items::stock_quantity + adjustment.delta))
                        .execute(conn)
                        .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, OrderPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row: Option<OrderRow> = orders::table
            .find(id.value())
            .select(OrderRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;
        let Some(row) = row else {
            return Ok(None);
        };

        let delivery_row: DeliveryRow = deliveries::table
            .find(row.delivery_id)
            .select(DeliveryRow::as_select())
            .first(&mut conn)
            .await
            .map_err(map_diesel)?;
        let delivery: Delivery =
            delivery_from_row(delivery_row).map_err(OrderPersistenceError::query)?;

        let lines: Vec<LineColumns> = order_items::table
            .inner_join(items::table)
            .filter(order_items::order_id.eq(row.id))
            .order(order_items::id.asc())
            .select((
                order_items::item_id,
                items::name,
                order_items::order_price,
                order_items::quantity,
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        Ok(Some(Order::new(
            OrderId::new(row.id),
            MemberId::new(row.member_id),
            delivery,
            lines.into_iter().map(line_from_columns).collect(),
            order_status_from_column(&row.status).map_err(OrderPersistenceError::query)?,
            row.ordered_at,
        )))
    }

    /// Single query for the roots; the caller pays for associations row by
    /// row afterwards.
    async fn find_heads(
        &self,
        search: &OrderSearch,
    ) -> Result<Vec<OrderHead>, OrderPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let mut query = orders::table
            .inner_join(members::table)
            .select(OrderRow::as_select())
            .into_boxed();
        if let Some(status) = search.status {
            query = query.filter(orders::status.eq(status.as_str()));
        }
        if let Some(name) = &search.member_name {
            query = query.filter(members::name.like(name_pattern(name)));
        }

        let rows: Vec<OrderRow> = query
            .order(orders::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows.into_iter()
            .map(|row| {
                Ok(OrderHead {
                    id: OrderId::new(row.id),
                    member_id: MemberId::new(row.member_id),
                    delivery_id: DeliveryId::new(row.delivery_id),
                    status: order_status_from_column(&row.status)
                        .map_err(OrderPersistenceError::query)?,
                    ordered_at: row.ordered_at,
                })
            })
            .collect()
    }

    async fn find_delivery(
        &self,
        id: DeliveryId,
    ) -> Result<Option<Delivery>, OrderPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row: Option<DeliveryRow> = deliveries::table
            .find(id.value())
            .select(DeliveryRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(|row| delivery_from_row(row).map_err(OrderPersistenceError::query))
            .transpose()
    }

    async fn find_lines(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<OrderLine>, OrderPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<LineColumns> = order_items::table
            .inner_join(items::table)
            .filter(order_items::order_id.eq(order_id.value()))
            .order(order_items::id.asc())
            .select((
                order_items::item_id,
                items::name,
                order_items::order_price,
                order_items::quantity,
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        Ok(rows.into_iter().map(line_from_columns).collect())
    }

    /// One `IN` query regardless of how many orders are given.
    async fn find_lines_for_orders(
        &self,
        order_ids: &[OrderId],
    ) -> Result<HashMap<OrderId, Vec<OrderLine>>, OrderPersistenceError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let ids: Vec<i64> = order_ids.iter().map(|id| id.value()).collect();
        let rows: Vec<(i64, LineColumns)> = order_items::table
            .inner_join(items::table)
            .filter(order_items::order_id.eq_any(ids))
            .order(order_items::id.asc())
            .select((
                order_items::order_id,
                (
                    order_items::item_id,
                    items::name,
                    order_items::order_price,
                    order_items::quantity,
                ),
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        let mut grouped: HashMap<OrderId, Vec<OrderLine>> = HashMap::new();
        for (order_id, columns) in rows {
            grouped
                .entry(OrderId::new(order_id))
                .or_default()
                .push(line_from_columns(columns));
        }
        Ok(grouped)
    }

    /// Single query joining the to-one associations.
    async fn find_with_parties(
        &self,
        search: &OrderSearch,
    ) -> Result<Vec<OrderWithParties>, OrderPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let mut query = orders::table
            .inner_join(members::table)
            .inner_join(deliveries::table)
            .select((
                OrderRow::as_select(),
                MemberRow::as_select(),
                DeliveryRow::as_select(),
            ))
            .into_boxed();
        if let Some(status) = search.status {
            query = query.filter(orders::status.eq(status.as_str()));
        }
        if let Some(name) = &search.member_name {
            query = query.filter(members::name.like(name_pattern(name)));
        }

        let rows: Vec<(OrderRow, MemberRow, DeliveryRow)> = query
            .order(orders::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows.into_iter()
            .map(|(order, member, delivery)| parties_from_rows(order, member, delivery))
            .collect()
    }

    /// Only to-one associations are joined, so row count equals order count
    /// and the database applies offset/limit correctly.
    async fn find_page_with_parties(
        &self,
        search: &OrderSearch,
        page: &PageRequest,
    ) -> Result<Vec<OrderWithParties>, OrderPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let mut query = orders::table
            .inner_join(members::table)
            .inner_join(deliveries::table)
            .select((
                OrderRow::as_select(),
                MemberRow::as_select(),
                DeliveryRow::as_select(),
            ))
            .into_boxed();
        if let Some(status) = search.status {
            query = query.filter(orders::status.eq(status.as_str()));
        }
        if let Some(name) = &search.member_name {
            query = query.filter(members::name.like(name_pattern(name)));
        }

        let rows: Vec<(OrderRow, MemberRow, DeliveryRow)> = query
            .order(orders::id.asc())
            .offset(page.offset())
            .limit(page.limit())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows.into_iter()
            .map(|(order, member, delivery)| parties_from_rows(order, member, delivery))
            .collect()
    }

    /// Single query with the line collection joined in. The join fans each
    /// order out to one row per line, so rows are collapsed back into
    /// aggregates here and offset/limit cannot be pushed to the database.
    async fn find_detailed(
        &self,
        search: &OrderSearch,
    ) -> Result<Vec<OrderDetail>, OrderPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let mut query = orders::table
            .inner_join(members::table)
            .inner_join(deliveries::table)
            .inner_join(order_items::table.inner_join(items::table))
            .select((
                OrderRow::as_select(),
                MemberRow::as_select(),
                DeliveryRow::as_select(),
                (
                    order_items::item_id,
                    items::name,
                    order_items::order_price,
                    order_items::quantity,
                ),
            ))
            .into_boxed();
        if let Some(status) = search.status {
            query = query.filter(orders::status.eq(status.as_str()));
        }
        if let Some(name) = &search.member_name {
            query = query.filter(members::name.like(name_pattern(name)));
        }

        let rows: Vec<(OrderRow, MemberRow, DeliveryRow, LineColumns)> = query
            .order((orders::id.asc(), order_items::id.asc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        let mut details: Vec<OrderDetail> = Vec::new();
        let mut index_by_order: HashMap<i64, usize> = HashMap::new();
        for (order, member, delivery, columns) in rows {
            let order_pk = order.id;
            if let Some(&index) = index_by_order.get(&order_pk) {
                details[index].lines.push(line_from_columns(columns));
            } else {
                let parties = parties_from_rows(order, member, delivery)?;
                index_by_order.insert(order_pk, details.len());
                details.push(OrderDetail {
                    id: parties.id,
                    member: parties.member,
                    delivery: parties.delivery,
                    lines: vec![line_from_columns(columns)],
                    status: parties.status,
                    ordered_at: parties.ordered_at,
                });
            }
        }
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn line_columns_map_onto_order_lines() {
        let line = line_from_columns((3, "JPA1 BOOK".into(), 10_000, 2));
        assert_eq!(line.item_id, ItemId::new(3));
        assert_eq!(line.total_price(), 20_000);
    }

    #[rstest]
    fn name_filter_matches_substrings() {
        assert_eq!(name_pattern("userA"), "%userA%");
    }

    #[rstest]
    fn unknown_status_columns_become_query_errors() {
        let row = OrderRow {
            id: 1,
            member_id: 1,
            delivery_id: 1,
            status: "PENDING".into(),
            ordered_at: chrono::Utc::now(),
        };
        let member = MemberRow {
            id: 1,
            name: "userA".into(),
            age: 32,
            city: "Seoul".into(),
            street: "Teheran-ro 1".into(),
            zipcode: "06234".into(),
        };
        let delivery = DeliveryRow {
            id: 1,
            city: "Seoul".into(),
            street: "Teheran-ro 1".into(),
            zipcode: "06234".into(),
            status: "READY".into(),
        };
        let err = parties_from_rows(row, member, delivery).expect_err("unknown status");
        assert!(matches!(err, OrderPersistenceError::Query { .. }));
    }
}
