//! PostgreSQL-backed `OrderQueryRepository` implementation using Diesel.
//!
//! Unlike the aggregate repository, these queries select exactly the columns
//! each response needs and never build domain entities. The cost is coupling:
//! every projection here is fitted to one endpoint's shape.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::Address;
use crate::domain::ports::{
    OrderFlatRow, OrderLineSummary, OrderProjectionError, OrderQueryRepository, OrderSummary,
    SimpleOrderSummary,
};
use crate::domain::OrderSearch;

use super::diesel_helpers::{map_diesel_error, map_pool_error, order_status_from_column};
use super::pool::DbPool;
use super::schema::{deliveries, items, members, order_items, orders};

/// Order head columns shared by every projection.
type HeadColumns = (i64, String, DateTime<Utc>, String, String, String, String);

/// Line columns of a projection row.
type LineColumns = (String, i32, i32);

/// Diesel-backed implementation of the `OrderQueryRepository` port.
#[derive(Clone)]
pub struct DieselOrderQueryRepository {
    pool: DbPool,
}

impl DieselOrderQueryRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Fetch the filtered order heads with their to-one columns joined.
    async fn load_heads(
        &self,
        search: &OrderSearch,
    ) -> Result<Vec<HeadColumns>, OrderProjectionError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let mut query = orders::table
            .inner_join(members::table)
            .inner_join(deliveries::table)
            .select((
                orders::id,
                members::name,
                orders::ordered_at,
                orders::status,
                deliveries::city,
                deliveries::street,
                deliveries::zipcode,
            ))
            .into_boxed();
        if let Some(status) = search.status {
            query = query.filter(orders::status.eq(status.as_str()));
        }
        if let Some(name) = &search.member_name {
            query = query.filter(members::name.like(format!("%{name}%")));
        }

        query
            .order(orders::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel)
    }
}

fn map_pool(error: super::pool::PoolError) -> OrderProjectionError {
    map_pool_error(error, OrderProjectionError::connection)
}

fn map_diesel(error: diesel::result::Error) -> OrderProjectionError {
    map_diesel_error(
        error,
        OrderProjectionError::query,
        OrderProjectionError::connection,
    )
}

fn address_from_columns(
    city: String,
    street: String,
    zipcode: String,
) -> Result<Address, OrderProjectionError> {
    Address::new(city, street, zipcode).map_err(|err| OrderProjectionError::query(err.to_string()))
}

fn simple_summary_from_head(head: HeadColumns) -> Result<SimpleOrderSummary, OrderProjectionError> {
    let (order_id, member_name, ordered_at, status, city, street, zipcode) = head;
    Ok(SimpleOrderSummary {
        order_id,
        member_name,
        ordered_at,
        status: order_status_from_column(&status).map_err(OrderProjectionError::query)?,
        address: address_from_columns(city, street, zipcode)?,
    })
}

fn summary_from_head(
    head: HeadColumns,
    lines: Vec<OrderLineSummary>,
) -> Result<OrderSummary, OrderProjectionError> {
    let simple = simple_summary_from_head(head)?;
    Ok(OrderSummary {
        order_id: simple.order_id,
        member_name: simple.member_name,
        ordered_at: simple.ordered_at,
        status: simple.status,
        address: simple.address,
        lines,
    })
}

fn line_summary_from_columns((item_name, order_price, count): LineColumns) -> OrderLineSummary {
    OrderLineSummary {
        item_name,
        order_price,
        count,
    }
}

#[async_trait]
impl OrderQueryRepository for DieselOrderQueryRepository {
    /// One root query plus one line query per order: 1 + n round trips.
    async fn find_summaries(
        &self,
        search: &OrderSearch,
    ) -> Result<Vec<OrderSummary>, OrderProjectionError> {
        let heads = self.load_heads(search).await?;
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let mut summaries = Vec::with_capacity(heads.len());
        for head in heads {
            let lines: Vec<LineColumns> = order_items::table
                .inner_join(items::table)
                .filter(order_items::order_id.eq(head.0))
                .order(order_items::id.asc())
                .select((items::name, order_items::order_price, order_items::quantity))
                .load(&mut conn)
                .await
                .map_err(map_diesel)?;
            summaries.push(summary_from_head(
                head,
                lines.into_iter().map(line_summary_from_columns).collect(),
            )?);
        }
        Ok(summaries)
    }

    /// One root query plus a single `IN` line query: 2 round trips total,
    /// stitched together in memory.
    async fn find_summaries_batched(
        &self,
        search: &OrderSearch,
    ) -> Result<Vec<OrderSummary>, OrderProjectionError> {
        let heads = self.load_heads(search).await?;
        if heads.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let order_ids: Vec<i64> = heads.iter().map(|head| head.0).collect();
        let rows: Vec<(i64, LineColumns)> = order_items::table
            .inner_join(items::table)
            .filter(order_items::order_id.eq_any(order_ids))
            .order(order_items::id.asc())
            .select((
                order_items::order_id,
                (items::name, order_items::order_price, order_items::quantity),
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        let mut lines_by_order: HashMap<i64, Vec<OrderLineSummary>> = HashMap::new();
        for (order_id, columns) in rows {
            lines_by_order
                .entry(order_id)
                .or_default()
                .push(line_summary_from_columns(columns));
        }

        heads
            .into_iter()
            .map(|head| {
                let lines = lines_by_order.remove(&head.0).unwrap_or_default();
                summary_from_head(head, lines)
            })
            .collect()
    }

    /// One query; the join to the lines fans each order out to one row per
    /// line and the duplication ships to the client as-is.
    async fn find_flat_rows(
        &self,
        search: &OrderSearch,
    ) -> Result<Vec<OrderFlatRow>, OrderProjectionError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let mut query = orders::table
            .inner_join(members::table)
            .inner_join(deliveries::table)
            .inner_join(order_items::table.inner_join(items::table))
            .select((
                orders::id,
                members::name,
                orders::ordered_at,
                orders::status,
                deliveries::city,
                deliveries::street,
                deliveries::zipcode,
                items::name,
                order_items::order_price,
                order_items::quantity,
            ))
            .into_boxed();
        if let Some(status) = search.status {
            query = query.filter(orders::status.eq(status.as_str()));
        }
        if let Some(name) = &search.member_name {
            query = query.filter(members::name.like(format!("%{name}%")));
        }

        type FlatColumns = (
            i64,
            String,
            DateTime<Utc>,
            String,
            String,
            String,
            String,
            String,
            i32,
            i32,
        );
        let rows: Vec<FlatColumns> = query
            .order((orders::id.asc(), order_items::id.asc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows.into_iter()
            .map(
                |(
                    order_id,
                    member_name,
                    ordered_at,
                    status,
                    city,
                    street,
                    zipcode,
                    item_name,
                    order_price,
                    count,
                )| {
                    Ok(OrderFlatRow {
                        order_id,
                        member_name,
                        ordered_at,
                        status: order_status_from_column(&status)
                            .map_err(OrderProjectionError::query)?,
                        address: address_from_columns(city, street, zipcode)?,
                        item_name,
                        order_price,
                        count,
                    })
                },
            )
            .collect()
    }

    /// One query selecting exactly the response's columns.
    async fn find_simple_summaries(
        &self,
        search: &OrderSearch,
    ) -> Result<Vec<SimpleOrderSummary>, OrderProjectionError> {
        let heads = self.load_heads(search).await?;
        heads.into_iter().map(simple_summary_from_head).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderStatus;
    use rstest::rstest;

    fn head() -> HeadColumns {
        (
            1,
            "userA".into(),
            Utc::now(),
            "ORDER".into(),
            "Seoul".into(),
            "Teheran-ro 1".into(),
            "06234".into(),
        )
    }

    #[rstest]
    fn heads_project_into_simple_summaries() {
        let summary = simple_summary_from_head(head()).expect("valid head");
        assert_eq!(summary.order_id, 1);
        assert_eq!(summary.status, OrderStatus::Order);
        assert_eq!(summary.address.city(), "Seoul");
    }

    #[rstest]
    fn unknown_status_columns_become_query_errors() {
        let mut bad = head();
        bad.3 = "PENDING".into();
        let err = simple_summary_from_head(bad).expect_err("unknown status");
        assert!(matches!(err, OrderProjectionError::Query { .. }));
    }

    #[rstest]
    fn summaries_keep_their_line_order() {
        let lines = vec![
            line_summary_from_columns(("JPA1 BOOK".into(), 10_000, 1)),
            line_summary_from_columns(("JPA2 BOOK".into(), 20_000, 2)),
        ];
        let summary = summary_from_head(head(), lines).expect("valid head");
        assert_eq!(summary.lines[0].item_name, "JPA1 BOOK");
        assert_eq!(summary.lines[1].count, 2);
    }
}
