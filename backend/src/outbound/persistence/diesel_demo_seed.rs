//! Idempotent startup seeding of the tutorial demo data set.
//!
//! Inserts two members, four books, and one two-line order per member
//! within a single transaction, with stock already reduced by the seeded
//! orders. Seeding is skipped entirely when any member exists.

use chrono::{TimeZone, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::info;

use super::diesel_helpers::{map_diesel_error, map_pool_error};
use super::models::{NewDeliveryRow, NewItemRow, NewMemberRow, NewOrderItemRow, NewOrderRow};
use super::pool::DbPool;
use super::schema::{deliveries, items, members, order_items, orders};

/// Errors raised while seeding demo data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeedError {
    /// Database connection could not be established.
    #[error("seeding connection failed: {message}")]
    Connection {
        /// Underlying failure description.
        message: String,
    },
    /// A seeding query failed.
    #[error("seeding query failed: {message}")]
    Query {
        /// Underlying failure description.
        message: String,
    },
}

impl SeedError {
    fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Outcome of a seeding attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The demo data set was inserted.
    Applied,
    /// Members already exist; nothing was written.
    AlreadySeeded,
}

struct SeedBook<'a> {
    name: &'a str,
    price: i32,
    stock: i32,
    author: &'a str,
    isbn: &'a str,
}

async fn insert_member(
    conn: &mut AsyncPgConnection,
    name: &str,
    age: i32,
    address: (&str, &str, &str),
) -> Result<i64, diesel::result::Error> {
    let (city, street, zipcode) = address;
    diesel::insert_into(members::table)
        .values(&NewMemberRow {
            name,
            age,
            city,
            street,
            zipcode,
        })
        .returning(members::id)
        .get_result(conn)
        .await
}

async fn insert_book(
    conn: &mut AsyncPgConnection,
    book: SeedBook<'_>,
) -> Result<i64, diesel::result::Error> {
    diesel::insert_into(items::table)
        .values(&NewItemRow {
            name: book.name,
            price: book.price,
            stock_quantity: book.stock,
            kind: "BOOK",
            author: Some(book.author),
            isbn: Some(book.isbn),
        })
        .returning(items::id)
        .get_result(conn)
        .await
}

async fn insert_order(
    conn: &mut AsyncPgConnection,
    member_id: i64,
    address: (&str, &str, &str),
    ordered_at: chrono::DateTime<Utc>,
    lines: &[(i64, i32, i32)],
) -> Result<(), diesel::result::Error> {
    let (city, street, zipcode) = address;
    let delivery_id: i64 = diesel::insert_into(deliveries::table)
        .values(&NewDeliveryRow {
            city,
            street,
            zipcode,
            status: "READY",
        })
        .returning(deliveries::id)
        .get_result(conn)
        .await?;

    let order_id: i64 = diesel::insert_into(orders::table)
        .values(&NewOrderRow {
            member_id,
            delivery_id,
            status: "ORDER",
            ordered_at,
        })
        .returning(orders::id)
        .get_result(conn)
        .await?;

    let rows: Vec<NewOrderItemRow> = lines
        .iter()
        .map(|&(item_id, order_price, quantity)| NewOrderItemRow {
            order_id,
            item_id,
            order_price,
            quantity,
        })
        .collect();
    diesel::insert_into(order_items::table)
        .values(&rows)
        .execute(conn)
        .await?;

    // The seeded orders have already consumed stock.
    for &(item_id, _, quantity) in lines {
        diesel::update(items::table.find(item_id))
            .set(items::stock_quantity.eq(items::stock_quantity - quantity))
            .execute(conn)
            .await?;
    }
    Ok(())
}

/// Seed the demo data set unless members already exist.
///
/// # Errors
///
/// Returns [`SeedError`] when the pool or any seeding query fails; the
/// transaction rolls back and nothing is written.
pub async fn seed_demo_data(pool: &DbPool) -> Result<SeedOutcome, SeedError> {
    let mut conn = pool
        .get()
        .await
        .map_err(|err| map_pool_error(err, SeedError::connection))?;

    let outcome = conn
        .transaction(|conn| {
            async move {
                let existing: i64 = members::table.count().get_result(conn).await?;
                if existing > 0 {
                    return Ok(SeedOutcome::AlreadySeeded);
                }

                let seoul = ("Seoul", "Teheran-ro 1", "06234");
                let busan = ("Busan", "Suyeong-ro 2", "48265");

                let member_a = insert_member(conn, "userA", 32, seoul).await?;
                let member_b = insert_member(conn, "userB", 28, busan).await?;

                let jpa1 = insert_book(
                    conn,
                    SeedBook {
                        name: "JPA1 BOOK",
                        price: 10_000,
                        stock: 100,
                        author: "Kim",
                        isbn: "978-89-001",
                    },
                )
                .await?;
                let jpa2 = insert_book(
                    conn,
                    SeedBook {
                        name: "JPA2 BOOK",
                        price: 20_000,
                        stock: 100,
                        author: "Kim",
                        isbn: "978-89-002",
                    },
                )
                .await?;
                let spring1 = insert_book(
                    conn,
                    SeedBook {
                        name: "SPRING1 BOOK",
                        price: 20_000,
                        stock: 200,
                        author: "Lee",
                        isbn: "978-89-003",
                    },
                )
                .await?;
                let spring2 = insert_book(
                    conn,
                    SeedBook {
                        name: "SPRING2 BOOK",
                        price: 40_000,
                        stock: 300,
                        author: "Lee",
                        isbn: "978-89-004",
                    },
                )
                .await?;

                let first_placed = Utc
                    .with_ymd_and_hms(2024, 3, 1, 10, 0, 0)
                    .single()
                    .ok_or(diesel::result::Error::RollbackTransaction)?;
                let second_placed = Utc
                    .with_ymd_and_hms(2024, 3, 2, 14, 30, 0)
                    .single()
                    .ok_or(diesel::result::Error::RollbackTransaction)?;

                insert_order(
                    conn,
                    member_a,
                    seoul,
                    first_placed,
                    &[(jpa1, 10_000, 1), (jpa2, 20_000, 2)],
                )
                .await?;
                insert_order(
                    conn,
                    member_b,
                    busan,
                    second_placed,
                    &[(spring1, 20_000, 3), (spring2, 40_000, 4)],
                )
                .await?;

                Ok(SeedOutcome::Applied)
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_diesel_error(err, SeedError::query, SeedError::connection))?;

    match outcome {
        SeedOutcome::Applied => info!("demo data seeded"),
        SeedOutcome::AlreadySeeded => info!("demo data already present, seeding skipped"),
    }
    Ok(outcome)
}
