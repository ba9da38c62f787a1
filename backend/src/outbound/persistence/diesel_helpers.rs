//! Shared row-to-domain conversions and error mapping for the Diesel adapters.

use std::str::FromStr;

use tracing::debug;

use crate::domain::{
    Address, Delivery, DeliveryId, DeliveryStatus, Item, ItemId, ItemKind, Member, MemberId,
    OrderStatus,
};

use super::models::{DeliveryRow, ItemRow, MemberRow};
use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error constructor.
pub(crate) fn map_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map common Diesel error variants into query/connection constructors.
///
/// Detail stays at debug level; the returned messages are generic so they can
/// cross the HTTP boundary without leaking database internals.
pub(crate) fn map_diesel_error<E, Q, C>(
    error: diesel::result::Error,
    query: Q,
    connection: C,
) -> E
where
    Q: Fn(&'static str) -> E,
    C: Fn(&'static str) -> E,
{
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::DatabaseError(_, _) => query("database error"),
        _ => query("database error"),
    }
}

/// Convert a members row to the domain entity.
pub(crate) fn member_from_row(row: MemberRow) -> Result<Member, String> {
    let address =
        Address::new(row.city, row.street, row.zipcode).map_err(|err| err.to_string())?;
    Member::new(MemberId::new(row.id), row.name, row.age, address)
        .map_err(|err| err.to_string())
}

/// Convert an items row to the domain entity, resolving the subtype from the
/// discriminator column.
pub(crate) fn item_from_row(row: ItemRow) -> Result<Item, String> {
    let kind = match row.kind.as_str() {
        "BOOK" => ItemKind::Book {
            author: row
                .author
                .ok_or_else(|| format!("item {} is a BOOK without an author", row.id))?,
            isbn: row
                .isbn
                .ok_or_else(|| format!("item {} is a BOOK without an isbn", row.id))?,
        },
        other => return Err(format!("item {} has unknown kind {other:?}", row.id)),
    };
    Item::new(ItemId::new(row.id), row.name, row.price, row.stock_quantity, kind)
        .map_err(|err| err.to_string())
}

/// Convert a deliveries row to the domain value.
pub(crate) fn delivery_from_row(row: DeliveryRow) -> Result<Delivery, String> {
    let address =
        Address::new(row.city, row.street, row.zipcode).map_err(|err| err.to_string())?;
    let status = DeliveryStatus::from_str(&row.status).map_err(|err| err.to_string())?;
    Ok(Delivery {
        id: DeliveryId::new(row.id),
        address,
        status,
    })
}

/// Parse an order status column value.
pub(crate) fn order_status_from_column(value: &str) -> Result<OrderStatus, String> {
    OrderStatus::from_str(value).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn book_rows_resolve_to_the_book_kind() {
        let row = ItemRow {
            id: 1,
            name: "JPA1 BOOK".into(),
            price: 10_000,
            stock_quantity: 100,
            kind: "BOOK".into(),
            author: Some("Kim".into()),
            isbn: Some("978-89-001".into()),
        };
        let item = item_from_row(row).expect("valid row");
        assert!(matches!(item.kind(), ItemKind::Book { .. }));
    }

    #[rstest]
    #[case(None, Some("978-89-001"))]
    #[case(Some("Kim"), None)]
    fn book_rows_missing_subtype_columns_are_rejected(
        #[case] author: Option<&str>,
        #[case] isbn: Option<&str>,
    ) {
        let row = ItemRow {
            id: 7,
            name: "JPA1 BOOK".into(),
            price: 10_000,
            stock_quantity: 100,
            kind: "BOOK".into(),
            author: author.map(str::to_owned),
            isbn: isbn.map(str::to_owned),
        };
        assert!(item_from_row(row).is_err());
    }

    #[rstest]
    fn unknown_kinds_are_rejected() {
        let row = ItemRow {
            id: 2,
            name: "Nocturne".into(),
            price: 30_000,
            stock_quantity: 5,
            kind: "ALBUM".into(),
            author: None,
            isbn: None,
        };
        let err = item_from_row(row).expect_err("unknown kind");
        assert!(err.contains("ALBUM"));
    }

    #[rstest]
    fn unknown_delivery_status_is_rejected() {
        let row = DeliveryRow {
            id: 3,
            city: "Seoul".into(),
            street: "Teheran-ro 1".into(),
            zipcode: "06234".into(),
            status: "SHIPPED".into(),
        };
        assert!(delivery_from_row(row).is_err());
    }
}
