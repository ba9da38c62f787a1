//! PostgreSQL-backed `ItemRepository` implementation using Diesel.
//!
//! Item subtypes share one table; the `kind` column discriminates and the
//! subtype columns are nullable. The adapter owns that encoding, the domain
//! only ever sees [`crate::domain::ItemKind`].

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ItemPersistenceError, ItemRepository};
use crate::domain::{Item, ItemId, ItemKind, ItemUpdate, NewItem};

use super::diesel_helpers::{item_from_row, map_diesel_error, map_pool_error};
use super::models::{ItemChangeset, ItemRow, NewItemRow};
use super::pool::DbPool;
use super::schema::items;

/// Diesel-backed implementation of the `ItemRepository` port.
#[derive(Clone)]
pub struct DieselItemRepository {
    pool: DbPool,
}

impl DieselItemRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: super::pool::PoolError) -> ItemPersistenceError {
    map_pool_error(error, ItemPersistenceError::connection)
}

fn map_diesel(error: diesel::result::Error) -> ItemPersistenceError {
    map_diesel_error(
        error,
        ItemPersistenceError::query,
        ItemPersistenceError::connection,
    )
}

/// Split a kind into its column encoding.
fn kind_columns(kind: &ItemKind) -> (&'static str, Option<&str>, Option<&str>) {
    match kind {
        ItemKind::Book { author, isbn } => {
            (kind.discriminator(), Some(author.as_str()), Some(isbn.as_str()))
        }
    }
}

#[async_trait]
impl ItemRepository for DieselItemRepository {
    async fn create(&self, item: &NewItem) -> Result<Item, ItemPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let (kind, author, isbn) = kind_columns(&item.kind);
        let row = NewItemRow {
            name: &item.name,
            price: item.price,
            stock_quantity: item.stock_quantity,
            kind,
            author,
            isbn,
        };
        let inserted: ItemRow = diesel::insert_into(items::table)
            .values(&row)
            .returning(ItemRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel)?;

        item_from_row(inserted).map_err(ItemPersistenceError::query)
    }

    async fn find_by_id(&self, id: ItemId) -> Result<Option<Item>, ItemPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row: Option<ItemRow> = items::table
            .find(id.value())
            .select(ItemRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(|row| item_from_row(row).map_err(ItemPersistenceError::query))
            .transpose()
    }

    async fn list(&self) -> Result<Vec<Item>, ItemPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<ItemRow> = items::table
            .order(items::id.asc())
            .select(ItemRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows.into_iter()
            .map(|row| item_from_row(row).map_err(ItemPersistenceError::query))
            .collect()
    }

    async fn update(
        &self,
        id: ItemId,
        update: &ItemUpdate,
    ) -> Result<Option<Item>, ItemPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let (kind, author, isbn) = kind_columns(&update.kind);
        let changeset = ItemChangeset {
            name: &update.name,
            price: update.price,
            stock_quantity: update.stock_quantity,
            kind,
            author,
            isbn,
        };
        let row: Option<ItemRow> = diesel::update(items::table.find(id.value()))
            .set(&changeset)
            .returning(ItemRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(|row| item_from_row(row).map_err(ItemPersistenceError::query))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn book_kind_encodes_its_subtype_columns() {
        let kind = ItemKind::Book {
            author: "Kim".into(),
            isbn: "978-89-001".into(),
        };
        let (discriminator, author, isbn) = kind_columns(&kind);
        assert_eq!(discriminator, "BOOK");
        assert_eq!(author, Some("Kim"));
        assert_eq!(isbn, Some("978-89-001"));
    }

    #[rstest]
    fn diesel_database_errors_map_to_query_errors() {
        let err = map_diesel(diesel::result::Error::NotFound);
        assert!(matches!(err, ItemPersistenceError::Query { .. }));
    }
}
