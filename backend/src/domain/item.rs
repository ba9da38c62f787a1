//! Catalogue item aggregate and its stock bookkeeping.
//!
//! Items are a single-table specialisation: every row carries name, price,
//! and stock, and the [`ItemKind`] tagged variant holds the subtype fields
//! (currently only books).

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Item primary key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct ItemId(i64);

impl ItemId {
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

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Subtype-specific fields of a catalogue item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    /// A book with author and ISBN.
    Book {
        /// Author name.
        author: String,
        /// International Standard Book Number.
        isbn: String,
    },
}

impl ItemKind {
    /// Discriminator string persisted alongside the row.
    #[must_use]
    pub fn discriminator(&self) -> &'static str {
        match self {
            Self::Book { .. } => "BOOK",
        }
    }
}

/// Signals a stock deduction that would drive the quantity negative.
///
/// The message is fixed and user-facing; handlers surface it verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("not enough stock remaining")]
pub struct NotEnoughStock;

/// Validation errors raised by item constructors and stock operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemValidationError {
    /// Name is empty once trimmed.
    #[error("item name must not be empty")]
    EmptyName,
    /// Price is negative.
    #[error("item price must not be negative (got {0})")]
    NegativePrice(i32),
    /// Stock quantity is negative.
    #[error("item stock must not be negative (got {0})")]
    NegativeStock(i32),
}

/// A persisted catalogue item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    id: ItemId,
    name: String,
    price: i32,
    stock_quantity: i32,
    kind: ItemKind,
}

impl Item {
    /// Rehydrate an item from persisted state.
    ///
    /// # Errors
    ///
    /// Returns [`ItemValidationError`] for blank names or negative
    /// price/stock values.
    pub fn new(
        id: ItemId,
        name: impl Into<String>,
        price: i32,
        stock_quantity: i32,
        kind: ItemKind,
    ) -> Result<Self, ItemValidationError> {
        let draft = NewItem::new(name, price, stock_quantity, kind)?;
        Ok(Self {
            id,
            name: draft.name,
            price: draft.price,
            stock_quantity: draft.stock_quantity,
            kind: draft.kind,
        })
    }

    /// Primary key.
    #[must_use]
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit price.
    #[must_use]
    pub fn price(&self) -> i32 {
        self.price
    }

    /// Units currently in stock.
    #[must_use]
    pub fn stock_quantity(&self) -> i32 {
        self.stock_quantity
    }

    /// Subtype fields.
    #[must_use]
    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    /// Return units to stock (order cancellation).
    pub fn add_stock(&mut self, quantity: i32) {
        self.stock_quantity = self.stock_quantity.saturating_add(quantity);
    }

    /// Deduct units from stock (order placement).
    ///
    /// The deduction is all-or-nothing: on shortfall the stock is left
    /// unchanged and [`NotEnoughStock`] is returned.
    ///
    /// # Errors
    ///
    /// Returns [`NotEnoughStock`] when fewer than `quantity` units remain.
    pub fn remove_stock(&mut self, quantity: i32) -> Result<(), NotEnoughStock> {
        let rest = self.stock_quantity - quantity;
        if rest < 0 {
            return Err(NotEnoughStock);
        }
        self.stock_quantity = rest;
        Ok(())
    }

    /// Apply a full-field update (admin edit screen).
    ///
    /// # Errors
    ///
    /// Returns [`ItemValidationError`] when the new values are invalid; the
    /// item is left unchanged in that case.
    pub fn apply_update(&mut self, update: ItemUpdate) -> Result<(), ItemValidationError> {
        let draft = NewItem::new(update.name, update.price, update.stock_quantity, update.kind)?;
        self.name = draft.name;
        self.price = draft.price;
        self.stock_quantity = draft.stock_quantity;
        self.kind = draft.kind;
        Ok(())
    }
}

/// An item awaiting persistence (no identifier yet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    /// Display name, validated non-blank.
    pub name: String,
    /// Unit price, validated non-negative.
    pub price: i32,
    /// Initial stock, validated non-negative.
    pub stock_quantity: i32,
    /// Subtype fields.
    pub kind: ItemKind,
}

impl NewItem {
    /// Validate and build a draft item.
    ///
    /// # Errors
    ///
    /// Returns [`ItemValidationError`] for blank names or negative
    /// price/stock values.
    pub fn new(
        name: impl Into<String>,
        price: i32,
        stock_quantity: i32,
        kind: ItemKind,
    ) -> Result<Self, ItemValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ItemValidationError::EmptyName);
        }
        if price < 0 {
            return Err(ItemValidationError::NegativePrice(price));
        }
        if stock_quantity < 0 {
            return Err(ItemValidationError::NegativeStock(stock_quantity));
        }
        Ok(Self {
            name,
            price,
            stock_quantity,
            kind,
        })
    }
}

/// Full-field item update payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemUpdate {
    /// New display name.
    pub name: String,
    /// New unit price.
    pub price: i32,
    /// New stock quantity.
    pub stock_quantity: i32,
    /// New subtype fields.
    pub kind: ItemKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn book(stock: i32) -> Item {
        Item::new(
            ItemId::new(1),
            "JPA1 BOOK",
            10_000,
            stock,
            ItemKind::Book {
                author: "Kim".into(),
                isbn: "978-89-0000-000-0".into(),
            },
        )
        .expect("valid item")
    }

    #[rstest]
    fn remove_stock_within_bounds_decrements() {
        let mut item = book(10);
        item.remove_stock(4).expect("stock available");
        assert_eq!(item.stock_quantity(), 6);
    }

    #[rstest]
    fn remove_stock_beyond_bounds_fails_and_keeps_stock() {
        let mut item = book(10);
        let err = item.remove_stock(11).expect_err("shortfall");
        assert_eq!(err.to_string(), "not enough stock remaining");
        assert_eq!(item.stock_quantity(), 10);
    }

    #[rstest]
    fn add_stock_restores_units() {
        let mut item = book(8);
        item.add_stock(2);
        assert_eq!(item.stock_quantity(), 10);
    }

    #[rstest]
    fn update_rejects_negative_price_and_keeps_state() {
        let mut item = book(5);
        let err = item
            .apply_update(ItemUpdate {
                name: "JPA1 BOOK".into(),
                price: -1,
                stock_quantity: 5,
                kind: item.kind().clone(),
            })
            .expect_err("negative price");
        assert_eq!(err, ItemValidationError::NegativePrice(-1));
        assert_eq!(item.price(), 10_000);
    }
}
