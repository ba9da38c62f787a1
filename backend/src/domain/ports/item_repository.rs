//! Port abstraction for catalogue item persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Item, ItemId, ItemUpdate, NewItem};

/// Persistence errors raised by item repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemPersistenceError {
    /// Repository connection could not be established.
    #[error("item repository connection failed: {message}")]
    Connection {
        /// Adapter-supplied failure description.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("item repository query failed: {message}")]
    Query {
        /// Adapter-supplied failure description.
        message: String,
    },
}

impl ItemPersistenceError {
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

/// Driven port for catalogue item storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Insert a new item and return it with its assigned identifier.
    async fn create(&self, item: &NewItem) -> Result<Item, ItemPersistenceError>;

    /// Fetch an item by identifier.
    async fn find_by_id(&self, id: ItemId) -> Result<Option<Item>, ItemPersistenceError>;

    /// List all items in identifier order.
    async fn list(&self) -> Result<Vec<Item>, ItemPersistenceError>;

    /// Replace an item's editable fields, returning the updated item when it
    /// exists.
    async fn update(
        &self,
        id: ItemId,
        update: &ItemUpdate,
    ) -> Result<Option<Item>, ItemPersistenceError>;
}
