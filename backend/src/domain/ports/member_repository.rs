//! Port abstraction for member persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Member, MemberId, NewMember};

/// Persistence errors raised by member repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemberPersistenceError {
    /// Repository connection could not be established.
    #[error("member repository connection failed: {message}")]
    Connection {
        /// Adapter-supplied failure description.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("member repository query failed: {message}")]
    Query {
        /// Adapter-supplied failure description.
        message: String,
    },
}

impl MemberPersistenceError {
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

/// Driven port for member storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Insert a new member and return it with its assigned identifier.
    async fn create(&self, member: &NewMember) -> Result<Member, MemberPersistenceError>;

    /// Fetch a member by identifier.
    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>, MemberPersistenceError>;

    /// List all members in identifier order.
    async fn list(&self) -> Result<Vec<Member>, MemberPersistenceError>;

    /// Change a member's name, returning the updated member when it exists.
    async fn rename(
        &self,
        id: MemberId,
        name: &str,
    ) -> Result<Option<Member>, MemberPersistenceError>;
}
