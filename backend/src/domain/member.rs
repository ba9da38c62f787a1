//! Member aggregate: a registered customer with an embedded address.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::Address;

/// Member primary key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct MemberId(i64);

impl MemberId {
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

impl std::fmt::Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation errors raised by member constructors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemberValidationError {
    /// Name is empty once trimmed.
    #[error("member name must not be empty")]
    EmptyName,
    /// Age is negative.
    #[error("member age must not be negative (got {0})")]
    NegativeAge(i32),
}

/// A persisted member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    id: MemberId,
    name: String,
    age: i32,
    address: Address,
}

impl Member {
    /// Rehydrate a member from persisted state.
    ///
    /// # Errors
    ///
    /// Returns [`MemberValidationError`] when the stored name is blank or the
    /// age is negative; adapters surface that as a query failure.
    pub fn new(
        id: MemberId,
        name: impl Into<String>,
        age: i32,
        address: Address,
    ) -> Result<Self, MemberValidationError> {
        let NewMember { name, age, address } = NewMember::new(name, age, address)?;
        Ok(Self {
            id,
            name,
            age,
            address,
        })
    }

    /// Primary key.
    #[must_use]
    pub fn id(&self) -> MemberId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Age in years.
    #[must_use]
    pub fn age(&self) -> i32 {
        self.age
    }

    /// Embedded postal address.
    #[must_use]
    pub fn address(&self) -> &Address {
        &self.address
    }
}

/// A member awaiting persistence (no identifier yet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    /// Display name, validated non-blank.
    pub name: String,
    /// Age in years, validated non-negative.
    pub age: i32,
    /// Embedded postal address.
    pub address: Address,
}

impl NewMember {
    /// Validate and build a draft member.
    ///
    /// # Errors
    ///
    /// Returns [`MemberValidationError`] for a blank name or negative age.
    pub fn new(
        name: impl Into<String>,
        age: i32,
        address: Address,
    ) -> Result<Self, MemberValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(MemberValidationError::EmptyName);
        }
        if age < 0 {
            return Err(MemberValidationError::NegativeAge(age));
        }
        Ok(Self { name, age, address })
    }
}
