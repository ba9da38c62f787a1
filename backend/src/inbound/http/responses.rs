//! Response envelopes shared across handler modules.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identifier-only response returned by create endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IdResponse {
    /// Identifier assigned to the created resource.
    pub id: i64,
}

/// Generic `{ "data": … }` envelope used by the DTO-projection listings.
///
/// Wrapping the array leaves room to add envelope fields later without
/// breaking clients, which is the point the v2 listings make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DataEnvelope<T> {
    /// The payload.
    pub data: T,
}

impl<T> DataEnvelope<T> {
    /// Wrap a payload.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
