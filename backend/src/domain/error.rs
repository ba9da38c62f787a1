//! Transport-agnostic error payload returned by the API surface.
//!
//! Domain services and handlers build these; the HTTP adapter maps them onto
//! status codes and a uniform JSON body so every endpoint fails the same way.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Stable machine-readable code naming the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    InvalidRequest,
    /// The requested resource does not exist.
    NotFound,
    /// The request conflicts with the current state (e.g. stock shortage).
    Conflict,
    /// A backing service (database) is unavailable.
    ServiceUnavailable,
    /// An unexpected failure inside the domain.
    InternalError,
}

/// API error payload.
///
/// ## Invariants
/// - `message` is non-empty once trimmed; the constructors enforce this.
///
/// # Examples
/// ```
/// use bookshop_backend::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("member 42 not found");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    #[schema(example = "invalid_request")]
    code: ErrorCode,
    #[schema(example = "count must be positive")]
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl Error {
    /// Build an error payload for the given code and message.
    ///
    /// Falls back to the code's generic description when the message is
    /// blank, so a payload never reaches clients without text.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            generic_message(code).to_owned()
        } else {
            message
        };
        Self {
            code,
            message,
            details: None,
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message shown to clients.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Supplementary structured details, when attached.
    #[must_use]
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach structured details to the payload.
    ///
    /// # Examples
    /// ```
    /// use bookshop_backend::domain::Error;
    /// use serde_json::json;
    ///
    /// let err = Error::invalid_request("bad").with_details(json!({ "field": "name" }));
    /// assert!(err.details().is_some());
    /// ```
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Convenience constructor for [`ErrorCode::ServiceUnavailable`].
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

fn generic_message(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::InvalidRequest => "invalid request",
        ErrorCode::NotFound => "resource not found",
        ErrorCode::Conflict => "request conflicts with current state",
        ErrorCode::ServiceUnavailable => "service unavailable",
        ErrorCode::InternalError => "internal server error",
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn serialises_camel_case_and_snake_case_code() {
        let err = Error::conflict("not enough stock remaining")
            .with_details(json!({ "code": "not_enough_stock" }));
        let value = serde_json::to_value(&err).expect("serialisable");
        assert_eq!(value["code"], "conflict");
        assert_eq!(value["message"], "not enough stock remaining");
        assert_eq!(value["details"]["code"], "not_enough_stock");
    }

    #[rstest]
    fn omits_details_when_absent() {
        let value = serde_json::to_value(Error::not_found("missing")).expect("serialisable");
        assert!(value.get("details").is_none());
    }

    #[rstest]
    fn blank_messages_fall_back_to_generic_text() {
        let err = Error::internal("   ");
        assert_eq!(err.message(), "internal server error");
    }
}
