//! Offset pagination primitives shared by backend listing endpoints.
//!
//! Collection listings accept an `offset`/`limit` pair, clamp the limit to a
//! server-side ceiling, and return a [`Page`] envelope carrying the items
//! together with an opaque continuation token for the next page. The token is
//! a versioned base64 string so clients cannot depend on its internals.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token prefix identifying the encoding version.
const TOKEN_VERSION: &str = "v1";

/// Validation errors raised when constructing a [`PageRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageRequestError {
    /// Offset was negative.
    #[error("offset must not be negative (got {0})")]
    NegativeOffset(i64),
    /// Limit was zero or negative.
    #[error("limit must be positive (got {0})")]
    NonPositiveLimit(i64),
}

/// Errors raised when decoding a continuation token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageTokenError {
    /// The token was not valid base64 or did not contain UTF-8 text.
    #[error("continuation token is not decodable")]
    Malformed,
    /// The token decoded but carried an unsupported version or payload.
    #[error("continuation token has an unsupported format")]
    UnsupportedFormat,
}

/// A validated offset/limit pair for a listing query.
///
/// Limits are clamped to [`PageRequest::MAX_LIMIT`]; callers that omit the
/// parameters get [`PageRequest::DEFAULT_LIMIT`] items starting at offset 0.
///
/// # Examples
/// ```
/// use pagination::PageRequest;
///
/// let page = PageRequest::new(Some(20), Some(50)).expect("valid page");
/// assert_eq!(page.offset(), 20);
/// assert_eq!(page.limit(), 50);
///
/// let defaulted = PageRequest::new(None, None).expect("valid page");
/// assert_eq!(defaulted.offset(), 0);
/// assert_eq!(defaulted.limit(), PageRequest::DEFAULT_LIMIT);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    offset: i64,
    limit: i64,
}

impl PageRequest {
    /// Page size applied when the client does not send a limit.
    pub const DEFAULT_LIMIT: i64 = 100;
    /// Ceiling applied to client-supplied limits.
    pub const MAX_LIMIT: i64 = 1000;

    /// Build a request from optional query parameters.
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError`] when the offset is negative or the limit
    /// is zero or negative. Limits above [`Self::MAX_LIMIT`] are clamped, not
    /// rejected, so clients cannot force unbounded result sets.
    pub fn new(offset: Option<i64>, limit: Option<i64>) -> Result<Self, PageRequestError> {
        let offset = offset.unwrap_or(0);
        if offset < 0 {
            return Err(PageRequestError::NegativeOffset(offset));
        }
        let limit = limit.unwrap_or(Self::DEFAULT_LIMIT);
        if limit <= 0 {
            return Err(PageRequestError::NonPositiveLimit(limit));
        }
        Ok(Self {
            offset,
            limit: limit.min(Self::MAX_LIMIT),
        })
    }

    /// Resume a request from a continuation token, keeping the limit.
    ///
    /// # Errors
    ///
    /// Returns [`PageTokenError`] when the token cannot be decoded.
    pub fn from_token(token: &str, limit: Option<i64>) -> Result<Self, PageTokenError> {
        let offset = decode_token(token)?;
        Self::new(Some(offset), limit).map_err(|_| PageTokenError::UnsupportedFormat)
    }

    /// Zero-based row offset of the first item in the page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Maximum number of items the page may hold.
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Request describing the page immediately after this one.
    #[must_use]
    pub fn next(&self) -> Self {
        Self {
            offset: self.offset.saturating_add(self.limit),
            limit: self.limit,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

fn encode_token(offset: i64) -> String {
    URL_SAFE_NO_PAD.encode(format!("{TOKEN_VERSION}:{offset}"))
}

fn decode_token(token: &str) -> Result<i64, PageTokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| PageTokenError::Malformed)?;
    let text = String::from_utf8(bytes).map_err(|_| PageTokenError::Malformed)?;
    let (version, payload) = text
        .split_once(':')
        .ok_or(PageTokenError::UnsupportedFormat)?;
    if version != TOKEN_VERSION {
        return Err(PageTokenError::UnsupportedFormat);
    }
    let offset: i64 = payload
        .parse()
        .map_err(|_| PageTokenError::UnsupportedFormat)?;
    if offset < 0 {
        return Err(PageTokenError::UnsupportedFormat);
    }
    Ok(offset)
}

/// Response envelope pairing a page of items with paging metadata.
///
/// `next` is present only when the page was full, i.e. a further page may
/// exist. Consumers must treat the token as opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items in request order.
    pub items: Vec<T>,
    /// Offset the page was read at.
    pub offset: i64,
    /// Limit the page was read with.
    pub limit: i64,
    /// Continuation token for the following page, when one may exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl<T> Page<T> {
    /// Wrap query results in an envelope for the given request.
    #[must_use]
    pub fn new(items: Vec<T>, request: &PageRequest) -> Self {
        let next = (items.len() as i64 >= request.limit())
            .then(|| encode_token(request.next().offset()));
        Self {
            items,
            offset: request.offset(),
            limit: request.limit(),
            next,
        }
    }

    /// Map the item type while keeping the paging metadata.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            offset: self.offset,
            limit: self.limit,
            next: self.next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, None, 0, PageRequest::DEFAULT_LIMIT)]
    #[case(Some(0), Some(1), 0, 1)]
    #[case(Some(40), Some(20), 40, 20)]
    #[case(Some(0), Some(5000), 0, PageRequest::MAX_LIMIT)]
    fn page_request_accepts_and_clamps(
        #[case] offset: Option<i64>,
        #[case] limit: Option<i64>,
        #[case] expected_offset: i64,
        #[case] expected_limit: i64,
    ) {
        let request = PageRequest::new(offset, limit).expect("valid request");
        assert_eq!(request.offset(), expected_offset);
        assert_eq!(request.limit(), expected_limit);
    }

    #[rstest]
    fn page_request_rejects_negative_offset() {
        assert_eq!(
            PageRequest::new(Some(-1), None),
            Err(PageRequestError::NegativeOffset(-1))
        );
    }

    #[rstest]
    #[case(0)]
    #[case(-5)]
    fn page_request_rejects_non_positive_limit(#[case] limit: i64) {
        assert_eq!(
            PageRequest::new(None, Some(limit)),
            Err(PageRequestError::NonPositiveLimit(limit))
        );
    }

    #[rstest]
    fn full_page_carries_next_token_that_resumes() {
        let request = PageRequest::new(Some(10), Some(3)).expect("valid request");
        let page = Page::new(vec![1, 2, 3], &request);
        let token = page.next.expect("full page yields token");

        let resumed = PageRequest::from_token(&token, Some(3)).expect("token round-trips");
        assert_eq!(resumed.offset(), 13);
        assert_eq!(resumed.limit(), 3);
    }

    #[rstest]
    fn short_page_has_no_next_token() {
        let request = PageRequest::new(None, Some(10)).expect("valid request");
        let page = Page::new(vec![1, 2], &request);
        assert!(page.next.is_none());
    }

    #[rstest]
    #[case("not-base64!")]
    #[case("")]
    fn malformed_tokens_are_rejected(#[case] token: &str) {
        assert!(PageRequest::from_token(token, None).is_err());
    }

    #[rstest]
    fn foreign_version_tokens_are_rejected() {
        let token = URL_SAFE_NO_PAD.encode("v9:10");
        assert_eq!(
            PageRequest::from_token(&token, None),
            Err(PageTokenError::UnsupportedFormat)
        );
    }

    #[rstest]
    fn envelope_serialises_camel_case() {
        let request = PageRequest::new(Some(0), Some(2)).expect("valid request");
        let page = Page::new(vec!["a"], &request);
        let value = serde_json::to_value(&page).expect("serialisable");
        assert_eq!(value["items"][0], "a");
        assert_eq!(value["offset"], 0);
        assert_eq!(value["limit"], 2);
        assert!(value.get("next").is_none());
    }

    #[rstest]
    fn map_preserves_paging_metadata() {
        let request = PageRequest::new(Some(5), Some(2)).expect("valid request");
        let page = Page::new(vec![1, 2], &request).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.offset, 5);
        assert!(page.next.is_some());
    }
}
