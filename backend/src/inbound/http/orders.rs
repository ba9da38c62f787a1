//! Orders API handlers.
//!
//! The listing versions all return the same orders; each one loads them with
//! a different query strategy so their costs can be compared side by side:
//!
//! | version | strategy                                   | queries        |
//! |---------|--------------------------------------------|----------------|
//! | v1      | roots, then per-row association loads      | 1 + 3n         |
//! | v2      | as v1, mapped to DTOs                      | 1 + 3n         |
//! | v3      | one join with lines, collapsed in memory   | 1 (not pageable) |
//! | v3.1    | to-one join page + one `IN` line query     | 2              |
//! | v4      | projection roots, then lines per order     | 1 + n          |
//! | v5      | projection roots + one `IN` line query     | 2              |
//! | v6      | one flat denormalised join                 | 1 (fanned out) |

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use pagination::{Page, PageRequest};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{
    MemberPersistenceError, OrderFlatRow, OrderPersistenceError, OrderProjectionError,
    OrderSummary,
};
use crate::domain::{
    Address, CancelError, Delivery, DeliveryStatus, Error, ItemId, MemberId, OrderDetail,
    OrderHead, OrderId, OrderLine, OrderSearch, OrderServiceError, OrderStatus, OrderWithParties,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::responses::IdResponse;
use crate::inbound::http::state::HttpState;

/// Optional listing filters shared by every order listing.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilterQuery {
    /// Substring match on the ordering member's name.
    pub member_name: Option<String>,
    /// Exact match on the order status.
    pub status: Option<OrderStatus>,
}

impl OrderFilterQuery {
    pub(crate) fn into_search(self) -> OrderSearch {
        OrderSearch {
            member_name: self.member_name,
            status: self.status,
        }
    }
}

/// Listing filters plus offset pagination parameters.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PagedOrderQuery {
    /// Substring match on the ordering member's name.
    pub member_name: Option<String>,
    /// Exact match on the order status.
    pub status: Option<OrderStatus>,
    /// Zero-based row offset. Ignored when `token` is present.
    pub offset: Option<i64>,
    /// Page size, clamped server-side.
    pub limit: Option<i64>,
    /// Opaque continuation token from a previous page's `next` field.
    pub token: Option<String>,
}

/// Delivery on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRecord {
    /// Delivery identifier.
    pub id: i64,
    /// Destination address.
    pub address: Address,
    /// Shipment state.
    pub status: DeliveryStatus,
}

impl From<&Delivery> for DeliveryRecord {
    fn from(delivery: &Delivery) -> Self {
        Self {
            id: delivery.id.value(),
            address: delivery.address.clone(),
            status: delivery.status,
        }
    }
}

/// Order line on the wire, item reference included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRecord {
    /// Ordered item.
    pub item_id: i64,
    /// Item name captured at placement time.
    pub item_name: String,
    /// Unit price captured at placement time.
    pub order_price: i32,
    /// Units ordered.
    pub count: i32,
}

impl From<&OrderLine> for OrderLineRecord {
    fn from(line: &OrderLine) -> Self {
        Self {
            item_id: line.item_id.value(),
            item_name: line.item_name.clone(),
            order_price: line.order_price,
            count: line.count,
        }
    }
}

/// Full order record, the storage shape on the wire (v1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    /// Order identifier.
    pub id: i64,
    /// Ordering member.
    pub member_id: i64,
    /// Delivery record.
    pub delivery: DeliveryRecord,
    /// Line records.
    pub lines: Vec<OrderLineRecord>,
    /// Lifecycle state.
    pub status: OrderStatus,
    /// Placement timestamp.
    pub ordered_at: DateTime<Utc>,
    /// Derived total, Σ line price × count.
    pub total_price: i64,
}

/// Order line DTO without the item reference (v2, v3, v3.1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineResponse {
    /// Item name.
    pub item_name: String,
    /// Unit price captured at placement time.
    pub order_price: i32,
    /// Units ordered.
    pub count: i32,
}

impl From<&OrderLine> for OrderLineResponse {
    fn from(line: &OrderLine) -> Self {
        Self {
            item_name: line.item_name.clone(),
            order_price: line.order_price,
            count: line.count,
        }
    }
}

/// Order DTO decoupled from the storage shape (v2, v3, v3.1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    /// Order identifier.
    pub order_id: i64,
    /// Ordering member's name.
    pub member_name: String,
    /// Placement timestamp.
    pub ordered_at: DateTime<Utc>,
    /// Lifecycle state.
    pub status: OrderStatus,
    /// Delivery destination.
    pub address: Address,
    /// Line DTOs.
    pub lines: Vec<OrderLineResponse>,
}

/// OpenAPI mirror of the pagination envelope for order DTOs.
#[derive(Debug, ToSchema)]
#[allow(dead_code, reason = "schema mirror; only its ToSchema impl is used")]
pub struct OrderResponsePage {
    /// Items in request order.
    pub items: Vec<OrderResponse>,
    /// Offset the page was read at.
    pub offset: i64,
    /// Limit the page was read with.
    pub limit: i64,
    /// Opaque continuation token, present when a further page may exist.
    pub next: Option<String>,
}

/// Placement request for `POST /api/v1/orders`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    /// Ordering member.
    pub member_id: i64,
    /// Ordered item.
    pub item_id: i64,
    /// Units to order.
    pub count: i32,
}

fn map_member_persistence_error(err: MemberPersistenceError) -> Error {
    match err {
        MemberPersistenceError::Connection { .. } => {
            Error::service_unavailable("member storage unavailable")
        }
        MemberPersistenceError::Query { message } => Error::internal(message),
    }
}

fn map_persistence_error(err: OrderPersistenceError) -> Error {
    match err {
        OrderPersistenceError::Connection { .. } => {
            Error::service_unavailable("order storage unavailable")
        }
        OrderPersistenceError::Query { message } => Error::internal(message),
    }
}

fn map_projection_error(err: OrderProjectionError) -> Error {
    match err {
        OrderProjectionError::Connection { .. } => {
            Error::service_unavailable("order storage unavailable")
        }
        OrderProjectionError::Query { message } => Error::internal(message),
    }
}

fn map_service_error(err: OrderServiceError) -> Error {
    match err {
        OrderServiceError::InvalidCount(count) => Error::invalid_request(
            "count must be positive",
        )
        .with_details(json!({ "field": "count", "code": "invalid_count", "value": count })),
        OrderServiceError::MemberNotFound(id) => Error::not_found(format!("member {id} not found")),
        OrderServiceError::ItemNotFound(id) => Error::not_found(format!("item {id} not found")),
        OrderServiceError::OrderNotFound(id) => Error::not_found(format!("order {id} not found")),
        OrderServiceError::NotEnoughStock(inner) => {
            Error::conflict(inner.to_string()).with_details(json!({ "code": "not_enough_stock" }))
        }
        OrderServiceError::Cancel(CancelError::DeliveryCompleted) => {
            Error::conflict("delivery already completed")
                .with_details(json!({ "code": "delivery_completed" }))
        }
        OrderServiceError::Cancel(CancelError::AlreadyCancelled) => {
            Error::conflict("order already cancelled")
                .with_details(json!({ "code": "already_cancelled" }))
        }
        OrderServiceError::Repository(message) => Error::internal(message),
        OrderServiceError::Unavailable(_) => {
            Error::service_unavailable("order storage unavailable")
        }
    }
}

/// Load one head's associations row by row (the per-row strategy's n part).
async fn load_record(state: &HttpState, head: &OrderHead) -> ApiResult<OrderRecord> {
    let delivery = state
        .orders()
        .find_delivery(head.delivery_id)
        .await
        .map_err(map_persistence_error)?
        .ok_or_else(|| Error::internal(format!("order {} lost its delivery", head.id)))?;
    let lines = state
        .orders()
        .find_lines(head.id)
        .await
        .map_err(map_persistence_error)?;
    let total_price = lines.iter().map(OrderLine::total_price).sum();
    Ok(OrderRecord {
        id: head.id.value(),
        member_id: head.member_id.value(),
        delivery: DeliveryRecord::from(&delivery),
        lines: lines.iter().map(OrderLineRecord::from).collect(),
        status: head.status,
        ordered_at: head.ordered_at,
        total_price,
    })
}

/// Load one head's associations row by row and map to the DTO shape.
async fn load_response(state: &HttpState, head: &OrderHead) -> ApiResult<OrderResponse> {
    let member = state
        .members()
        .find_by_id(head.member_id)
        .await
        .map_err(map_member_persistence_error)?
        .ok_or_else(|| Error::internal(format!("order {} lost its member", head.id)))?;
    let delivery = state
        .orders()
        .find_delivery(head.delivery_id)
        .await
        .map_err(map_persistence_error)?
        .ok_or_else(|| Error::internal(format!("order {} lost its delivery", head.id)))?;
    let lines = state
        .orders()
        .find_lines(head.id)
        .await
        .map_err(map_persistence_error)?;
    Ok(OrderResponse {
        order_id: head.id.value(),
        member_name: member.name().to_owned(),
        ordered_at: head.ordered_at,
        status: head.status,
        address: delivery.address.clone(),
        lines: lines.iter().map(OrderLineResponse::from).collect(),
    })
}

fn response_from_detail(detail: &OrderDetail) -> OrderResponse {
    OrderResponse {
        order_id: detail.id.value(),
        member_name: detail.member.name().to_owned(),
        ordered_at: detail.ordered_at,
        status: detail.status,
        address: detail.delivery.address.clone(),
        lines: detail.lines.iter().map(OrderLineResponse::from).collect(),
    }
}

fn response_from_parties(parties: &OrderWithParties, lines: Vec<OrderLineResponse>) -> OrderResponse {
    OrderResponse {
        order_id: parties.id.value(),
        member_name: parties.member.name().to_owned(),
        ordered_at: parties.ordered_at,
        status: parties.status,
        address: parties.delivery.address.clone(),
        lines,
    }
}

/// List orders as full records, loading associations per row.
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(OrderFilterQuery),
    responses(
        (status = 200, description = "Orders", body = [OrderRecord]),
        (status = 503, description = "Storage unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["orders"],
    operation_id = "listOrdersV1"
)]
#[get("/v1/orders")]
pub async fn list_orders_v1(
    state: web::Data<HttpState>,
    query: web::Query<OrderFilterQuery>,
) -> ApiResult<web::Json<Vec<OrderRecord>>> {
    let search = query.into_inner().into_search();
    let heads = state
        .orders()
        .find_heads(&search)
        .await
        .map_err(map_persistence_error)?;
    let mut records = Vec::with_capacity(heads.len());
    for head in &heads {
        records.push(load_record(&state, head).await?);
    }
    Ok(web::Json(records))
}

/// List orders as DTOs, still loading associations per row.
#[utoipa::path(
    get,
    path = "/api/v2/orders",
    params(OrderFilterQuery),
    responses(
        (status = 200, description = "Orders", body = [OrderResponse]),
        (status = 503, description = "Storage unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["orders"],
    operation_id = "listOrdersV2"
)]
#[get("/v2/orders")]
pub async fn list_orders_v2(
    state: web::Data<HttpState>,
    query: web::Query<OrderFilterQuery>,
) -> ApiResult<web::Json<Vec<OrderResponse>>> {
    let search = query.into_inner().into_search();
    let heads = state
        .orders()
        .find_heads(&search)
        .await
        .map_err(map_persistence_error)?;
    let mut responses = Vec::with_capacity(heads.len());
    for head in &heads {
        responses.push(load_response(&state, head).await?);
    }
    Ok(web::Json(responses))
}

/// List orders from one fully joined query.
///
/// Collapsing the line fan-out happens in the adapter, so the result cannot
/// be paginated; use v3.1 for pages.
#[utoipa::path(
    get,
    path = "/api/v3/orders",
    params(OrderFilterQuery),
    responses(
        (status = 200, description = "Orders", body = [OrderResponse]),
        (status = 503, description = "Storage unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["orders"],
    operation_id = "listOrdersV3"
)]
#[get("/v3/orders")]
pub async fn list_orders_v3(
    state: web::Data<HttpState>,
    query: web::Query<OrderFilterQuery>,
) -> ApiResult<web::Json<Vec<OrderResponse>>> {
    let search = query.into_inner().into_search();
    let details = state
        .orders()
        .find_detailed(&search)
        .await
        .map_err(map_persistence_error)?;
    Ok(web::Json(details.iter().map(response_from_detail).collect()))
}

/// List a page of orders: one to-one join for the page, one `IN` query for
/// every line on it.
#[utoipa::path(
    get,
    path = "/api/v3.1/orders",
    params(PagedOrderQuery),
    responses(
        (status = 200, description = "Orders page", body = OrderResponsePage),
        (status = 400, description = "Invalid pagination parameters", body = Error),
        (status = 503, description = "Storage unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["orders"],
    operation_id = "listOrdersV3Paged"
)]
#[get("/v3.1/orders")]
pub async fn list_orders_v3_paged(
    state: web::Data<HttpState>,
    query: web::Query<PagedOrderQuery>,
) -> ApiResult<web::Json<Page<OrderResponse>>> {
    let query = query.into_inner();
    let page = match &query.token {
        Some(token) => PageRequest::from_token(token, query.limit)
            .map_err(|err| Error::invalid_request(err.to_string()))?,
        None => PageRequest::new(query.offset, query.limit)
            .map_err(|err| Error::invalid_request(err.to_string()))?,
    };
    let search = OrderSearch {
        member_name: query.member_name,
        status: query.status,
    };

    let parties = state
        .orders()
        .find_page_with_parties(&search, &page)
        .await
        .map_err(map_persistence_error)?;
    let order_ids: Vec<OrderId> = parties.iter().map(|order| order.id).collect();
    let mut lines_by_order = state
        .orders()
        .find_lines_for_orders(&order_ids)
        .await
        .map_err(map_persistence_error)?;

    let responses = parties
        .iter()
        .map(|order| {
            let lines = lines_by_order
                .remove(&order.id)
                .unwrap_or_default()
                .iter()
                .map(OrderLineResponse::from)
                .collect();
            response_from_parties(order, lines)
        })
        .collect();
    Ok(web::Json(Page::new(responses, &page)))
}

/// List orders through the per-order projection (1 + n projection queries).
#[utoipa::path(
    get,
    path = "/api/v4/orders",
    params(OrderFilterQuery),
    responses(
        (status = 200, description = "Orders", body = [OrderSummary]),
        (status = 503, description = "Storage unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["orders"],
    operation_id = "listOrdersV4"
)]
#[get("/v4/orders")]
pub async fn list_orders_v4(
    state: web::Data<HttpState>,
    query: web::Query<OrderFilterQuery>,
) -> ApiResult<web::Json<Vec<OrderSummary>>> {
    let search = query.into_inner().into_search();
    let summaries = state
        .order_queries()
        .find_summaries(&search)
        .await
        .map_err(map_projection_error)?;
    Ok(web::Json(summaries))
}

/// List orders through the batched projection (2 projection queries).
#[utoipa::path(
    get,
    path = "/api/v5/orders",
    params(OrderFilterQuery),
    responses(
        (status = 200, description = "Orders", body = [OrderSummary]),
        (status = 503, description = "Storage unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["orders"],
    operation_id = "listOrdersV5"
)]
#[get("/v5/orders")]
pub async fn list_orders_v5(
    state: web::Data<HttpState>,
    query: web::Query<OrderFilterQuery>,
) -> ApiResult<web::Json<Vec<OrderSummary>>> {
    let search = query.into_inner().into_search();
    let summaries = state
        .order_queries()
        .find_summaries_batched(&search)
        .await
        .map_err(map_projection_error)?;
    Ok(web::Json(summaries))
}

/// List orders as flat denormalised rows, one per line.
#[utoipa::path(
    get,
    path = "/api/v6/orders",
    params(OrderFilterQuery),
    responses(
        (status = 200, description = "Order rows", body = [OrderFlatRow]),
        (status = 503, description = "Storage unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["orders"],
    operation_id = "listOrdersV6"
)]
#[get("/v6/orders")]
pub async fn list_orders_v6(
    state: web::Data<HttpState>,
    query: web::Query<OrderFilterQuery>,
) -> ApiResult<web::Json<Vec<OrderFlatRow>>> {
    let search = query.into_inner().into_search();
    let rows = state
        .order_queries()
        .find_flat_rows(&search)
        .await
        .map_err(map_projection_error)?;
    Ok(web::Json(rows))
}

/// Place a single-item order.
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = PlaceOrderRequest,
    responses(
        (status = 200, description = "Order placed", body = IdResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Member or item not found", body = Error),
        (status = 409, description = "Not enough stock", body = Error),
        (status = 503, description = "Storage unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["orders"],
    operation_id = "placeOrder"
)]
#[post("/v1/orders")]
pub async fn place_order(
    state: web::Data<HttpState>,
    payload: web::Json<PlaceOrderRequest>,
) -> ApiResult<web::Json<IdResponse>> {
    let payload = payload.into_inner();
    let order_id = state
        .order_service()
        .place_order(
            MemberId::new(payload.member_id),
            ItemId::new(payload.item_id),
            payload.count,
        )
        .await
        .map_err(map_service_error)?;
    Ok(web::Json(IdResponse {
        id: order_id.value(),
    }))
}

/// Cancel an order, restoring the stock its lines consumed.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/cancel",
    params(("id" = i64, Path, description = "Order identifier")),
    responses(
        (status = 200, description = "Order cancelled"),
        (status = 404, description = "Order not found", body = Error),
        (status = 409, description = "Cancellation forbidden by lifecycle", body = Error),
        (status = 503, description = "Storage unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["orders"],
    operation_id = "cancelOrder"
)]
#[post("/v1/orders/{id}/cancel")]
pub async fn cancel_order(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    state
        .order_service()
        .cancel_order(OrderId::new(path.into_inner()))
        .await
        .map_err(map_service_error)?;
    Ok(HttpResponse::Ok().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test as actix_test};
    use rstest::rstest;
    use serde_json::Value;

    fn test_app(
        state: HttpState,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new().app_data(web::Data::new(state)).service(
            web::scope("/api")
                .service(list_orders_v1)
                .service(list_orders_v2)
                .service(list_orders_v3)
                .service(list_orders_v3_paged)
                .service(list_orders_v4)
                .service(list_orders_v5)
                .service(list_orders_v6)
                .service(place_order)
                .service(cancel_order),
        )
    }

    async fn get_json<S, B>(app: &S, uri: &str) -> Value
    where
        S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse<B>,
            Error = actix_web::Error,
        >,
        B: actix_web::body::MessageBody,
    {
        let response = actix_test::call_service(
            app,
            actix_test::TestRequest::get().uri(uri).to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
        serde_json::from_slice(&actix_test::read_body(response).await).expect("JSON body")
    }

    #[rstest]
    #[actix_web::test]
    async fn v1_returns_full_records_with_derived_totals() {
        let app = actix_test::init_service(test_app(HttpState::fixture())).await;
        let value = get_json(&app, "/api/v1/orders").await;
        let orders = value.as_array().expect("array");
        assert_eq!(orders.len(), 2);
        assert_eq!(
            orders[0].get("totalPrice").and_then(Value::as_i64),
            Some(50_000)
        );
        assert_eq!(
            orders[1].get("totalPrice").and_then(Value::as_i64),
            Some(220_000)
        );
        let delivery = orders[0].get("delivery").expect("delivery");
        assert_eq!(
            delivery.get("status").and_then(Value::as_str),
            Some("READY")
        );
    }

    #[rstest]
    #[case("/api/v2/orders")]
    #[case("/api/v3/orders")]
    #[actix_web::test]
    async fn dto_listings_share_the_same_shape(#[case] uri: &str) {
        let app = actix_test::init_service(test_app(HttpState::fixture())).await;
        let value = get_json(&app, uri).await;
        let orders = value.as_array().expect("array");
        assert_eq!(orders.len(), 2);
        assert_eq!(
            orders[0].get("memberName").and_then(Value::as_str),
            Some("userA")
        );
        let lines = orders[0].get("lines").and_then(Value::as_array).expect("lines");
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0].get("itemName").and_then(Value::as_str),
            Some("JPA1 BOOK")
        );
        assert!(orders[0].get("memberId").is_none());
    }

    #[rstest]
    #[actix_web::test]
    async fn paged_listing_pages_and_carries_a_continuation_token() {
        let app = actix_test::init_service(test_app(HttpState::fixture())).await;

        let value = get_json(&app, "/api/v3.1/orders?limit=1").await;
        let items = value.get("items").and_then(Value::as_array).expect("items");
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].get("memberName").and_then(Value::as_str),
            Some("userA")
        );
        assert!(value.get("next").and_then(Value::as_str).is_some());

        let value = get_json(&app, "/api/v3.1/orders?offset=1&limit=1").await;
        let items = value.get("items").and_then(Value::as_array).expect("items");
        assert_eq!(
            items[0].get("memberName").and_then(Value::as_str),
            Some("userB")
        );
        let lines = items[0].get("lines").and_then(Value::as_array).expect("lines");
        assert_eq!(lines.len(), 2);
    }

    #[rstest]
    #[actix_web::test]
    async fn continuation_token_resumes_the_next_page() {
        let app = actix_test::init_service(test_app(HttpState::fixture())).await;

        let value = get_json(&app, "/api/v3.1/orders?limit=1").await;
        let token = value
            .get("next")
            .and_then(Value::as_str)
            .expect("full page yields token")
            .to_owned();

        let value = get_json(&app, &format!("/api/v3.1/orders?limit=1&token={token}")).await;
        let items = value.get("items").and_then(Value::as_array).expect("items");
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].get("memberName").and_then(Value::as_str),
            Some("userB")
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn malformed_continuation_tokens_are_rejected() {
        let app = actix_test::init_service(test_app(HttpState::fixture())).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v3.1/orders?token=%21not-a-token")
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[actix_web::test]
    async fn paged_listing_rejects_negative_offsets() {
        let app = actix_test::init_service(test_app(HttpState::fixture())).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v3.1/orders?offset=-1")
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[case("/api/v4/orders")]
    #[case("/api/v5/orders")]
    #[actix_web::test]
    async fn projection_listings_return_summaries(#[case] uri: &str) {
        let app = actix_test::init_service(test_app(HttpState::fixture())).await;
        let value = get_json(&app, uri).await;
        let orders = value.as_array().expect("array");
        assert_eq!(orders.len(), 2);
        assert_eq!(
            orders[1].get("memberName").and_then(Value::as_str),
            Some("userB")
        );
        let lines = orders[1].get("lines").and_then(Value::as_array).expect("lines");
        assert_eq!(lines.len(), 2);
    }

    #[rstest]
    #[actix_web::test]
    async fn flat_listing_repeats_order_fields_per_line() {
        let app = actix_test::init_service(test_app(HttpState::fixture())).await;
        let value = get_json(&app, "/api/v6/orders").await;
        let rows = value.as_array().expect("array");
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows[0].get("orderId").and_then(Value::as_i64),
            rows[1].get("orderId").and_then(Value::as_i64)
        );
        assert_ne!(
            rows[0].get("itemName").and_then(Value::as_str),
            rows[1].get("itemName").and_then(Value::as_str)
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn listings_honour_the_member_name_filter() {
        let app = actix_test::init_service(test_app(HttpState::fixture())).await;
        let value = get_json(&app, "/api/v2/orders?memberName=userB").await;
        let orders = value.as_array().expect("array");
        assert_eq!(orders.len(), 1);
        assert_eq!(
            orders[0].get("memberName").and_then(Value::as_str),
            Some("userB")
        );

        let value = get_json(&app, "/api/v2/orders?status=CANCEL").await;
        assert_eq!(value.as_array().expect("array").len(), 0);
    }

    #[rstest]
    #[actix_web::test]
    async fn placing_an_order_returns_its_identifier() {
        let app = actix_test::init_service(test_app(HttpState::fixture())).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/orders")
                .set_json(PlaceOrderRequest {
                    member_id: 1,
                    item_id: 3,
                    count: 2,
                })
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: IdResponse =
            serde_json::from_slice(&actix_test::read_body(response).await).expect("id body");
        assert!(body.id > 0);
    }

    #[rstest]
    #[actix_web::test]
    async fn ordering_beyond_stock_conflicts_with_a_detail_code() {
        let app = actix_test::init_service(test_app(HttpState::fixture())).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/orders")
                .set_json(PlaceOrderRequest {
                    member_id: 1,
                    item_id: 3,
                    count: 1_000,
                })
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let value: Value =
            serde_json::from_slice(&actix_test::read_body(response).await).expect("JSON");
        assert_eq!(
            value.get("message").and_then(Value::as_str),
            Some("not enough stock remaining")
        );
        assert_eq!(
            value
                .get("details")
                .and_then(|details| details.get("code"))
                .and_then(Value::as_str),
            Some("not_enough_stock")
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn cancelling_flips_the_status_and_repeats_conflict() {
        let app = actix_test::init_service(test_app(HttpState::fixture())).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/orders/8/cancel")
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let value = get_json(&app, "/api/v2/orders?status=CANCEL").await;
        assert_eq!(value.as_array().expect("array").len(), 1);

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/orders/8/cancel")
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let value: Value =
            serde_json::from_slice(&actix_test::read_body(response).await).expect("JSON");
        assert_eq!(
            value
                .get("details")
                .and_then(|details| details.get("code"))
                .and_then(Value::as_str),
            Some("already_cancelled")
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn cancelling_an_unknown_order_is_not_found() {
        let app = actix_test::init_service(test_app(HttpState::fixture())).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/orders/999/cancel")
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
