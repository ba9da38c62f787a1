//! Simple orders API handlers: the to-one view (order → member, delivery).
//!
//! No line collections here, which makes this the cleanest illustration of
//! the to-one loading progression: per-row lookups (v1, v2), one joined
//! query (v3), and a dedicated column projection (v4).

use actix_web::{get, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{
    MemberPersistenceError, OrderPersistenceError, OrderProjectionError, SimpleOrderSummary,
};
use crate::domain::{Address, Error, OrderHead, OrderStatus};
use crate::inbound::http::ApiResult;
use crate::inbound::http::orders::{DeliveryRecord, OrderFilterQuery};
use crate::inbound::http::state::HttpState;

/// Simple order record, the storage shape on the wire (v1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimpleOrderRecord {
    /// Order identifier.
    pub id: i64,
    /// Ordering member.
    pub member_id: i64,
    /// Delivery record.
    pub delivery: DeliveryRecord,
    /// Lifecycle state.
    pub status: OrderStatus,
    /// Placement timestamp.
    pub ordered_at: DateTime<Utc>,
}

/// Simple order DTO (v2, v3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimpleOrderResponse {
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
}

fn map_persistence_error(err: OrderPersistenceError) -> Error {
    match err {
        OrderPersistenceError::Connection { .. } => {
            Error::service_unavailable("order storage unavailable")
        }
        OrderPersistenceError::Query { message } => Error::internal(message),
    }
}

fn map_member_persistence_error(err: MemberPersistenceError) -> Error {
    match err {
        MemberPersistenceError::Connection { .. } => {
            Error::service_unavailable("member storage unavailable")
        }
        MemberPersistenceError::Query { message } => Error::internal(message),
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

async fn load_record(state: &HttpState, head: &OrderHead) -> ApiResult<SimpleOrderRecord> {
    let delivery = state
        .orders()
        .find_delivery(head.delivery_id)
        .await
        .map_err(map_persistence_error)?
        .ok_or_else(|| Error::internal(format!("order {} lost its delivery", head.id)))?;
    Ok(SimpleOrderRecord {
        id: head.id.value(),
        member_id: head.member_id.value(),
        delivery: DeliveryRecord::from(&delivery),
        status: head.status,
        ordered_at: head.ordered_at,
    })
}

async fn load_response(state: &HttpState, head: &OrderHead) -> ApiResult<SimpleOrderResponse> {
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
    Ok(SimpleOrderResponse {
        order_id: head.id.value(),
        member_name: member.name().to_owned(),
        ordered_at: head.ordered_at,
        status: head.status,
        address: delivery.address,
    })
}

/// List simple orders as records, loading the delivery per row.
#[utoipa::path(
    get,
    path = "/api/v1/simple-orders",
    params(OrderFilterQuery),
    responses(
        (status = 200, description = "Orders", body = [SimpleOrderRecord]),
        (status = 503, description = "Storage unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["simple-orders"],
    operation_id = "listSimpleOrdersV1"
)]
#[get("/v1/simple-orders")]
pub async fn list_simple_orders_v1(
    state: web::Data<HttpState>,
    query: web::Query<OrderFilterQuery>,
) -> ApiResult<web::Json<Vec<SimpleOrderRecord>>> {
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

/// List simple orders as DTOs, loading member and delivery per row.
#[utoipa::path(
    get,
    path = "/api/v2/simple-orders",
    params(OrderFilterQuery),
    responses(
        (status = 200, description = "Orders", body = [SimpleOrderResponse]),
        (status = 503, description = "Storage unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["simple-orders"],
    operation_id = "listSimpleOrdersV2"
)]
#[get("/v2/simple-orders")]
pub async fn list_simple_orders_v2(
    state: web::Data<HttpState>,
    query: web::Query<OrderFilterQuery>,
) -> ApiResult<web::Json<Vec<SimpleOrderResponse>>> {
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

/// List simple orders from one query joining member and delivery.
#[utoipa::path(
    get,
    path = "/api/v3/simple-orders",
    params(OrderFilterQuery),
    responses(
        (status = 200, description = "Orders", body = [SimpleOrderResponse]),
        (status = 503, description = "Storage unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["simple-orders"],
    operation_id = "listSimpleOrdersV3"
)]
#[get("/v3/simple-orders")]
pub async fn list_simple_orders_v3(
    state: web::Data<HttpState>,
    query: web::Query<OrderFilterQuery>,
) -> ApiResult<web::Json<Vec<SimpleOrderResponse>>> {
    let search = query.into_inner().into_search();
    let orders = state
        .orders()
        .find_with_parties(&search)
        .await
        .map_err(map_persistence_error)?;
    let responses = orders
        .iter()
        .map(|order| SimpleOrderResponse {
            order_id: order.id.value(),
            member_name: order.member.name().to_owned(),
            ordered_at: order.ordered_at,
            status: order.status,
            address: order.delivery.address.clone(),
        })
        .collect();
    Ok(web::Json(responses))
}

/// List simple orders through the dedicated column projection.
#[utoipa::path(
    get,
    path = "/api/v4/simple-orders",
    params(OrderFilterQuery),
    responses(
        (status = 200, description = "Orders", body = [SimpleOrderSummary]),
        (status = 503, description = "Storage unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["simple-orders"],
    operation_id = "listSimpleOrdersV4"
)]
#[get("/v4/simple-orders")]
pub async fn list_simple_orders_v4(
    state: web::Data<HttpState>,
    query: web::Query<OrderFilterQuery>,
) -> ApiResult<web::Json<Vec<SimpleOrderSummary>>> {
    let search = query.into_inner().into_search();
    let summaries = state
        .order_queries()
        .find_simple_summaries(&search)
        .await
        .map_err(map_projection_error)?;
    Ok(web::Json(summaries))
}
