//! Catalogue items API handlers.

use actix_web::{get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::ItemPersistenceError;
use crate::domain::{
    Error, Item, ItemId, ItemKind, ItemUpdate, ItemValidationError, NewItem,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::responses::IdResponse;
use crate::inbound::http::state::HttpState;

/// Item record on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    /// Item identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: i32,
    /// Units remaining in stock.
    pub stock_quantity: i32,
    /// Subtype discriminator.
    pub kind: String,
    /// Book author.
    pub author: String,
    /// Book ISBN.
    pub isbn: String,
}

impl From<&Item> for ItemRecord {
    fn from(item: &Item) -> Self {
        let ItemKind::Book { author, isbn } = item.kind();
        Self {
            id: item.id().value(),
            name: item.name().to_owned(),
            price: item.price(),
            stock_quantity: item.stock_quantity(),
            kind: item.kind().discriminator().to_owned(),
            author: author.clone(),
            isbn: isbn.clone(),
        }
    }
}

/// Create/update request for a book.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: i32,
    /// Units in stock.
    pub stock_quantity: i32,
    /// Author name.
    pub author: String,
    /// ISBN.
    pub isbn: String,
}

fn map_persistence_error(err: ItemPersistenceError) -> Error {
    match err {
        ItemPersistenceError::Connection { .. } => {
            Error::service_unavailable("item storage unavailable")
        }
        ItemPersistenceError::Query { message } => Error::internal(message),
    }
}

fn map_validation_error(err: ItemValidationError) -> Error {
    match err {
        ItemValidationError::EmptyName => Error::invalid_request("name must not be empty")
            .with_details(json!({ "field": "name", "code": "empty_name" })),
        ItemValidationError::NegativePrice(price) => {
            Error::invalid_request("price must not be negative")
                .with_details(json!({ "field": "price", "code": "negative_price", "value": price }))
        }
        ItemValidationError::NegativeStock(stock) => {
            Error::invalid_request("stock quantity must not be negative").with_details(json!({
                "field": "stockQuantity",
                "code": "negative_stock",
                "value": stock,
            }))
        }
    }
}

fn kind_from_request(request: &BookRequest) -> ItemKind {
    ItemKind::Book {
        author: request.author.clone(),
        isbn: request.isbn.clone(),
    }
}

/// Register a book in the catalogue.
#[utoipa::path(
    post,
    path = "/api/v1/items",
    request_body = BookRequest,
    responses(
        (status = 200, description = "Item created", body = IdResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 503, description = "Storage unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["items"],
    operation_id = "createItem"
)]
#[post("/v1/items")]
pub async fn create_item(
    state: web::Data<HttpState>,
    payload: web::Json<BookRequest>,
) -> ApiResult<web::Json<IdResponse>> {
    let payload = payload.into_inner();
    let kind = kind_from_request(&payload);
    let draft = NewItem::new(payload.name, payload.price, payload.stock_quantity, kind)
        .map_err(map_validation_error)?;
    let item = state
        .items()
        .create(&draft)
        .await
        .map_err(map_persistence_error)?;
    Ok(web::Json(IdResponse {
        id: item.id().value(),
    }))
}

/// List the catalogue.
#[utoipa::path(
    get,
    path = "/api/v1/items",
    responses(
        (status = 200, description = "Items", body = [ItemRecord]),
        (status = 503, description = "Storage unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["items"],
    operation_id = "listItems"
)]
#[get("/v1/items")]
pub async fn list_items(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<ItemRecord>>> {
    let items = state
        .items()
        .list()
        .await
        .map_err(map_persistence_error)?;
    Ok(web::Json(items.iter().map(ItemRecord::from).collect()))
}

/// Replace a book's editable fields.
///
/// A full-field update against the identifier, not a stored-aggregate merge:
/// the client sends the complete new state.
#[utoipa::path(
    put,
    path = "/api/v1/items/{id}",
    request_body = BookRequest,
    params(("id" = i64, Path, description = "Item identifier")),
    responses(
        (status = 200, description = "Item updated", body = ItemRecord),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Item not found", body = Error),
        (status = 503, description = "Storage unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["items"],
    operation_id = "updateItem"
)]
#[put("/v1/items/{id}")]
pub async fn update_item(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    payload: web::Json<BookRequest>,
) -> ApiResult<web::Json<ItemRecord>> {
    let id = ItemId::new(path.into_inner());
    let payload = payload.into_inner();
    let kind = kind_from_request(&payload);
    // Validate through the draft type before touching storage.
    let draft = NewItem::new(payload.name, payload.price, payload.stock_quantity, kind)
        .map_err(map_validation_error)?;
    let update = ItemUpdate {
        name: draft.name,
        price: draft.price,
        stock_quantity: draft.stock_quantity,
        kind: draft.kind,
    };
    let item = state
        .items()
        .update(id, &update)
        .await
        .map_err(map_persistence_error)?
        .ok_or_else(|| Error::not_found(format!("item {id} not found")))?;
    Ok(web::Json(ItemRecord::from(&item)))
}
