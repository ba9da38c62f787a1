//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers every endpoint from the
//! inbound layer together with the wire schemas the endpoints reference.
//!
//! The generated specification is served by Swagger UI in debug builds.

use utoipa::OpenApi;

use crate::domain::ports::{OrderFlatRow, OrderLineSummary, OrderSummary, SimpleOrderSummary};
use crate::domain::{Address, DeliveryStatus, Error, ErrorCode, OrderStatus};
use crate::inbound::http::items::{BookRequest, ItemRecord};
use crate::inbound::http::members::{
    CreateMemberRecordRequest, CreateMemberRequest, MemberRecord, MemberSummary,
    UpdateMemberRequest, UpdateMemberResponse,
};
use crate::inbound::http::orders::{
    DeliveryRecord, OrderLineRecord, OrderLineResponse, OrderRecord, OrderResponse,
    OrderResponsePage, PlaceOrderRequest,
};
use crate::inbound::http::responses::{DataEnvelope, IdResponse};
use crate::inbound::http::simple_orders::{SimpleOrderRecord, SimpleOrderResponse};

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookshop backend API",
        description = "HTTP interface for members, catalogue items, and order \
                       listings across the relational query strategies."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::members::list_members_v1,
        crate::inbound::http::members::list_members_v2,
        crate::inbound::http::members::create_member_v1,
        crate::inbound::http::members::create_member_v2,
        crate::inbound::http::members::update_member_v2,
        crate::inbound::http::items::create_item,
        crate::inbound::http::items::list_items,
        crate::inbound::http::items::update_item,
        crate::inbound::http::orders::list_orders_v1,
        crate::inbound::http::orders::list_orders_v2,
        crate::inbound::http::orders::list_orders_v3,
        crate::inbound::http::orders::list_orders_v3_paged,
        crate::inbound::http::orders::list_orders_v4,
        crate::inbound::http::orders::list_orders_v5,
        crate::inbound::http::orders::list_orders_v6,
        crate::inbound::http::orders::place_order,
        crate::inbound::http::orders::cancel_order,
        crate::inbound::http::simple_orders::list_simple_orders_v1,
        crate::inbound::http::simple_orders::list_simple_orders_v2,
        crate::inbound::http::simple_orders::list_simple_orders_v3,
        crate::inbound::http::simple_orders::list_simple_orders_v4,
        crate::inbound::http::health::healthz,
        crate::inbound::http::health::readyz,
    ),
    components(schemas(
        Error,
        ErrorCode,
        Address,
        OrderStatus,
        DeliveryStatus,
        MemberRecord,
        CreateMemberRecordRequest,
        CreateMemberRequest,
        MemberSummary,
        UpdateMemberRequest,
        UpdateMemberResponse,
        DataEnvelope<Vec<MemberSummary>>,
        ItemRecord,
        BookRequest,
        DeliveryRecord,
        OrderLineRecord,
        OrderRecord,
        OrderLineResponse,
        OrderResponse,
        OrderResponsePage,
        PlaceOrderRequest,
        OrderSummary,
        OrderLineSummary,
        SimpleOrderSummary,
        OrderFlatRow,
        SimpleOrderRecord,
        SimpleOrderResponse,
        IdResponse,
    )),
    tags(
        (name = "members", description = "Member registration and listings"),
        (name = "items", description = "Catalogue item management"),
        (name = "orders", description = "Order placement, cancellation, and listing strategies"),
        (name = "simple-orders", description = "Order listings without line collections"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    /// Assert that an Object schema contains a field with the given name.
    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn openapi_error_schema_has_required_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get("Error").expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
    }

    #[test]
    fn openapi_lists_every_order_strategy_path() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/orders",
            "/api/v2/orders",
            "/api/v3/orders",
            "/api/v3.1/orders",
            "/api/v4/orders",
            "/api/v5/orders",
            "/api/v6/orders",
            "/api/v1/simple-orders",
            "/api/v4/simple-orders",
        ] {
            assert!(
                doc.paths.paths.contains_key(path),
                "missing path '{path}' in the document"
            );
        }
    }
}
