//! Members API handlers.
//!
//! The v1 endpoints expose the full member record; the v2 endpoints work
//! through dedicated request/response DTOs so the wire shape can evolve
//! independently of storage.

use actix_web::{get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::MemberPersistenceError;
use crate::domain::{Address, Error, Member, MemberId, MemberValidationError, NewMember};
use crate::inbound::http::ApiResult;
use crate::inbound::http::responses::{DataEnvelope, IdResponse};
use crate::inbound::http::state::HttpState;

/// Full member record, the storage shape on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    /// Member identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Age in years.
    pub age: i32,
    /// Home address.
    pub address: Address,
}

impl From<&Member> for MemberRecord {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id().value(),
            name: member.name().to_owned(),
            age: member.age(),
            address: member.address().clone(),
        }
    }
}

/// Create request mirroring the full record shape (v1).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberRecordRequest {
    /// Display name.
    pub name: String,
    /// Age in years.
    pub age: i32,
    /// Home address.
    pub address: Address,
}

/// Dedicated create request (v2).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberRequest {
    /// Display name.
    pub name: String,
    /// Age in years; defaults to zero when omitted.
    #[serde(default)]
    pub age: Option<i32>,
    /// Home address.
    pub address: Address,
}

/// Name projection used by the v2 listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    /// Display name.
    pub name: String,
}

/// Rename request for `PUT /api/v2/members/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberRequest {
    /// New display name.
    pub name: String,
}

/// Rename response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberResponse {
    /// Member identifier.
    pub id: i64,
    /// Name after the update.
    pub name: String,
}

fn map_persistence_error(err: MemberPersistenceError) -> Error {
    match err {
        MemberPersistenceError::Connection { .. } => {
            Error::service_unavailable("member storage unavailable")
        }
        MemberPersistenceError::Query { message } => Error::internal(message),
    }
}

fn map_validation_error(err: MemberValidationError) -> Error {
    match err {
        MemberValidationError::EmptyName => Error::invalid_request("name must not be empty")
            .with_details(json!({ "field": "name", "code": "empty_name" })),
        MemberValidationError::NegativeAge(age) => {
            Error::invalid_request("age must not be negative")
                .with_details(json!({ "field": "age", "code": "negative_age", "value": age }))
        }
    }
}

/// List members as full records.
///
/// Exposing the storage shape couples every client to it; the v2 listing
/// exists to show the decoupled alternative.
#[utoipa::path(
    get,
    path = "/api/v1/members",
    responses(
        (status = 200, description = "Members", body = [MemberRecord]),
        (status = 503, description = "Storage unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["members"],
    operation_id = "listMembersV1"
)]
#[get("/v1/members")]
pub async fn list_members_v1(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<MemberRecord>>> {
    let members = state
        .members()
        .list()
        .await
        .map_err(map_persistence_error)?;
    Ok(web::Json(members.iter().map(MemberRecord::from).collect()))
}

/// List members as name projections inside a `data` envelope.
#[utoipa::path(
    get,
    path = "/api/v2/members",
    responses(
        (status = 200, description = "Members", body = DataEnvelope<Vec<MemberSummary>>),
        (status = 503, description = "Storage unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["members"],
    operation_id = "listMembersV2"
)]
#[get("/v2/members")]
pub async fn list_members_v2(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<DataEnvelope<Vec<MemberSummary>>>> {
    let members = state
        .members()
        .list()
        .await
        .map_err(map_persistence_error)?;
    let summaries = members
        .iter()
        .map(|member| MemberSummary {
            name: member.name().to_owned(),
        })
        .collect();
    Ok(web::Json(DataEnvelope::new(summaries)))
}

/// Create a member from the full record shape.
#[utoipa::path(
    post,
    path = "/api/v1/members",
    request_body = CreateMemberRecordRequest,
    responses(
        (status = 200, description = "Member created", body = IdResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 503, description = "Storage unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["members"],
    operation_id = "createMemberV1"
)]
#[post("/v1/members")]
pub async fn create_member_v1(
    state: web::Data<HttpState>,
    payload: web::Json<CreateMemberRecordRequest>,
) -> ApiResult<web::Json<IdResponse>> {
    let payload = payload.into_inner();
    let draft = NewMember::new(payload.name, payload.age, payload.address)
        .map_err(map_validation_error)?;
    let member = state
        .members()
        .create(&draft)
        .await
        .map_err(map_persistence_error)?;
    Ok(web::Json(IdResponse {
        id: member.id().value(),
    }))
}

/// Create a member from the dedicated create request.
#[utoipa::path(
    post,
    path = "/api/v2/members",
    request_body = CreateMemberRequest,
    responses(
        (status = 200, description = "Member created", body = IdResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 503, description = "Storage unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["members"],
    operation_id = "createMemberV2"
)]
#[post("/v2/members")]
pub async fn create_member_v2(
    state: web::Data<HttpState>,
    payload: web::Json<CreateMemberRequest>,
) -> ApiResult<web::Json<IdResponse>> {
    let payload = payload.into_inner();
    let draft = NewMember::new(payload.name, payload.age.unwrap_or(0), payload.address)
        .map_err(map_validation_error)?;
    let member = state
        .members()
        .create(&draft)
        .await
        .map_err(map_persistence_error)?;
    Ok(web::Json(IdResponse {
        id: member.id().value(),
    }))
}

/// Rename a member.
#[utoipa::path(
    put,
    path = "/api/v2/members/{id}",
    request_body = UpdateMemberRequest,
    params(("id" = i64, Path, description = "Member identifier")),
    responses(
        (status = 200, description = "Member renamed", body = UpdateMemberResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Member not found", body = Error),
        (status = 503, description = "Storage unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["members"],
    operation_id = "updateMemberV2"
)]
#[put("/v2/members/{id}")]
pub async fn update_member_v2(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    payload: web::Json<UpdateMemberRequest>,
) -> ApiResult<web::Json<UpdateMemberResponse>> {
    let id = MemberId::new(path.into_inner());
    let name = payload.into_inner().name;
    if name.trim().is_empty() {
        return Err(map_validation_error(MemberValidationError::EmptyName));
    }
    let member = state
        .members()
        .rename(id, &name)
        .await
        .map_err(map_persistence_error)?
        .ok_or_else(|| Error::not_found(format!("member {id} not found")))?;
    Ok(web::Json(UpdateMemberResponse {
        id: member.id().value(),
        name: member.name().to_owned(),
    }))
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
                .service(list_members_v1)
                .service(list_members_v2)
                .service(create_member_v1)
                .service(create_member_v2)
                .service(update_member_v2),
        )
    }

    fn seoul() -> Address {
        Address::new("Seoul", "Teheran-ro 1", "06234").expect("valid address")
    }

    #[rstest]
    #[actix_web::test]
    async fn v1_listing_exposes_full_records_in_camel_case() {
        let app = actix_test::init_service(test_app(HttpState::fixture())).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/members")
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let value: Value =
            serde_json::from_slice(&actix_test::read_body(response).await).expect("JSON");
        let members = value.as_array().expect("array");
        assert_eq!(members.len(), 2);
        assert_eq!(
            members[0].get("name").and_then(Value::as_str),
            Some("userA")
        );
        let address = members[0].get("address").expect("address");
        assert_eq!(
            address.get("zipcode").and_then(Value::as_str),
            Some("06234")
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn v2_listing_wraps_name_projections_in_an_envelope() {
        let app = actix_test::init_service(test_app(HttpState::fixture())).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v2/members")
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let value: Value =
            serde_json::from_slice(&actix_test::read_body(response).await).expect("JSON");
        let data = value.get("data").and_then(Value::as_array).expect("data");
        assert_eq!(data.len(), 2);
        assert_eq!(data[1].get("name").and_then(Value::as_str), Some("userB"));
        assert!(data[1].get("address").is_none());
    }

    #[rstest]
    #[actix_web::test]
    async fn v2_create_returns_the_new_identifier() {
        let app = actix_test::init_service(test_app(HttpState::empty_fixture())).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v2/members")
                .set_json(CreateMemberRequest {
                    name: "userC".into(),
                    age: None,
                    address: seoul(),
                })
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: IdResponse =
            serde_json::from_slice(&actix_test::read_body(response).await).expect("id body");
        assert_eq!(body.id, 1);
    }

    #[rstest]
    #[actix_web::test]
    async fn blank_names_are_rejected_with_field_details() {
        let app = actix_test::init_service(test_app(HttpState::empty_fixture())).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v2/members")
                .set_json(CreateMemberRequest {
                    name: "   ".into(),
                    age: Some(20),
                    address: seoul(),
                })
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let value: Value =
            serde_json::from_slice(&actix_test::read_body(response).await).expect("JSON");
        assert_eq!(
            value.get("code").and_then(Value::as_str),
            Some("invalid_request")
        );
        assert_eq!(
            value
                .get("details")
                .and_then(|details| details.get("code"))
                .and_then(Value::as_str),
            Some("empty_name")
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn rename_round_trips_and_rejects_unknown_members() {
        let app = actix_test::init_service(test_app(HttpState::fixture())).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri("/api/v2/members/1")
                .set_json(UpdateMemberRequest {
                    name: "renamedA".into(),
                })
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: UpdateMemberResponse =
            serde_json::from_slice(&actix_test::read_body(response).await).expect("body");
        assert_eq!(body.name, "renamedA");

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri("/api/v2/members/999")
                .set_json(UpdateMemberRequest {
                    name: "ghost".into(),
                })
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
