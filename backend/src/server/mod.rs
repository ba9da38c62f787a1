//! Server construction and route wiring.

mod config;
mod state_builders;

pub use config::{ServerConfig, ServerOptions};

use state_builders::build_http_state;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::info;

#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::inbound::http::health::{HealthState, healthz, readyz};
use crate::inbound::http::items::{create_item, list_items, update_item};
use crate::inbound::http::members::{
    create_member_v1, create_member_v2, list_members_v1, list_members_v2, update_member_v2,
};
use crate::inbound::http::orders::{
    cancel_order, list_orders_v1, list_orders_v2, list_orders_v3, list_orders_v3_paged,
    list_orders_v4, list_orders_v5, list_orders_v6, place_order,
};
use crate::inbound::http::simple_orders::{
    list_simple_orders_v1, list_simple_orders_v2, list_simple_orders_v3, list_simple_orders_v4,
};
use crate::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
    } = deps;

    let api = web::scope("/api")
        .service(list_members_v1)
        .service(list_members_v2)
        .service(create_member_v1)
        .service(create_member_v2)
        .service(update_member_v2)
        .service(create_item)
        .service(list_items)
        .service(update_item)
        .service(list_orders_v1)
        .service(list_orders_v2)
        .service(list_orders_v3)
        .service(list_orders_v3_paged)
        .service(list_orders_v4)
        .service(list_orders_v5)
        .service(list_orders_v6)
        .service(place_order)
        .service(cancel_order)
        .service(list_simple_orders_v1)
        .service(list_simple_orders_v2)
        .service(list_simple_orders_v3)
        .service(list_simple_orders_v4);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .service(api)
        .service(healthz)
        .service(readyz);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// Signal handling is owned here rather than by Actix: on `SIGINT` the
/// liveness probe is failed first, so orchestrators stop routing traffic,
/// and only then is the server drained gracefully.
///
/// # Parameters
/// - `health_state`: shared readiness state updated once the server is initialised.
/// - `config`: pre-built [`ServerConfig`] with the bind address and optional pool.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = build_http_state(&config);

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
        })
    })
    .disable_signals()
    .bind(config.bind_addr)?
    .run();

    let handle = server.handle();
    let drain_health_state = health_state.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received; failing liveness and draining");
            drain_health_state.mark_unhealthy();
            handle.stop(true).await;
        }
    });

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test as actix_test};
    use rstest::rstest;

    #[rstest]
    #[actix_web::test]
    async fn the_full_app_serves_probes_and_api_routes() {
        let health_state = web::Data::new(HealthState::new());
        health_state.mark_ready();
        let app = actix_test::init_service(build_app(AppDependencies {
            health_state,
            http_state: web::Data::new(HttpState::fixture()),
        }))
        .await;

        for uri in ["/readyz", "/healthz", "/api/v1/members", "/api/v3/orders"] {
            let response = actix_test::call_service(
                &app,
                actix_test::TestRequest::get().uri(uri).to_request(),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
        }
    }
}
