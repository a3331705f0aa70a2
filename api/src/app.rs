//! Application factory
//!
//! Builds the actix-web `App` from shared state and configuration. The
//! binary and the integration tests both go through [`create_app`].

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App, Error, HttpResponse,
};
use sv_shared::{error_codes, ApiResponse, AppConfig, ErrorResponse};
use tracing_actix_web::TracingLogger;

use crate::handlers::error::{json_error_handler, path_error_handler, query_error_handler};
use crate::middleware::{create_cors, JwtAuth};
use crate::routes;
use crate::state::AppState;

/// Create and configure the application with all dependencies
pub fn create_app(
    state: web::Data<AppState>,
    config: &AppConfig,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state)
        .app_data(
            web::JsonConfig::default()
                .limit(config.server.max_payload_size)
                .error_handler(json_error_handler),
        )
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        // Outermost last: the request span wraps CORS and auth
        .wrap(create_cors(&config.server, config.environment))
        .wrap(TracingLogger::default())
        .route("/health", web::get().to(routes::health::health_check))
        .service(
            web::scope("/api/v1")
                .wrap(JwtAuth::new(&config.auth))
                .configure(routes::configure),
        )
        .default_service(web::route().to(not_found))
}

/// Default 404 handler
async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::<()>::error(ErrorResponse::new(
        error_codes::NOT_FOUND,
        "The requested resource was not found",
    )))
}
