//! Route handlers
//!
//! This module contains the API endpoints:
//! - Health check
//! - Account balance
//! - Verification purchase, history, polling and cancellation
//! - Administrator bulk cancel and activity feed

pub mod account;
pub mod admin;
pub mod health;
pub mod verifications;

use actix_web::{http::StatusCode, web, HttpResponse};
use serde::Serialize;
use sv_shared::ApiResponse;
use tracing_actix_web::RequestId;

/// Wrap `data` in the success envelope
pub(crate) fn respond<T: Serialize>(status: StatusCode, data: T, request_id: &RequestId) -> HttpResponse {
    HttpResponse::build(status).json(ApiResponse::success(data).with_request_id(request_id.to_string()))
}

/// Register every `/api/v1` route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/account/balance", web::get().to(account::get_balance))
        .service(
            web::scope("/verifications")
                .route("", web::post().to(verifications::create_verification))
                .route("", web::get().to(verifications::list_verifications))
                .route("/poll", web::post().to(verifications::poll_pending))
                .route("/{id}", web::get().to(verifications::get_verification))
                .route("/{id}/poll", web::post().to(verifications::poll_verification))
                .route("/{id}/cancel", web::post().to(verifications::cancel_verification)),
        )
        .service(
            web::scope("/admin")
                .route("/verifications/bulk-cancel", web::post().to(admin::bulk_cancel))
                .route("/activity", web::get().to(admin::recent_activity)),
        );
}
