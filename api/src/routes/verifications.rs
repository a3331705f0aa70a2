use actix_web::{http::StatusCode, web, HttpResponse};
use tracing_actix_web::RequestId;
use uuid::Uuid;
use validator::Validate;

use crate::dto::{CreateVerificationBody, ListQuery, PollBatchResponse, VerificationResponse};
use crate::handlers::ApiError;
use crate::middleware::AuthContext;
use crate::state::AppState;

use super::respond;

/// POST /api/v1/verifications
///
/// Debits the caller's credits and rents a number for the requested service.
///
/// # Request Body
///
/// ```json
/// {
///     "service_name": "whatsapp",
///     "country": "US",
///     "area_code": "415"
/// }
/// ```
///
/// # Responses
/// - 201 with the pending verification
/// - 402 when the balance does not cover the price
/// - 409 / 503 / 504 when the provider could not rent a number; the debit
///   has been credited back
pub async fn create_verification(
    state: web::Data<AppState>,
    auth: AuthContext,
    body: web::Json<CreateVerificationBody>,
    request_id: RequestId,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let verification = state
        .lifecycle
        .create_verification(auth.session(), body.into())
        .await?;

    Ok(respond(
        StatusCode::CREATED,
        VerificationResponse::from(verification),
        &request_id,
    ))
}

/// GET /api/v1/verifications?limit=N
pub async fn list_verifications(
    state: web::Data<AppState>,
    auth: AuthContext,
    query: web::Query<ListQuery>,
    request_id: RequestId,
) -> Result<HttpResponse, ApiError> {
    query.validate()?;

    let verifications = state
        .lifecycle
        .list_verifications(auth.session(), query.limit)
        .await?;

    let body: Vec<VerificationResponse> = verifications.into_iter().map(Into::into).collect();
    Ok(respond(StatusCode::OK, body, &request_id))
}

/// GET /api/v1/verifications/{id}
pub async fn get_verification(
    state: web::Data<AppState>,
    auth: AuthContext,
    path: web::Path<Uuid>,
    request_id: RequestId,
) -> Result<HttpResponse, ApiError> {
    let verification = state
        .lifecycle
        .get_verification(auth.session(), path.into_inner())
        .await?;

    Ok(respond(StatusCode::OK, VerificationResponse::from(verification), &request_id))
}

/// POST /api/v1/verifications/{id}/poll
///
/// Asks the provider for news and returns the record in its post-poll state.
pub async fn poll_verification(
    state: web::Data<AppState>,
    auth: AuthContext,
    path: web::Path<Uuid>,
    request_id: RequestId,
) -> Result<HttpResponse, ApiError> {
    let verification = state
        .lifecycle
        .poll_verification(auth.session(), path.into_inner())
        .await?;

    Ok(respond(StatusCode::OK, VerificationResponse::from(verification), &request_id))
}

/// POST /api/v1/verifications/poll
///
/// Polls every pending record of the caller; per-record provider errors are
/// reported next to the results instead of failing the request.
pub async fn poll_pending(
    state: web::Data<AppState>,
    auth: AuthContext,
    request_id: RequestId,
) -> Result<HttpResponse, ApiError> {
    let batch = state.lifecycle.poll_pending_for_user(auth.session()).await?;
    Ok(respond(StatusCode::OK, PollBatchResponse::from(batch), &request_id))
}

/// POST /api/v1/verifications/{id}/cancel
pub async fn cancel_verification(
    state: web::Data<AppState>,
    auth: AuthContext,
    path: web::Path<Uuid>,
    request_id: RequestId,
) -> Result<HttpResponse, ApiError> {
    let verification = state
        .lifecycle
        .cancel_verification(auth.session(), path.into_inner())
        .await?;

    Ok(respond(StatusCode::OK, VerificationResponse::from(verification), &request_id))
}
