use actix_web::{http::StatusCode, web, HttpResponse};
use tracing_actix_web::RequestId;
use validator::Validate;

use crate::dto::{ActivityQuery, BulkCancelRequest, BulkCancelResponse};
use crate::handlers::ApiError;
use crate::middleware::AuthContext;
use crate::state::AppState;

use super::respond;

/// POST /api/v1/admin/verifications/bulk-cancel
///
/// Cancels and refunds every listed record that is still active. Unknown
/// or already finished IDs are skipped.
pub async fn bulk_cancel(
    state: web::Data<AppState>,
    auth: AuthContext,
    body: web::Json<BulkCancelRequest>,
    request_id: RequestId,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;

    let result = state
        .lifecycle
        .bulk_cancel(auth.session(), &body.verification_ids)
        .await?;

    tracing::info!(
        admin_id = %auth.session().user_id,
        requested = body.verification_ids.len(),
        cancelled = result.cancelled_count,
        "Bulk cancel finished"
    );

    Ok(respond(StatusCode::OK, BulkCancelResponse::from(result), &request_id))
}

/// GET /api/v1/admin/activity?limit=N
pub async fn recent_activity(
    state: web::Data<AppState>,
    auth: AuthContext,
    query: web::Query<ActivityQuery>,
    request_id: RequestId,
) -> Result<HttpResponse, ApiError> {
    query.validate()?;

    let entries = state
        .lifecycle
        .recent_activity(auth.session(), query.limit)
        .await?;

    Ok(respond(StatusCode::OK, entries, &request_id))
}
