use actix_web::{http::StatusCode, web, HttpResponse};
use tracing_actix_web::RequestId;

use crate::dto::BalanceResponse;
use crate::handlers::ApiError;
use crate::middleware::AuthContext;
use crate::state::AppState;

use super::respond;

/// GET /api/v1/account/balance
pub async fn get_balance(
    state: web::Data<AppState>,
    auth: AuthContext,
    request_id: RequestId,
) -> Result<HttpResponse, ApiError> {
    let credits = state.lifecycle.get_balance(auth.session()).await?;

    Ok(respond(
        StatusCode::OK,
        BalanceResponse {
            user_id: auth.session().user_id,
            credits,
        },
        &request_id,
    ))
}
