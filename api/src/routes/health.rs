use actix_web::{web, HttpResponse};
use sv_shared::HealthResponse;

use crate::state::AppState;

/// Liveness, plus a database ping when MySQL backs the service
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let mut health = HealthResponse::healthy("sv-api", env!("CARGO_PKG_VERSION"));

    if let Some(database) = &state.database {
        if database.ping().await.is_err() {
            health.status = "unhealthy".to_string();
            return HttpResponse::ServiceUnavailable().json(health);
        }
        let stats = database.statistics();
        if stats.is_saturated() {
            tracing::warn!(stats = %stats, "Database pool saturated");
        }
    }

    HttpResponse::Ok().json(health)
}
