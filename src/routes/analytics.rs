use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use super::{UserQuery, parse_role};
use crate::engine::Engine;
use crate::models::AnalyticsSnapshot;
use crate::utils::{ApiError, ApiResponse};

/// Aggregate metrics for one user. Individual failing sources degrade to
/// zeros; 503 only when all of them fail.
#[openapi(tag = "Analytics")]
#[get("/analytics/<role>?<query..>")]
pub async fn get_analytics(
    engine: &State<Engine>,
    role: String,
    query: UserQuery,
) -> Result<Json<ApiResponse<AnalyticsSnapshot>>, ApiError> {
    let role = parse_role(&role)?;
    let user_id = query.user_id(role)?;
    let time_range = query.time_range()?;

    let snapshot = engine.analytics(user_id, role, time_range).await?;
    Ok(Json(ApiResponse::success(snapshot)))
}
