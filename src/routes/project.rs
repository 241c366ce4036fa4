use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::Serialize;

use super::{UserQuery, parse_role};
use crate::engine::Engine;
use crate::models::ReviewRow;
use crate::utils::{ApiError, ApiResponse};

#[derive(Debug, Serialize, JsonSchema)]
pub struct ReviewableProjects {
    pub projects: Vec<ReviewRow>,
}

/// `<kind>` is `{role}-reviewable` (nobody has reviewed yet) or
/// `{role}-return-reviewable` (the counterparty is waiting on a return review).
#[openapi(tag = "Project")]
#[get("/projects/<kind>?<query..>")]
pub async fn get_reviewable_projects(
    engine: &State<Engine>,
    kind: String,
    query: UserQuery,
) -> Result<Json<ApiResponse<ReviewableProjects>>, ApiError> {
    let (role, returning) = if let Some(role) = kind.strip_suffix("-return-reviewable") {
        (role, true)
    } else if let Some(role) = kind.strip_suffix("-reviewable") {
        (role, false)
    } else {
        return Err(ApiError::not_found(format!("Unknown project listing '{}'", kind)));
    };
    let role = parse_role(role)?;
    let user_id = query.user_id(role)?;

    let ledger = engine.ledger(user_id, role).await?;
    let projects = if returning {
        ledger.needs_return_review
    } else {
        ledger.needs_first_review
    };

    Ok(Json(ApiResponse::success(ReviewableProjects { projects })))
}
