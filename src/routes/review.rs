use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{UserQuery, parse_role};
use crate::engine::Engine;
use crate::engine::submission::SubmissionState;
use crate::models::{CreateReviewDto, ReviewResponse, ReviewRow};
use crate::utils::validation::parse_object_id;
use crate::utils::{ApiError, ApiResponse};

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSections {
    pub given_reviews: Vec<ReviewRow>,
    pub received_reviews: Vec<ReviewRow>,
    pub reviewable_projects: Vec<ReviewRow>,
}

#[openapi(tag = "Review")]
#[post("/reviews", data = "<dto>")]
pub async fn create_review(
    engine: &State<Engine>,
    dto: Json<CreateReviewDto>,
) -> Result<Json<ApiResponse<ReviewResponse>>, ApiError> {
    let review = engine.submit_review(&dto).await?;

    Ok(Json(ApiResponse::success_with_message(
        "Review submitted successfully".to_string(),
        ReviewResponse::from(&review),
    )))
}

#[openapi(tag = "Review")]
#[get("/reviews/<role>?<query..>")]
pub async fn get_reviews(
    engine: &State<Engine>,
    role: String,
    query: UserQuery,
) -> Result<Json<ApiResponse<ReviewSections>>, ApiError> {
    let role = parse_role(&role)?;
    let user_id = query.user_id(role)?;

    let ledger = engine.ledger(user_id, role).await?;
    let reviewable_projects = ledger.reviewable();

    Ok(Json(ApiResponse::success(ReviewSections {
        given_reviews: ledger.given,
        received_reviews: ledger.received,
        reviewable_projects,
    })))
}

#[derive(FromForm, Deserialize, JsonSchema)]
pub struct SubmissionQuery {
    #[field(name = "reviewerId")]
    #[serde(rename = "reviewerId")]
    pub reviewer_id: String,
    #[field(name = "projectId")]
    #[serde(rename = "projectId")]
    pub project_id: String,
}

/// Where the reviewer's last submission for a project stands.
#[openapi(tag = "Review")]
#[get("/reviews/submission?<query..>")]
pub async fn get_submission_state(
    engine: &State<Engine>,
    query: SubmissionQuery,
) -> Result<Json<ApiResponse<SubmissionState>>, ApiError> {
    let reviewer_id = parse_object_id(&query.reviewer_id, "reviewer ID")?;
    let project_id = parse_object_id(&query.project_id, "project ID")?;

    Ok(Json(ApiResponse::success(
        engine.submission_state(reviewer_id, project_id),
    )))
}
