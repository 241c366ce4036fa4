use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;
use validator::Validate;

use super::Role;
use crate::utils::time::to_rfc3339;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewDirection {
    ClientToFreelancer,
    FreelancerToClient,
}

impl ReviewDirection {
    pub fn author(self) -> Role {
        match self {
            ReviewDirection::ClientToFreelancer => Role::Client,
            ReviewDirection::FreelancerToClient => Role::Freelancer,
        }
    }

    pub fn opposite(self) -> ReviewDirection {
        match self {
            ReviewDirection::ClientToFreelancer => ReviewDirection::FreelancerToClient,
            ReviewDirection::FreelancerToClient => ReviewDirection::ClientToFreelancer,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReviewDirection::ClientToFreelancer => "CLIENT_TO_FREELANCER",
            ReviewDirection::FreelancerToClient => "FREELANCER_TO_CLIENT",
        }
    }

    /// Accepts the wire names as well as the short `client`/`freelancer` forms.
    pub fn parse(value: &str) -> Option<ReviewDirection> {
        match value.trim().to_uppercase().replace('-', "_").as_str() {
            "CLIENT_TO_FREELANCER" | "CLIENT" => Some(ReviewDirection::ClientToFreelancer),
            "FREELANCER_TO_CLIENT" | "FREELANCER" => Some(ReviewDirection::FreelancerToClient),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub project_id: ObjectId,
    pub reviewer_id: ObjectId,
    pub reviewee_id: ObjectId,
    pub direction: ReviewDirection,
    pub rating: i32, // 1-5
    pub comment: Option<String>,
    pub created_at: DateTime,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewDto {
    /// Kept as raw JSON so a fractional or quoted rating is reported as a
    /// validation error rather than a body parse failure.
    pub rating: Option<serde_json::Value>,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
    pub project_id: Option<String>,
    pub reviewer_id: Option<String>,
    pub reviewee_id: Option<String>,
    pub freelancer_id: Option<String>,
    pub client_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: String,
    pub project_id: String,
    pub reviewer_id: String,
    pub reviewee_id: String,
    pub direction: ReviewDirection,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: String,
}

impl From<&Review> for ReviewResponse {
    fn from(review: &Review) -> Self {
        ReviewResponse {
            id: review.id.map(|id| id.to_hex()).unwrap_or_default(),
            project_id: review.project_id.to_hex(),
            reviewer_id: review.reviewer_id.to_hex(),
            reviewee_id: review.reviewee_id.to_hex(),
            direction: review.direction,
            rating: review.rating,
            comment: review.comment.clone(),
            created_at: to_rfc3339(review.created_at),
        }
    }
}
