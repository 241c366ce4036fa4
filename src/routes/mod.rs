pub mod analytics;
pub mod currency;
pub mod dashboard;
pub mod health;
pub mod project;
pub mod review;
pub mod wallet;

use mongodb::bson::oid::ObjectId;
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::Deserialize;

use crate::models::{Role, TimeRange};
use crate::utils::ApiError;
use crate::utils::validation::parse_object_id;

/// Identifies the dashboard owner. Accepts `userId` or the role-specific
/// `clientId` / `freelancerId` names the front-end sends.
#[derive(FromForm, Deserialize, JsonSchema, Default)]
pub struct UserQuery {
    #[field(name = "userId")]
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[field(name = "clientId")]
    #[serde(rename = "clientId")]
    pub client_id: Option<String>,
    #[field(name = "freelancerId")]
    #[serde(rename = "freelancerId")]
    pub freelancer_id: Option<String>,
    #[field(name = "timeRange")]
    #[serde(rename = "timeRange")]
    pub time_range: Option<String>,
}

impl UserQuery {
    pub fn user_id(&self, role: Role) -> Result<ObjectId, ApiError> {
        resolve_user(
            role,
            self.user_id.as_deref(),
            self.client_id.as_deref(),
            self.freelancer_id.as_deref(),
        )
    }

    pub fn time_range(&self) -> Result<TimeRange, ApiError> {
        parse_time_range(self.time_range.as_deref())
    }
}

pub fn resolve_user(
    role: Role,
    user_id: Option<&str>,
    client_id: Option<&str>,
    freelancer_id: Option<&str>,
) -> Result<ObjectId, ApiError> {
    let role_specific = match role {
        Role::Client => client_id,
        Role::Freelancer => freelancer_id,
    };
    let raw = user_id
        .or(role_specific)
        .ok_or_else(|| ApiError::bad_request("userId is required"))?;
    Ok(parse_object_id(raw, "user ID")?)
}

pub fn parse_role(role: &str) -> Result<Role, ApiError> {
    role.parse().map_err(ApiError::bad_request)
}

pub fn parse_time_range(value: Option<&str>) -> Result<TimeRange, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => v.parse().map_err(ApiError::bad_request),
        _ => Ok(TimeRange::default()),
    }
}
