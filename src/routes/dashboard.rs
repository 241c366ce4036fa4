use mongodb::bson::oid::ObjectId;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::Deserialize;

use super::{parse_role, parse_time_range, resolve_user};
use crate::engine::Engine;
use crate::models::{DashboardResponse, Role, Section};
use crate::utils::{ApiError, ApiResponse};

#[derive(FromForm, Deserialize, JsonSchema)]
pub struct DashboardQuery {
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
    pub search: Option<String>,
    pub page: Option<u32>,
    #[field(name = "pageSize")]
    #[serde(rename = "pageSize")]
    pub page_size: Option<u32>,
    pub section: Option<String>,
}

impl DashboardQuery {
    fn user_id(&self, role: Role) -> Result<ObjectId, ApiError> {
        resolve_user(
            role,
            self.user_id.as_deref(),
            self.client_id.as_deref(),
            self.freelancer_id.as_deref(),
        )
    }

    fn section(&self) -> Result<Section, ApiError> {
        match self.section.as_deref() {
            Some(s) if !s.trim().is_empty() => s.parse().map_err(ApiError::bad_request),
            _ => Ok(Section::default()),
        }
    }
}

/// Full view-model: metrics, charts and one page of the selected review section.
#[openapi(tag = "Dashboard")]
#[get("/dashboard/<role>?<query..>")]
pub async fn get_dashboard(
    engine: &State<Engine>,
    role: String,
    query: DashboardQuery,
) -> Result<Json<ApiResponse<DashboardResponse>>, ApiError> {
    let role = parse_role(&role)?;
    let user_id = query.user_id(role)?;
    let view_query = engine.query(
        parse_time_range(query.time_range.as_deref())?,
        query.search.as_deref(),
        query.page,
        query.page_size,
        query.section()?,
    );

    let response = engine.view_model(user_id, role, view_query).await?;
    Ok(Json(ApiResponse::success(response)))
}
