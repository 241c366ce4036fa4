use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use super::{UserQuery, parse_role};
use crate::engine::Engine;
use crate::models::WalletSummary;
use crate::utils::{ApiError, ApiResponse};

#[openapi(tag = "Wallet")]
#[get("/wallet/<role>?<query..>")]
pub async fn get_wallet(
    engine: &State<Engine>,
    role: String,
    query: UserQuery,
) -> Result<Json<ApiResponse<WalletSummary>>, ApiError> {
    let role = parse_role(&role)?;
    let user_id = query.user_id(role)?;

    let summary = engine.wallet(user_id, query.time_range()?).await?;
    Ok(Json(ApiResponse::success(summary)))
}
