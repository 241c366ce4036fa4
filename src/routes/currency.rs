use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::Serialize;

use crate::engine::Engine;
use crate::models::Currency;
use crate::utils::{ApiError, ApiResponse};

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    pub amount: f64,
    pub from: Currency,
    pub to: Currency,
    pub converted: f64,
    pub rate: Option<f64>,
    pub rates_fetched_at: Option<String>,
}

#[openapi(tag = "Currency")]
#[get("/currency/convert?<amount>&<from>&<to>")]
pub async fn convert(
    engine: &State<Engine>,
    amount: f64,
    from: String,
    to: String,
) -> Result<Json<ApiResponse<Conversion>>, ApiError> {
    let from: Currency = from.parse().map_err(ApiError::bad_request)?;
    let to: Currency = to.parse().map_err(ApiError::bad_request)?;

    let table = engine.rates().table().await;
    Ok(Json(ApiResponse::success(Conversion {
        amount,
        from,
        to,
        converted: table.convert(amount, from, to),
        rate: table.effective_rate(from, to),
        rates_fetched_at: table.fetched_at().map(|t| t.to_rfc3339()),
    })))
}
