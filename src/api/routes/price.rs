//! Price card endpoint

use crate::api::error::{error_response, ApiResult};
use crate::api::server::AppState;
use crate::price::{format_change, sparkline_paths, PriceQuote, SparklinePaths};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    /// Sparkline box size in pixels
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct PriceResponse {
    pub quote: PriceQuote,
    pub change_label: String,
    pub sparkline: Vec<f64>,
    /// Absent when fewer than two points came back
    pub paths: Option<SparklinePaths>,
}

pub async fn get_price(
    State(state): State<AppState>,
    Query(query): Query<PriceQuery>,
) -> ApiResult<PriceResponse> {
    let quote = state.price.fetch_quote().await.map_err(|e| {
        error_response(StatusCode::BAD_GATEWAY, format!("Failed to fetch price data: {}", e))
    })?;

    // The quote is still useful without the chart
    let sparkline = match state.price.fetch_sparkline().await {
        Ok(prices) => prices,
        Err(e) => {
            warn!("[Price] Sparkline unavailable: {:#}", e);
            Vec::new()
        }
    };

    let paths = sparkline_paths(
        &sparkline,
        query.width.unwrap_or(200.0),
        query.height.unwrap_or(80.0),
    );

    Ok(Json(PriceResponse {
        change_label: format_change(quote.change_24h),
        quote,
        sparkline,
        paths,
    }))
}
