//! Request/response plumbing for the `demandcast` binary.

use anyhow::Context;
use serde::{Deserialize, Serialize};

use demandcast_ai::{ForecastConfig, forecast};
use demandcast_core::{ForecastResult, TimeSeries};
use demandcast_inventory::{
    InventoryRecommendation, InventorySnapshot, RecommendationPolicy, recommend,
};

/// One forecast + recommendation request.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub series: TimeSeries,
    pub inventory: InventorySnapshot,
    /// Falls back to the configured horizon.
    #[serde(default)]
    pub horizon: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub forecast: ForecastResult,
    pub recommendation: InventoryRecommendation,
}

pub fn handle(
    request: &Request,
    config: &ForecastConfig,
    policy: &RecommendationPolicy,
) -> anyhow::Result<Response> {
    let product_id = request.series.product_id();
    if request.inventory.product_id != product_id {
        anyhow::bail!(
            "inventory snapshot is for product {}, series is for {}",
            request.inventory.product_id,
            product_id
        );
    }

    let forecast = forecast(&request.series, request.horizon, config)
        .with_context(|| format!("forecast failed for product {product_id}"))?;
    let recommendation = recommend(product_id, &request.inventory, &forecast, policy)
        .with_context(|| format!("recommendation failed for product {product_id}"))?;

    tracing::info!(
        product = %product_id,
        horizon = forecast.horizon(),
        confidence = forecast.confidence,
        risk = %recommendation.risk_level,
        "request handled"
    );

    Ok(Response {
        forecast,
        recommendation,
    })
}

/// Parse a JSON request, run it, and return the JSON response.
pub fn run_json(
    raw: &str,
    config: &ForecastConfig,
    policy: &RecommendationPolicy,
) -> anyhow::Result<String> {
    let request: Request = serde_json::from_str(raw).context("invalid request JSON")?;
    let response = handle(&request, config, policy)?;
    Ok(serde_json::to_string_pretty(&response)?)
}
