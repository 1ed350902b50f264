use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use demandcast_core::{ForecastResult, ProductId};

use crate::policy::RecommendationPolicy;
use crate::snapshot::InventorySnapshot;

/// Stock position relative to forecast demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Understock,
    Optimal,
    Overstock,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Understock => "Understock",
            RiskLevel::Optimal => "Optimal",
            RiskLevel::Overstock => "Overstock",
        }
    }
}

impl core::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stock recommendation derived from one forecast and one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecommendation {
    pub product_id: ProductId,
    pub current_stock: f64,
    pub recommended_stock: f64,
    pub reorder_point: f64,
    pub risk_level: RiskLevel,
    /// Total forecast demand over the horizon.
    pub forecasted_demand: f64,
    pub forecast_horizon: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecommendationError {
    #[error("forecast horizon is empty")]
    ZeroHorizon,

    #[error("forecast is for product {forecast}, not {requested}")]
    ProductMismatch {
        requested: ProductId,
        forecast: ProductId,
    },

    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("invalid inventory snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("invalid forecast: {0}")]
    InvalidForecast(String),
}

impl RecommendationError {
    pub fn invalid_policy(msg: impl Into<String>) -> Self {
        Self::InvalidPolicy(msg.into())
    }

    pub fn invalid_snapshot(msg: impl Into<String>) -> Self {
        Self::InvalidSnapshot(msg.into())
    }

    pub fn invalid_forecast(msg: impl Into<String>) -> Self {
        Self::InvalidForecast(msg.into())
    }
}

/// Compute reorder point, recommended level and risk for `product_id`.
///
/// - `daily_rate = total_demand / horizon`
/// - `reorder_point = daily_rate * lead_time_days + safety_stock`
/// - `recommended_stock = reorder_point + buffer_days * daily_rate`
/// - risk: below the reorder point is understock; above
///   `recommended_stock * overstock_multiplier` is overstock; optimal otherwise.
pub fn recommend(
    product_id: ProductId,
    snapshot: &InventorySnapshot,
    forecast: &ForecastResult,
    policy: &RecommendationPolicy,
) -> Result<InventoryRecommendation, RecommendationError> {
    policy.validate()?;
    validate_snapshot(snapshot)?;

    if forecast.product_id != product_id {
        return Err(RecommendationError::ProductMismatch {
            requested: product_id,
            forecast: forecast.product_id,
        });
    }

    let horizon = forecast.horizon();
    if horizon == 0 {
        return Err(RecommendationError::ZeroHorizon);
    }
    validate_forecast(forecast)?;

    let total_demand = forecast.total_demand();
    let daily_rate = total_demand / horizon as f64;
    let reorder_point = daily_rate * f64::from(snapshot.lead_time_days) + snapshot.safety_stock;
    let recommended_stock = reorder_point + policy.buffer_days * daily_rate;
    let risk_level = classify(
        snapshot.current_stock,
        reorder_point,
        recommended_stock,
        policy.overstock_multiplier,
    );

    debug!(
        product = %product_id,
        daily_rate,
        reorder_point,
        recommended_stock,
        risk = %risk_level,
        "inventory recommendation computed"
    );

    Ok(InventoryRecommendation {
        product_id,
        current_stock: snapshot.current_stock,
        recommended_stock,
        reorder_point,
        risk_level,
        forecasted_demand: total_demand,
        forecast_horizon: horizon,
    })
}

/// Deterministic risk thresholds.
pub fn classify(
    current_stock: f64,
    reorder_point: f64,
    recommended_stock: f64,
    overstock_multiplier: f64,
) -> RiskLevel {
    if current_stock < reorder_point {
        RiskLevel::Understock
    } else if current_stock <= recommended_stock * overstock_multiplier {
        RiskLevel::Optimal
    } else {
        RiskLevel::Overstock
    }
}

fn validate_snapshot(snapshot: &InventorySnapshot) -> Result<(), RecommendationError> {
    if !snapshot.current_stock.is_finite() {
        return Err(RecommendationError::invalid_snapshot("current_stock must be finite"));
    }
    if !(snapshot.safety_stock.is_finite() && snapshot.safety_stock >= 0.0) {
        return Err(RecommendationError::invalid_snapshot(
            "safety_stock must be finite and >= 0",
        ));
    }
    Ok(())
}

/// Every predicted quantity must be finite and non-negative.
fn validate_forecast(forecast: &ForecastResult) -> Result<(), RecommendationError> {
    match forecast
        .points
        .iter()
        .position(|p| !(p.predicted_quantity.is_finite() && p.predicted_quantity >= 0.0))
    {
        Some(i) => Err(RecommendationError::invalid_forecast(format!(
            "point {i}: predicted_quantity must be finite and >= 0 (got {})",
            forecast.points[i].predicted_quantity
        ))),
        None => Ok(()),
    }
}
