//! Forecast output handed back to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{ProductId, StoreId};
use crate::value_object::ValueObject;

/// One predicted quantity for one future period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub at: DateTime<Utc>,
    pub predicted_quantity: f64,
}

impl ValueObject for ForecastPoint {}

/// Result of one forecasting call over a horizon.
///
/// Built once per call and never mutated; persistence is the caller's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub product_id: ProductId,
    #[serde(default)]
    pub store_id: Option<StoreId>,
    pub points: Vec<ForecastPoint>,
    /// Mean of `points[*].predicted_quantity`.
    pub average: f64,
    /// Advisory score in \[0, 1\]; not a calibrated interval.
    pub confidence: f64,
    /// Set when the input series had zero variance.
    #[serde(default)]
    pub degenerate: bool,
    pub model_version: String,
}

impl ForecastResult {
    /// Build a result, deriving `average` from the points.
    pub fn new(
        product_id: ProductId,
        points: Vec<ForecastPoint>,
        confidence: f64,
        model_version: impl Into<String>,
    ) -> Self {
        let average = if points.is_empty() {
            0.0
        } else {
            points.iter().map(|p| p.predicted_quantity).sum::<f64>() / points.len() as f64
        };
        Self {
            product_id,
            store_id: None,
            points,
            average,
            confidence,
            degenerate: false,
            model_version: model_version.into(),
        }
    }

    pub fn with_store(mut self, store_id: Option<StoreId>) -> Self {
        self.store_id = store_id;
        self
    }

    pub fn with_degenerate(mut self, degenerate: bool) -> Self {
        self.degenerate = degenerate;
        self
    }

    pub fn horizon(&self) -> usize {
        self.points.len()
    }

    /// Sum of predicted quantities across the horizon.
    pub fn total_demand(&self) -> f64 {
        self.points.iter().map(|p| p.predicted_quantity).sum()
    }
}
