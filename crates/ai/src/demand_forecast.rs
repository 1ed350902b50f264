use chrono::Duration;
use tracing::{info, warn};

use demandcast_core::{ForecastPoint, ForecastResult, ProductId, TimeSeries};

use crate::cancel::CancellationToken;
use crate::config::ForecastConfig;
use crate::forecaster::{Forecaster, MODEL_VERSION};
use crate::job::AiJob;
use crate::result::ForecastError;
use crate::scaler::{fit_transform, inverse_transform};
use crate::sequencer::make_windows;

/// Confidence reported for zero-variance series, which are forecast as a
/// constant without training.
pub const DEGENERATE_CONFIDENCE: f64 = 0.1;

/// Demand forecast for one product series.
///
/// Pipeline:
/// - scale the series into \[0, 1\]
/// - slide `window_size` windows into training pairs
/// - train a fresh GRU forecaster
/// - roll it forward `horizon` steps from the last window
/// - map predictions back to physical units (floored at zero)
#[derive(Debug, Clone)]
pub struct ForecastJob {
    series: TimeSeries,
    config: ForecastConfig,
    horizon: Option<usize>,
    cancel: Option<CancellationToken>,
}

impl ForecastJob {
    pub fn new(series: TimeSeries, config: ForecastConfig) -> Self {
        Self {
            series,
            config,
            horizon: None,
            cancel: None,
        }
    }

    /// Override `config.forecast_horizon` for this job.
    pub fn with_horizon(mut self, horizon: Option<usize>) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn horizon(&self) -> usize {
        self.horizon.unwrap_or(self.config.forecast_horizon)
    }
}

impl AiJob for ForecastJob {
    type Input = TimeSeries;
    type Output = ForecastResult;

    fn product_id(&self) -> ProductId {
        self.series.product_id()
    }

    fn input(&self) -> &Self::Input {
        &self.series
    }

    fn run(&self) -> Result<ForecastResult, ForecastError> {
        let horizon = self.horizon();
        if horizon == 0 {
            return Err(ForecastError::ZeroHorizon);
        }
        let config = ForecastConfig {
            forecast_horizon: horizon,
            ..self.config.clone()
        };
        config.validate()?;

        let window = config.window_size;
        let quantities = self.series.quantities();
        let insufficient = ForecastError::InsufficientData {
            required: window.saturating_add(1),
            available: quantities.len(),
        };
        let last_at = self.series.last_timestamp().ok_or(insufficient.clone())?;

        let scaled = fit_transform(&quantities);
        let dataset = make_windows(&scaled.values, window)?;

        let (predicted, confidence) = if scaled.transform.is_degenerate() {
            warn!(
                product = %self.product_id(),
                value = scaled.transform.min,
                "series has zero variance; forecasting a constant"
            );
            (vec![scaled.transform.min; horizon], DEGENERATE_CONFIDENCE)
        } else {
            let model = Forecaster::new(&config)?.train(&dataset, self.cancel.as_ref())?;
            let seed = scaled
                .values
                .get(scaled.values.len() - window..)
                .ok_or(insufficient)?;
            let rollout = model.predict_horizon(seed, horizon)?;
            (
                inverse_transform(&rollout, &scaled.transform),
                model.confidence(),
            )
        };

        let points: Vec<ForecastPoint> = predicted
            .into_iter()
            .enumerate()
            .map(|(i, quantity)| ForecastPoint {
                at: last_at + Duration::days(i as i64 + 1),
                predicted_quantity: quantity.max(0.0),
            })
            .collect();

        let result = ForecastResult::new(self.product_id(), points, confidence, MODEL_VERSION)
            .with_store(self.series.store_id())
            .with_degenerate(scaled.transform.is_degenerate());

        info!(
            product = %result.product_id,
            horizon,
            average = result.average,
            confidence = result.confidence,
            "demand forecast complete"
        );
        Ok(result)
    }
}

/// Forecast `series` over `horizon` periods (or `config.forecast_horizon`).
pub fn forecast(
    series: &TimeSeries,
    horizon: Option<usize>,
    config: &ForecastConfig,
) -> Result<ForecastResult, ForecastError> {
    ForecastJob::new(series.clone(), config.clone())
        .with_horizon(horizon)
        .run()
}
