//! Forecasting configuration.
//!
//! Passed explicitly into every forecasting call; there is no process-wide
//! settings object. `from_env` is a convenience for binaries.

use core::fmt::Display;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::Activation;
use crate::result::ForecastError;

pub const DEFAULT_WINDOW_SIZE: usize = 30;
pub const DEFAULT_FORECAST_HORIZON: usize = 7;
pub const DEFAULT_TRAINING_EPOCHS: usize = 50;
pub const DEFAULT_BATCH_SIZE: usize = 32;
pub const DEFAULT_LEARNING_RATE: f64 = 0.001;
pub const DEFAULT_SEED: u64 = 42;

/// Network shape: GRU -> dropout -> GRU -> dropout -> dense -> scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub first_units: usize,
    pub second_units: usize,
    pub dense_units: usize,
    /// Dropout rate applied after each recurrent layer, in \[0, 1).
    pub dropout: f64,
    /// Activation of the GRU candidate state.
    pub activation: Activation,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            first_units: 64,
            second_units: 32,
            dense_units: 16,
            dropout: 0.2,
            activation: Activation::Tanh,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<(), ForecastError> {
        if self.first_units == 0 || self.second_units == 0 || self.dense_units == 0 {
            return Err(ForecastError::invalid_config("layer unit counts must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ForecastError::invalid_config(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub window_size: usize,
    pub forecast_horizon: usize,
    pub training_epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Clip each gradient component to `[-clip, clip]` before the Adam update.
    pub gradient_clip: Option<f64>,
    /// Seed for weight init, epoch shuffling and dropout masks.
    pub seed: u64,
    pub model: ModelConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            forecast_horizon: DEFAULT_FORECAST_HORIZON,
            training_epochs: DEFAULT_TRAINING_EPOCHS,
            batch_size: DEFAULT_BATCH_SIZE,
            learning_rate: DEFAULT_LEARNING_RATE,
            gradient_clip: Some(1.0),
            seed: DEFAULT_SEED,
            model: ModelConfig::default(),
        }
    }
}

impl ForecastConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self, ForecastError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ForecastError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            window_size: parse_var(&lookup, "MODEL_WINDOW_SIZE", defaults.window_size)?,
            forecast_horizon: parse_var(&lookup, "FORECAST_HORIZON", defaults.forecast_horizon)?,
            training_epochs: parse_var(&lookup, "TRAINING_EPOCHS", defaults.training_epochs)?,
            batch_size: parse_var(&lookup, "BATCH_SIZE", defaults.batch_size)?,
            learning_rate: parse_var(&lookup, "MODEL_LEARNING_RATE", defaults.learning_rate)?,
            seed: parse_var(&lookup, "MODEL_SEED", defaults.seed)?,
            ..defaults
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.forecast_horizon = horizon;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.training_epochs = epochs;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_model(mut self, model: ModelConfig) -> Self {
        self.model = model;
        self
    }

    pub fn validate(&self) -> Result<(), ForecastError> {
        if self.window_size == 0 {
            return Err(ForecastError::invalid_config("window_size must be at least 1"));
        }
        if self.forecast_horizon == 0 {
            return Err(ForecastError::ZeroHorizon);
        }
        if self.training_epochs == 0 {
            return Err(ForecastError::invalid_config("training_epochs must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(ForecastError::invalid_config("batch_size must be at least 1"));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ForecastError::invalid_config(
                "learning_rate must be a finite positive number",
            ));
        }
        if let Some(clip) = self.gradient_clip {
            if !(clip.is_finite() && clip > 0.0) {
                return Err(ForecastError::invalid_config(
                    "gradient_clip must be a finite positive number",
                ));
            }
        }
        self.model.validate()
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ForecastError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ForecastError::invalid_config(format!("{key}={raw:?}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_service_settings() {
        let config = ForecastConfig::default();
        assert_eq!(config.window_size, 30);
        assert_eq!(config.forecast_horizon, 7);
        assert_eq!(config.training_epochs, 50);
        assert_eq!(config.batch_size, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn lookup_overrides_defaults() {
        let config = ForecastConfig::from_lookup(lookup_from(&[
            ("MODEL_WINDOW_SIZE", "14"),
            ("FORECAST_HORIZON", " 3 "),
            ("MODEL_SEED", "7"),
        ]))
        .unwrap();
        assert_eq!(config.window_size, 14);
        assert_eq!(config.forecast_horizon, 3);
        assert_eq!(config.seed, 7);
        assert_eq!(config.training_epochs, DEFAULT_TRAINING_EPOCHS);
    }

    #[test]
    fn malformed_value_is_invalid_config() {
        let err = ForecastConfig::from_lookup(lookup_from(&[("BATCH_SIZE", "lots")])).unwrap_err();
        match err {
            ForecastError::InvalidConfig(msg) => assert!(msg.contains("BATCH_SIZE")),
            _ => panic!("Expected InvalidConfig error"),
        }
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let err = ForecastConfig::default().with_horizon(0).validate().unwrap_err();
        assert_eq!(err, ForecastError::ZeroHorizon);
    }

    #[test]
    fn dropout_must_be_below_one() {
        let model = ModelConfig {
            dropout: 1.0,
            ..ModelConfig::default()
        };
        assert!(ForecastConfig::default().with_model(model).validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ForecastConfig =
            serde_json::from_str(r#"{ "window_size": 10, "model": { "first_units": 8 } }"#)
                .unwrap();
        assert_eq!(config.window_size, 10);
        assert_eq!(config.model.first_units, 8);
        assert_eq!(config.model.second_units, 32);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }
}
