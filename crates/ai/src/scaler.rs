//! Min-max scaling into \[0, 1\].

use serde::{Deserialize, Serialize};

/// Fitted min-max range of a source series.
///
/// Passed explicitly between `fit_transform` and `inverse_transform`; there is
/// no hidden scaler state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleTransform {
    pub min: f64,
    pub max: f64,
}

impl ScaleTransform {
    /// Zero-variance range (`max == min`).
    pub fn is_degenerate(&self) -> bool {
        self.max == self.min
    }

    pub fn transform(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        (value - self.min) / (self.max - self.min)
    }

    pub fn inverse(&self, scaled: f64) -> f64 {
        if self.is_degenerate() {
            return self.min;
        }
        scaled * (self.max - self.min) + self.min
    }
}

/// Scaled values plus the transform that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledSeries {
    pub values: Vec<f64>,
    pub transform: ScaleTransform,
}

/// Fit the range of `series` and scale it.
///
/// A constant series maps to all zeros. An empty series yields an empty result
/// with a `{0, 0}` transform.
pub fn fit_transform(series: &[f64]) -> ScaledSeries {
    let transform = match series.first() {
        None => ScaleTransform { min: 0.0, max: 0.0 },
        Some(&first) => {
            let (min, max) = series
                .iter()
                .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
            ScaleTransform { min, max }
        }
    };

    ScaledSeries {
        values: series.iter().map(|&v| transform.transform(v)).collect(),
        transform,
    }
}

pub fn inverse_transform(scaled: &[f64], transform: &ScaleTransform) -> Vec<f64> {
    scaled.iter().map(|&v| transform.inverse(v)).collect()
}
