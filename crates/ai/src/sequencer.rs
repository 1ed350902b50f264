//! Sliding-window training pairs.

use crate::result::ForecastError;

/// One `(window -> next value)` training pair.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowPair {
    pub input: Vec<f64>,
    pub target: f64,
}

/// Training pairs over a scaled series, in chronological order.
///
/// Every `input` has exactly `window_size` elements.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedDataset {
    window_size: usize,
    pairs: Vec<WindowPair>,
}

impl WindowedDataset {
    /// Build a dataset from explicit pairs, checking window lengths.
    pub fn new(window_size: usize, pairs: Vec<WindowPair>) -> Result<Self, ForecastError> {
        if let Some(bad) = pairs.iter().find(|p| p.input.len() != window_size) {
            return Err(ForecastError::WindowMismatch {
                expected: window_size,
                actual: bad.input.len(),
            });
        }
        Ok(Self { window_size, pairs })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn pairs(&self) -> &[WindowPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Slide a window of `window_size` over `series`.
///
/// Produces `series.len() - window_size` pairs; needs at least
/// `window_size + 1` values.
pub fn make_windows(series: &[f64], window_size: usize) -> Result<WindowedDataset, ForecastError> {
    if window_size == 0 {
        return Err(ForecastError::invalid_config("window_size must be at least 1"));
    }
    if series.len() <= window_size {
        return Err(ForecastError::InsufficientData {
            required: window_size.saturating_add(1),
            available: series.len(),
        });
    }

    let pairs = series
        .windows(window_size + 1)
        .map(|w| WindowPair {
            input: w[..window_size].to_vec(),
            target: w[window_size],
        })
        .collect();

    Ok(WindowedDataset { window_size, pairs })
}
