use serde::{Deserialize, Serialize};

use crate::recommendation::RecommendationError;

/// Days of average demand held above the reorder point.
pub const DEFAULT_BUFFER_DAYS: f64 = 7.0;

/// Stock above `recommended_stock * multiplier` is overstock.
pub const DEFAULT_OVERSTOCK_MULTIPLIER: f64 = 1.5;

/// Tunable thresholds for stock recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationPolicy {
    pub buffer_days: f64,
    pub overstock_multiplier: f64,
}

impl Default for RecommendationPolicy {
    fn default() -> Self {
        Self {
            buffer_days: DEFAULT_BUFFER_DAYS,
            overstock_multiplier: DEFAULT_OVERSTOCK_MULTIPLIER,
        }
    }
}

impl RecommendationPolicy {
    /// Read overrides from `RECOMMENDATION_BUFFER_DAYS` / `OVERSTOCK_MULTIPLIER`.
    pub fn from_env() -> Result<Self, RecommendationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, RecommendationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let policy = Self {
            buffer_days: parse_f64(&lookup, "RECOMMENDATION_BUFFER_DAYS", defaults.buffer_days)?,
            overstock_multiplier: parse_f64(
                &lookup,
                "OVERSTOCK_MULTIPLIER",
                defaults.overstock_multiplier,
            )?,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), RecommendationError> {
        if !(self.buffer_days.is_finite() && self.buffer_days >= 0.0) {
            return Err(RecommendationError::invalid_policy(
                "buffer_days must be finite and >= 0",
            ));
        }
        if !(self.overstock_multiplier.is_finite() && self.overstock_multiplier >= 1.0) {
            return Err(RecommendationError::invalid_policy(
                "overstock_multiplier must be finite and >= 1",
            ));
        }
        Ok(())
    }
}

fn parse_f64<F>(lookup: &F, key: &str, default: f64) -> Result<f64, RecommendationError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| RecommendationError::invalid_policy(format!("{key}={raw:?}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_overrides_and_validates() {
        let policy = RecommendationPolicy::from_lookup(|key: &str| match key {
            "RECOMMENDATION_BUFFER_DAYS" => Some("3.5".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(policy.buffer_days, 3.5);
        assert_eq!(policy.overstock_multiplier, DEFAULT_OVERSTOCK_MULTIPLIER);

        let err = RecommendationPolicy::from_lookup(|key: &str| match key {
            "OVERSTOCK_MULTIPLIER" => Some("0.5".to_string()),
            _ => None,
        })
        .unwrap_err();
        assert!(matches!(err, RecommendationError::InvalidPolicy(_)));
    }

    #[test]
    fn malformed_number_is_rejected() {
        let err = RecommendationPolicy::from_lookup(|key: &str| {
            (key == "RECOMMENDATION_BUFFER_DAYS").then(|| "a week".to_string())
        })
        .unwrap_err();
        match err {
            RecommendationError::InvalidPolicy(msg) => {
                assert!(msg.contains("RECOMMENDATION_BUFFER_DAYS"))
            }
            _ => panic!("Expected InvalidPolicy error"),
        }
    }
}
