//! Observed sales history for a single product.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::{ProductId, StoreId};
use crate::value_object::ValueObject;

/// A single observed quantity at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub at: DateTime<Utc>,
    pub quantity: f64,
}

impl Observation {
    pub fn new(at: DateTime<Utc>, quantity: f64) -> Self {
        Self { at, quantity }
    }
}

impl ValueObject for Observation {}

/// Chronological quantity series for one product (optionally one store).
///
/// Invariants (checked on construction and deserialization):
/// - timestamps are strictly increasing
/// - every quantity is finite and `>= 0`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TimeSeriesRepr", into = "TimeSeriesRepr")]
pub struct TimeSeries {
    product_id: ProductId,
    store_id: Option<StoreId>,
    observations: Vec<Observation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TimeSeriesRepr {
    product_id: ProductId,
    #[serde(default)]
    store_id: Option<StoreId>,
    observations: Vec<Observation>,
}

impl TryFrom<TimeSeriesRepr> for TimeSeries {
    type Error = DomainError;

    fn try_from(value: TimeSeriesRepr) -> Result<Self, Self::Error> {
        Self::new(value.product_id, value.store_id, value.observations)
    }
}

impl From<TimeSeries> for TimeSeriesRepr {
    fn from(value: TimeSeries) -> Self {
        Self {
            product_id: value.product_id,
            store_id: value.store_id,
            observations: value.observations,
        }
    }
}

impl TimeSeries {
    pub fn new(
        product_id: ProductId,
        store_id: Option<StoreId>,
        observations: Vec<Observation>,
    ) -> DomainResult<Self> {
        for (i, obs) in observations.iter().enumerate() {
            if !obs.quantity.is_finite() {
                return Err(DomainError::validation(format!(
                    "observation {i}: quantity must be finite"
                )));
            }
            if obs.quantity < 0.0 {
                return Err(DomainError::validation(format!(
                    "observation {i}: quantity cannot be negative ({})",
                    obs.quantity
                )));
            }
        }

        if let Some(i) = observations.windows(2).position(|w| w[1].at <= w[0].at) {
            return Err(DomainError::validation(format!(
                "timestamps must be strictly increasing (observation {} is not after {})",
                i + 1,
                i
            )));
        }

        Ok(Self {
            product_id,
            store_id,
            observations,
        })
    }

    /// Build a daily series starting at `start`, one observation per quantity.
    pub fn daily(
        product_id: ProductId,
        start: DateTime<Utc>,
        quantities: &[f64],
    ) -> DomainResult<Self> {
        let observations = quantities
            .iter()
            .enumerate()
            .map(|(i, &q)| Observation::new(start + Duration::days(i as i64), q))
            .collect();
        Self::new(product_id, None, observations)
    }

    pub fn with_store(mut self, store_id: StoreId) -> Self {
        self.store_id = Some(store_id);
        self
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn store_id(&self) -> Option<StoreId> {
        self.store_id
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Quantities in chronological order.
    pub fn quantities(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.quantity).collect()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.observations.last().map(|o| o.at)
    }

    /// Sub-series with `from <= at < to`.
    pub fn between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            product_id: self.product_id,
            store_id: self.store_id,
            observations: self
                .observations
                .iter()
                .filter(|o| o.at >= from && o.at < to)
                .copied()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn daily_series_has_one_day_spacing() {
        let series = TimeSeries::daily(ProductId::new(), test_start(), &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.quantities(), vec![1.0, 2.0, 3.0]);
        assert_eq!(
            series.last_timestamp(),
            Some(test_start() + Duration::days(2))
        );
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let err = TimeSeries::daily(ProductId::new(), test_start(), &[1.0, -2.0]).unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("negative")),
            _ => panic!("Expected Validation error for negative quantity"),
        }
    }

    #[test]
    fn non_finite_quantity_is_rejected() {
        let err = TimeSeries::daily(ProductId::new(), test_start(), &[f64::NAN]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn duplicate_timestamps_are_rejected() {
        let at = test_start();
        let err = TimeSeries::new(
            ProductId::new(),
            None,
            vec![Observation::new(at, 1.0), Observation::new(at, 2.0)],
        )
        .unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("strictly increasing")),
            _ => panic!("Expected Validation error for duplicate timestamps"),
        }
    }

    #[test]
    fn between_keeps_half_open_range() {
        let series =
            TimeSeries::daily(ProductId::new(), test_start(), &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let sub = series.between(
            test_start() + Duration::days(1),
            test_start() + Duration::days(3),
        );
        assert_eq!(sub.quantities(), vec![2.0, 3.0]);
        assert_eq!(sub.product_id(), series.product_id());
    }

    #[test]
    fn deserialization_enforces_invariants() {
        let product_id = ProductId::new();
        let json = serde_json::json!({
            "product_id": product_id,
            "observations": [
                { "at": "2024-01-02T00:00:00Z", "quantity": 1.0 },
                { "at": "2024-01-01T00:00:00Z", "quantity": 2.0 },
            ],
        });
        assert!(serde_json::from_value::<TimeSeries>(json).is_err());
    }

    #[test]
    fn serde_round_trip_keeps_store() {
        let store = StoreId::new();
        let series = TimeSeries::daily(ProductId::new(), test_start(), &[5.0, 6.0])
            .unwrap()
            .with_store(store);
        let json = serde_json::to_string(&series).unwrap();
        let back: TimeSeries = serde_json::from_str(&json).unwrap();
        assert_eq!(back, series);
        assert_eq!(back.store_id(), Some(store));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: `new` accepts exactly strictly increasing, non-negative series.
            #[test]
            fn new_accepts_only_ordered_non_negative_series(
                steps in prop::collection::vec((-2i64..4, -3.0f64..50.0), 0..20)
            ) {
                let mut at = test_start();
                let observations: Vec<Observation> = steps
                    .iter()
                    .map(|&(gap, quantity)| {
                        at += Duration::hours(gap);
                        Observation::new(at, quantity)
                    })
                    .collect();

                let ordered = steps.iter().skip(1).all(|&(gap, _)| gap > 0);
                let non_negative = steps.iter().all(|&(_, q)| q >= 0.0);

                let result = TimeSeries::new(ProductId::new(), None, observations.clone());
                prop_assert_eq!(result.is_ok(), ordered && non_negative);
                if let Ok(series) = result {
                    prop_assert_eq!(series.len(), observations.len());
                    prop_assert_eq!(series.observations(), observations.as_slice());
                }
            }
        }
    }
}
