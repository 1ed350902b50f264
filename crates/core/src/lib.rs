//! `demandcast-core` : shared domain types for demand forecasting.
//!
//! This crate contains **pure data** primitives (no numerics, no IO).

pub mod error;
pub mod forecast;
pub mod id;
pub mod series;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use forecast::{ForecastPoint, ForecastResult};
pub use id::{ProductId, StoreId};
pub use series::{Observation, TimeSeries};
pub use value_object::ValueObject;
