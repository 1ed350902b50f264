//! Inventory recommendation module.
//!
//! Turns a demand forecast plus a stock snapshot into a reorder point and a
//! risk level. Pure, deterministic logic (no IO, no model invocation).

pub mod policy;
pub mod recommendation;
pub mod snapshot;

pub use policy::RecommendationPolicy;
pub use recommendation::{InventoryRecommendation, RecommendationError, RiskLevel, recommend};
pub use snapshot::InventorySnapshot;
