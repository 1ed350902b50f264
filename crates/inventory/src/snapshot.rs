use serde::{Deserialize, Serialize};

use demandcast_core::{ProductId, StoreId};

pub const DEFAULT_LEAD_TIME_DAYS: u32 = 7;

/// Current stock position for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub product_id: ProductId,
    #[serde(default)]
    pub store_id: Option<StoreId>,
    pub current_stock: f64,
    #[serde(default)]
    pub safety_stock: f64,
    #[serde(default = "default_lead_time_days")]
    pub lead_time_days: u32,
}

fn default_lead_time_days() -> u32 {
    DEFAULT_LEAD_TIME_DAYS
}

impl InventorySnapshot {
    pub fn new(product_id: ProductId, current_stock: f64) -> Self {
        Self {
            product_id,
            store_id: None,
            current_stock,
            safety_stock: 0.0,
            lead_time_days: DEFAULT_LEAD_TIME_DAYS,
        }
    }

    pub fn with_safety_stock(mut self, safety_stock: f64) -> Self {
        self.safety_stock = safety_stock;
        self
    }

    pub fn with_lead_time_days(mut self, days: u32) -> Self {
        self.lead_time_days = days;
        self
    }

    pub fn with_store(mut self, store_id: StoreId) -> Self {
        self.store_id = Some(store_id);
        self
    }
}
