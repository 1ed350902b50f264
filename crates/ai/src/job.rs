use demandcast_core::ProductId;

use crate::result::ForecastError;

/// A self-contained, product-scoped inference unit.
///
/// Jobs own their input snapshot and all model state they create, so any
/// number of them can run on separate threads without sharing anything.
/// This crate stays storage-agnostic: inputs are provided by callers.
pub trait AiJob: Send + Sync + 'static {
    type Input: Send + Sync + 'static;
    type Output: Send + 'static;

    /// The product this job produces output for.
    fn product_id(&self) -> ProductId;

    /// The input snapshot the job will run inference on.
    fn input(&self) -> &Self::Input;

    /// Execute inference. Blocking; may take seconds for large series.
    fn run(&self) -> Result<Self::Output, ForecastError>;
}
