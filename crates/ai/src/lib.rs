//! `demandcast-ai`
//!
//! **Responsibility:** demand forecasting from historical sales.
//!
//! - Pure computation: no storage, no transport, no global state.
//! - Every call owns its scaler and model; nothing is shared between calls.
//! - Emits forecasts, never stock decisions (see `demandcast-inventory`).

pub mod cancel;
pub mod config;
pub mod demand_forecast;
pub mod forecaster;
pub mod job;
pub mod model;
pub mod result;
pub mod runner;
pub mod scaler;
pub mod scheduler;
pub mod sequencer;

pub use cancel::CancellationToken;
pub use config::{ForecastConfig, ModelConfig};
pub use demand_forecast::{DEGENERATE_CONFIDENCE, ForecastJob, forecast};
pub use forecaster::{Forecaster, MODEL_VERSION, TrainedModel, TrainingReport};
pub use job::AiJob;
pub use result::ForecastError;
pub use runner::{ForecastRunner, ForecastRunnerHandle, ForecastSink, InMemoryForecastSink};
pub use scaler::{ScaleTransform, ScaledSeries, fit_transform, inverse_transform};
pub use scheduler::{AiScheduler, LocalAiScheduler, ThreadedAiScheduler};
pub use sequencer::{WindowPair, WindowedDataset, make_windows};
