//! Background forecasting worker.
//!
//! Lets a host keep its request path responsive while training runs on a
//! dedicated thread. Failures are logged and delivered to the sink; they never
//! take the worker down.

use std::sync::{Arc, Mutex, PoisonError, mpsc};
use std::thread;

use tracing::{info, warn};

use demandcast_core::{ForecastResult, ProductId, TimeSeries};

use crate::cancel::CancellationToken;
use crate::config::ForecastConfig;
use crate::demand_forecast::ForecastJob;
use crate::job::AiJob;
use crate::result::ForecastError;

/// Sink for forecast outcomes (successes and failures).
pub trait ForecastSink: Send + Sync + 'static {
    fn emit(&self, product_id: ProductId, outcome: Result<ForecastResult, ForecastError>);
}

/// In-memory sink for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryForecastSink {
    inner: Mutex<Vec<(ProductId, Result<ForecastResult, ForecastError>)>>,
}

impl InMemoryForecastSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<(ProductId, Result<ForecastResult, ForecastError>)> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ForecastSink for InMemoryForecastSink {
    fn emit(&self, product_id: ProductId, outcome: Result<ForecastResult, ForecastError>) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((product_id, outcome));
    }
}

#[derive(Debug)]
struct ForecastRequest {
    series: TimeSeries,
    horizon: Option<usize>,
}

/// Config for the forecast runner.
#[derive(Debug, Clone)]
pub struct ForecastRunner {
    pub config: ForecastConfig,
    /// Bounded request queue; `submit` blocks while it is full.
    pub queue_capacity: usize,
}

impl Default for ForecastRunner {
    fn default() -> Self {
        Self {
            config: ForecastConfig::default(),
            queue_capacity: 64,
        }
    }
}

/// Handle for the running worker (submit + shutdown).
#[derive(Debug)]
pub struct ForecastRunnerHandle {
    requests: Option<mpsc::SyncSender<ForecastRequest>>,
    cancel: CancellationToken,
    join: Option<thread::JoinHandle<()>>,
}

impl ForecastRunnerHandle {
    /// Queue a forecast for `series`.
    pub fn submit(&self, series: TimeSeries, horizon: Option<usize>) -> Result<(), ForecastError> {
        let sender = self
            .requests
            .as_ref()
            .ok_or_else(|| ForecastError::Internal("runner is closed".to_string()))?;
        sender
            .send(ForecastRequest { series, horizon })
            .map_err(|_| ForecastError::Internal("runner thread has stopped".to_string()))
    }

    /// Finish every queued request, then stop the worker.
    pub fn join(mut self) {
        self.requests.take();
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }

    /// Cancel the in-flight training run, drop queued requests, and stop.
    pub fn shutdown(mut self) {
        self.cancel.cancel();
        self.requests.take();
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

impl ForecastRunner {
    pub fn with_config(mut self, config: ForecastConfig) -> Self {
        self.config = config;
        self
    }

    /// Spawn the worker thread.
    pub fn spawn<S>(&self, name: &'static str, sink: Arc<S>) -> std::io::Result<ForecastRunnerHandle>
    where
        S: ForecastSink,
    {
        let (tx, rx) = mpsc::sync_channel::<ForecastRequest>(self.queue_capacity.max(1));
        let cancel = CancellationToken::new();

        let cfg = self.config.clone();
        let worker_cancel = cancel.clone();
        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || runner_loop(name, cfg, rx, worker_cancel, sink))?;

        Ok(ForecastRunnerHandle {
            requests: Some(tx),
            cancel,
            join: Some(join),
        })
    }
}

fn runner_loop<S>(
    name: &'static str,
    cfg: ForecastConfig,
    rx: mpsc::Receiver<ForecastRequest>,
    cancel: CancellationToken,
    sink: Arc<S>,
) where
    S: ForecastSink,
{
    info!(runner = name, "forecast runner started");

    for request in rx {
        if cancel.is_cancelled() {
            warn!(runner = name, "forecast runner cancelled; dropping queued requests");
            break;
        }

        let product_id = request.series.product_id();
        let job = ForecastJob::new(request.series, cfg.clone())
            .with_horizon(request.horizon)
            .with_cancellation(cancel.clone());

        let outcome = job.run();
        if let Err(e) = &outcome {
            warn!(runner = name, product = %product_id, error = %e, "forecast job failed");
        }
        sink.emit(product_id, outcome);
    }

    info!(runner = name, "forecast runner stopped");
}
