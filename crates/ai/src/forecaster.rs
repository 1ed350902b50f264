//! Training and autoregressive rollout.
//!
//! `Forecaster` is the untrained model; `train` consumes it and yields an
//! immutable `TrainedModel`. A new model always means a new `Forecaster`.

use std::iter;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::cancel::CancellationToken;
use crate::config::ForecastConfig;
use crate::model::{Adam, Network};
use crate::result::ForecastError;
use crate::sequencer::WindowedDataset;

/// Version tag written into every `ForecastResult` produced by this model.
pub const MODEL_VERSION: &str = "gru-v1";

/// Untrained model plus the RNG stream that drives its training.
#[derive(Debug, Clone)]
pub struct Forecaster {
    config: ForecastConfig,
    network: Network,
    rng: ChaCha8Rng,
}

/// Summary of a completed training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub epochs: usize,
    /// Mean squared error per epoch (training mode, scaled units).
    pub loss_history: Vec<f64>,
    /// In-sample RMSE with dropout disabled (scaled units).
    pub rmse: f64,
}

impl TrainingReport {
    pub fn final_loss(&self) -> Option<f64> {
        self.loss_history.last().copied()
    }
}

#[derive(Debug, Clone)]
pub struct TrainedModel {
    window_size: usize,
    network: Network,
    report: TrainingReport,
}

impl Forecaster {
    pub fn new(config: &ForecastConfig) -> Result<Self, ForecastError> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let network = Network::new(&config.model, &mut rng);
        Ok(Self {
            config: config.clone(),
            network,
            rng,
        })
    }

    pub fn window_size(&self) -> usize {
        self.config.window_size
    }

    /// Fit the network to `dataset` by minimizing MSE with Adam.
    ///
    /// `cancel` is checked before every epoch.
    pub fn train(
        mut self,
        dataset: &WindowedDataset,
        cancel: Option<&CancellationToken>,
    ) -> Result<TrainedModel, ForecastError> {
        if dataset.is_empty() {
            return Err(ForecastError::EmptyDataset);
        }
        if dataset.window_size() != self.config.window_size {
            return Err(ForecastError::WindowMismatch {
                expected: self.config.window_size,
                actual: dataset.window_size(),
            });
        }

        let epochs = self.config.training_epochs;
        let mut optimizer = Adam::new(self.config.learning_rate, self.config.gradient_clip);
        let mut order: Vec<usize> = (0..dataset.len()).collect();
        let mut loss_history = Vec::with_capacity(epochs.min(1024));

        for epoch in 0..epochs {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                return Err(ForecastError::Cancelled { epoch });
            }

            order.shuffle(&mut self.rng);
            let mut squared_error = 0.0;

            for batch in order.chunks(self.config.batch_size) {
                let mut grads = self.network.zero_gradients();
                let scale = 2.0 / batch.len() as f64;

                for &i in batch {
                    let pair = &dataset.pairs()[i];
                    let masks = self.network.sample_masks(pair.input.len(), &mut self.rng);
                    let trace = self.network.forward(&pair.input, Some(&masks));
                    let error = trace.output - pair.target;
                    squared_error += error * error;
                    self.network
                        .backward(&trace, Some(&masks), scale * error, &mut grads);
                }

                optimizer.begin_step();
                self.network.apply_gradients(&grads, &mut optimizer);
            }

            let loss = squared_error / dataset.len() as f64;
            if !loss.is_finite() {
                return Err(ForecastError::TrainingDiverged { epoch });
            }
            debug!(epoch, loss, "training epoch complete");
            loss_history.push(loss);
        }

        let rmse = in_sample_rmse(&self.network, dataset);
        if !rmse.is_finite() {
            return Err(ForecastError::TrainingDiverged { epoch: epochs });
        }

        let report = TrainingReport {
            epochs,
            loss_history,
            rmse,
        };
        info!(
            epochs,
            pairs = dataset.len(),
            rmse,
            "forecaster trained"
        );

        Ok(TrainedModel {
            window_size: self.config.window_size,
            network: self.network,
            report,
        })
    }
}

fn in_sample_rmse(network: &Network, dataset: &WindowedDataset) -> f64 {
    let sse: f64 = dataset
        .pairs()
        .iter()
        .map(|p| {
            let e = network.predict(&p.input) - p.target;
            e * e
        })
        .sum();
    (sse / dataset.len() as f64).sqrt()
}

impl TrainedModel {
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn report(&self) -> &TrainingReport {
        &self.report
    }

    /// Heuristic score in \[0, 1\]: one minus the in-sample RMSE in scaled units.
    pub fn confidence(&self) -> f64 {
        (1.0 - self.report.rmse).clamp(0.0, 1.0)
    }

    /// One-step prediction for a window of exactly `window_size` values.
    pub fn predict(&self, window: &[f64]) -> Result<f64, ForecastError> {
        self.check_window(window)?;
        let next = self.network.predict(window);
        if !next.is_finite() {
            return Err(ForecastError::TrainingDiverged {
                epoch: self.report.epochs,
            });
        }
        Ok(next)
    }

    /// Autoregressive rollout over `horizon` steps.
    ///
    /// Each step predicts from the current window, then shifts the prediction
    /// in and the oldest value out. Later steps therefore consume earlier
    /// predictions, not observations.
    pub fn predict_horizon(
        &self,
        seed_window: &[f64],
        horizon: usize,
    ) -> Result<Vec<f64>, ForecastError> {
        if horizon == 0 {
            return Err(ForecastError::ZeroHorizon);
        }
        self.check_window(seed_window)?;

        let (_, predictions) = (0..horizon).try_fold(
            (seed_window.to_vec(), Vec::with_capacity(horizon)),
            |(window, mut predictions), _| {
                let next = self.predict(&window)?;
                predictions.push(next);
                Ok::<_, ForecastError>((advance(&window, next), predictions))
            },
        )?;

        Ok(predictions)
    }

    fn check_window(&self, window: &[f64]) -> Result<(), ForecastError> {
        if window.len() != self.window_size {
            return Err(ForecastError::WindowMismatch {
                expected: self.window_size,
                actual: window.len(),
            });
        }
        Ok(())
    }
}

fn advance(window: &[f64], next: f64) -> Vec<f64> {
    window
        .iter()
        .skip(1)
        .copied()
        .chain(iter::once(next))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::model::Activation;
    use crate::scaler::fit_transform;
    use crate::sequencer::{WindowPair, make_windows};

    fn small_config(window: usize) -> ForecastConfig {
        ForecastConfig::default()
            .with_window_size(window)
            .with_epochs(40)
            .with_batch_size(8)
            .with_model(ModelConfig {
                first_units: 8,
                second_units: 4,
                dense_units: 4,
                dropout: 0.0,
                activation: Activation::Tanh,
            })
    }

    fn wave(len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| 20.0 + 5.0 * ((i as f64) * 0.6).sin())
            .collect()
    }

    fn trained(window: usize) -> TrainedModel {
        let scaled = fit_transform(&wave(80));
        let dataset = make_windows(&scaled.values, window).unwrap();
        Forecaster::new(&small_config(window))
            .unwrap()
            .train(&dataset, None)
            .unwrap()
    }

    #[test]
    fn advance_shifts_window_left() {
        assert_eq!(advance(&[1.0, 2.0, 3.0], 4.0), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn training_reduces_loss() {
        let mut config = small_config(6);
        config.learning_rate = 0.01;
        let scaled = fit_transform(&wave(80));
        let dataset = make_windows(&scaled.values, 6).unwrap();

        let model = Forecaster::new(&config).unwrap().train(&dataset, None).unwrap();
        let history = &model.report().loss_history;
        assert_eq!(history.len(), 40);
        assert!(
            history[history.len() - 1] < history[0],
            "loss did not decrease: first={}, last={}",
            history[0],
            history[history.len() - 1]
        );
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let dataset = WindowedDataset::new(4, Vec::new()).unwrap();
        let err = Forecaster::new(&small_config(4))
            .unwrap()
            .train(&dataset, None)
            .unwrap_err();
        assert_eq!(err, ForecastError::EmptyDataset);
    }

    #[test]
    fn dataset_window_must_match_config() {
        let dataset = WindowedDataset::new(
            3,
            vec![WindowPair {
                input: vec![0.1, 0.2, 0.3],
                target: 0.4,
            }],
        )
        .unwrap();
        let err = Forecaster::new(&small_config(4))
            .unwrap()
            .train(&dataset, None)
            .unwrap_err();
        assert_eq!(err, ForecastError::WindowMismatch { expected: 4, actual: 3 });
    }

    #[test]
    fn cancelled_token_stops_before_first_epoch() {
        let scaled = fit_transform(&wave(30));
        let dataset = make_windows(&scaled.values, 5).unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let err = Forecaster::new(&small_config(5))
            .unwrap()
            .train(&dataset, Some(&token))
            .unwrap_err();
        assert_eq!(err, ForecastError::Cancelled { epoch: 0 });
    }

    #[test]
    fn horizon_has_requested_length() {
        let model = trained(5);
        let seed = fit_transform(&wave(80)).values[75..].to_vec();
        for horizon in [1, 7, 30] {
            let predictions = model.predict_horizon(&seed, horizon).unwrap();
            assert_eq!(predictions.len(), horizon);
            assert!(predictions.iter().all(|p| p.is_finite()));
        }
    }

    #[test]
    fn rollout_feeds_predictions_back() {
        let model = trained(5);
        let seed = fit_transform(&wave(80)).values[75..].to_vec();
        let predictions = model.predict_horizon(&seed, 2).unwrap();

        let first = model.predict(&seed).unwrap();
        let second = model.predict(&advance(&seed, first)).unwrap();
        assert_eq!(predictions, vec![first, second]);
    }

    #[test]
    fn rollout_is_repeatable() {
        let model = trained(5);
        let seed = [0.2, 0.4, 0.6, 0.8, 1.0];
        assert_eq!(
            model.predict_horizon(&seed, 7).unwrap(),
            model.predict_horizon(&seed, 7).unwrap()
        );
    }

    #[test]
    fn zero_horizon_and_bad_seed_window_are_rejected() {
        let model = trained(5);
        assert_eq!(
            model.predict_horizon(&[0.1; 5], 0).unwrap_err(),
            ForecastError::ZeroHorizon
        );
        assert_eq!(
            model.predict_horizon(&[0.1; 4], 3).unwrap_err(),
            ForecastError::WindowMismatch { expected: 5, actual: 4 }
        );
    }

    #[test]
    fn same_seed_trains_identical_models() {
        let a = trained(5);
        let b = trained(5);
        assert_eq!(a.report(), b.report());
        assert!((0.0..=1.0).contains(&a.confidence()));
    }
}
