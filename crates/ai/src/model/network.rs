use ndarray::Array1;
use rand::Rng;

use crate::config::ModelConfig;

use super::dense::Dense;
use super::dropout::Dropout;
use super::gru::{GruGradients, GruLayer, GruStep};
use super::optimizer::Adam;

/// Window-to-scalar regressor:
/// GRU (all states) -> dropout -> GRU (last state) -> dropout -> dense(relu) -> dense(1).
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    pub(crate) first: GruLayer,
    pub(crate) second: GruLayer,
    pub(crate) hidden: Dense,
    pub(crate) output: Dense,
    dropout: Dropout,
}

/// Dropout masks for one training sample.
#[derive(Debug, Clone)]
pub(crate) struct DropoutMasks {
    first: Vec<Array1<f64>>,
    second: Array1<f64>,
}

#[derive(Debug, Clone)]
pub(crate) struct NetworkGradients {
    first: GruGradients,
    second: GruGradients,
    hidden: Dense,
    output: Dense,
}

/// Forward-pass record for a single window.
#[derive(Debug, Clone)]
pub(crate) struct Trace {
    first: Vec<GruStep>,
    first_out: Vec<Array1<f64>>,
    second: Vec<GruStep>,
    second_out: Array1<f64>,
    hidden: Array1<f64>,
    pub(crate) output: f64,
}

fn relu(x: f64) -> f64 {
    x.max(0.0)
}

impl Network {
    pub fn new<R: Rng>(config: &ModelConfig, rng: &mut R) -> Self {
        Self {
            first: GruLayer::glorot(1, config.first_units, config.activation, rng),
            second: GruLayer::glorot(
                config.first_units,
                config.second_units,
                config.activation,
                rng,
            ),
            hidden: Dense::glorot(config.second_units, config.dense_units, rng),
            output: Dense::glorot(config.dense_units, 1, rng),
            dropout: Dropout::new(config.dropout),
        }
    }

    /// Inference: dropout disabled.
    pub fn predict(&self, window: &[f64]) -> f64 {
        self.forward(window, None).output
    }

    pub(crate) fn sample_masks<R: Rng>(&self, steps: usize, rng: &mut R) -> DropoutMasks {
        DropoutMasks {
            first: (0..steps)
                .map(|_| self.dropout.mask(self.first.hidden_size, rng))
                .collect(),
            second: self.dropout.mask(self.second.hidden_size, rng),
        }
    }

    pub(crate) fn zero_gradients(&self) -> NetworkGradients {
        NetworkGradients {
            first: self.first.zero_gradients(),
            second: self.second.zero_gradients(),
            hidden: self.hidden.zeros_like(),
            output: self.output.zeros_like(),
        }
    }

    pub(crate) fn forward(&self, window: &[f64], masks: Option<&DropoutMasks>) -> Trace {
        let inputs: Vec<Array1<f64>> = window.iter().map(|&v| Array1::from_elem(1, v)).collect();

        let first = self.first.forward(&inputs);
        let first_out: Vec<Array1<f64>> = first
            .iter()
            .enumerate()
            .map(|(t, step)| match masks {
                Some(m) => &step.h * &m.first[t],
                None => step.h.clone(),
            })
            .collect();

        let second = self.second.forward(&first_out);
        let last = second
            .last()
            .map(|step| step.h.clone())
            .unwrap_or_else(|| Array1::zeros(self.second.hidden_size));
        let second_out = match masks {
            Some(m) => &last * &m.second,
            None => last,
        };

        let hidden = self.hidden.forward(&second_out).mapv(relu);
        let output = self.output.forward(&hidden)[0];

        Trace {
            first,
            first_out,
            second,
            second_out,
            hidden,
            output,
        }
    }

    /// Accumulate gradients of a loss whose derivative w.r.t. the output is `d_output`.
    pub(crate) fn backward(
        &self,
        trace: &Trace,
        masks: Option<&DropoutMasks>,
        d_output: f64,
        grads: &mut NetworkGradients,
    ) {
        let d_out = Array1::from_elem(1, d_output);
        let d_hidden = self.output.backward(&trace.hidden, &d_out, &mut grads.output);
        let d_hidden_pre = &d_hidden * &trace.hidden.mapv(|h| if h > 0.0 { 1.0 } else { 0.0 });
        let d_second_out = self
            .hidden
            .backward(&trace.second_out, &d_hidden_pre, &mut grads.hidden);

        let d_last = match masks {
            Some(m) => &d_second_out * &m.second,
            None => d_second_out,
        };
        let mut second_external = vec![Array1::zeros(self.second.hidden_size); trace.second.len()];
        if let Some(slot) = second_external.last_mut() {
            *slot = d_last;
        }
        let d_first_out = self
            .second
            .backward(&trace.second, &second_external, &mut grads.second);

        let first_external: Vec<Array1<f64>> = d_first_out
            .into_iter()
            .enumerate()
            .map(|(t, d)| match masks {
                Some(m) => &d * &m.first[t],
                None => d,
            })
            .collect();
        self.first
            .backward(&trace.first, &first_external, &mut grads.first);
    }

    /// One optimizer step; must be preceded by `optimizer.begin_step()`.
    pub(crate) fn apply_gradients(&mut self, grads: &NetworkGradients, optimizer: &mut Adam) {
        self.first.apply(&grads.first, optimizer);
        self.second.apply(&grads.second, optimizer);
        self.hidden.apply(&grads.hidden, optimizer);
        self.output.apply(&grads.output, optimizer);
    }
}
