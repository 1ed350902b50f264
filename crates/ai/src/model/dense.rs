use ndarray::{Array1, Array2};
use rand::Rng;

use super::optimizer::Adam;
use super::{glorot, outer};

/// Fully connected layer `y = W x + b` (activation applied by the caller).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Dense {
    pub(crate) w: Array2<f64>,
    pub(crate) b: Array1<f64>,
}

impl Dense {
    pub(crate) fn glorot<R: Rng>(input: usize, output: usize, rng: &mut R) -> Self {
        Self {
            w: glorot(output, input, rng),
            b: Array1::zeros(output),
        }
    }

    pub(crate) fn zeros_like(&self) -> Self {
        Self {
            w: Array2::zeros(self.w.raw_dim()),
            b: Array1::zeros(self.b.raw_dim()),
        }
    }

    pub(crate) fn forward(&self, x: &Array1<f64>) -> Array1<f64> {
        self.w.dot(x) + &self.b
    }

    /// Accumulate parameter gradients into `grads`; returns the input gradient.
    pub(crate) fn backward(
        &self,
        x: &Array1<f64>,
        delta: &Array1<f64>,
        grads: &mut Dense,
    ) -> Array1<f64> {
        grads.w += &outer(delta, x);
        grads.b += delta;
        self.w.t().dot(delta)
    }

    pub(crate) fn apply(&mut self, grads: &Dense, optimizer: &mut Adam) {
        optimizer.update(&mut self.w, &grads.w);
        optimizer.update(&mut self.b, &grads.b);
    }
}
