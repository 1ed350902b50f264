//! Recurrent network building blocks.
//!
//! Everything here is plain `f64` linear algebra on `ndarray` vectors. The
//! only randomness comes from the caller's RNG (weight init, dropout masks).

mod activation;
mod dense;
mod dropout;
mod gru;
mod network;
mod optimizer;

pub use activation::Activation;
pub use dropout::Dropout;
pub use network::Network;
pub use optimizer::Adam;

use ndarray::{Array1, Array2};
use rand::Rng;

/// Glorot/Xavier uniform init for a `rows x cols` weight matrix.
pub(crate) fn glorot<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Array2<f64> {
    let limit = (6.0 / (rows + cols) as f64).sqrt();
    Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-limit..limit))
}

/// `a * b^T`.
pub(crate) fn outer(a: &Array1<f64>, b: &Array1<f64>) -> Array2<f64> {
    Array2::from_shape_fn((a.len(), b.len()), |(i, j)| a[i] * b[j])
}
