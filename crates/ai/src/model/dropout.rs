use ndarray::Array1;
use rand::Rng;

/// Inverted dropout: kept units are scaled by `1 / (1 - rate)` during
/// training so inference needs no rescaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dropout {
    rate: f64,
}

impl Dropout {
    /// `rate` must be in \[0, 1); validated by `ModelConfig`.
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Sample a training mask of `size` entries (each `0` or the keep scale).
    pub fn mask<R: Rng>(&self, size: usize, rng: &mut R) -> Array1<f64> {
        if self.rate <= 0.0 {
            return Array1::ones(size);
        }
        let keep_scale = 1.0 / (1.0 - self.rate);
        Array1::from_shape_fn(size, |_| {
            if rng.gen_bool(self.rate) {
                0.0
            } else {
                keep_scale
            }
        })
    }
}
