use ndarray::{Array, Dimension};

const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const EPSILON: f64 = 1e-7;

#[derive(Debug, Clone)]
struct Moments {
    m: Vec<f64>,
    v: Vec<f64>,
}

/// Adam optimizer with per-parameter first/second moment estimates.
///
/// Parameters are identified by the order in which `update` is called after
/// each `begin_step`; that order must be the same on every step.
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    clip: Option<f64>,
    step: i32,
    cursor: usize,
    moments: Vec<Moments>,
}

impl Adam {
    pub fn new(learning_rate: f64, clip: Option<f64>) -> Self {
        Self {
            learning_rate,
            clip,
            step: 0,
            cursor: 0,
            moments: Vec::new(),
        }
    }

    pub fn steps(&self) -> i32 {
        self.step
    }

    pub fn begin_step(&mut self) {
        self.step = self.step.saturating_add(1);
        self.cursor = 0;
    }

    pub fn update<D: Dimension>(&mut self, param: &mut Array<f64, D>, grad: &Array<f64, D>) {
        if self.cursor == self.moments.len() {
            self.moments.push(Moments {
                m: vec![0.0; param.len()],
                v: vec![0.0; param.len()],
            });
        }

        let lr = self.learning_rate;
        let clip = self.clip;
        let bias1 = 1.0 - BETA1.powi(self.step);
        let bias2 = 1.0 - BETA2.powi(self.step);
        let slot = &mut self.moments[self.cursor];

        for ((p, &g), (m, v)) in param
            .iter_mut()
            .zip(grad.iter())
            .zip(slot.m.iter_mut().zip(slot.v.iter_mut()))
        {
            let g = match clip {
                Some(c) => g.clamp(-c, c),
                None => g,
            };
            *m = BETA1 * *m + (1.0 - BETA1) * g;
            *v = BETA2 * *v + (1.0 - BETA2) * g * g;
            let m_hat = *m / bias1;
            let v_hat = *v / bias2;
            *p -= lr * m_hat / (v_hat.sqrt() + EPSILON);
        }

        self.cursor += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, array};

    #[test]
    fn first_step_moves_by_learning_rate_against_gradient() {
        let mut adam = Adam::new(0.1, None);
        let mut param = array![1.0, -1.0];
        adam.begin_step();
        adam.update(&mut param, &array![0.5, -2.0]);
        assert!((param[0] - 0.9).abs() < 1e-6);
        assert!((param[1] + 0.9).abs() < 1e-6);
    }

    #[test]
    fn minimizes_a_quadratic() {
        let mut adam = Adam::new(0.05, None);
        let mut x: Array1<f64> = array![3.0];
        for _ in 0..500 {
            let grad = x.mapv(|v| 2.0 * (v - 1.0));
            adam.begin_step();
            adam.update(&mut x, &grad);
        }
        assert!((x[0] - 1.0).abs() < 1e-2, "x={}", x[0]);
        assert_eq!(adam.steps(), 500);
    }

    #[test]
    fn clipping_bounds_gradient_components() {
        let mut clipped = Adam::new(0.1, Some(1.0));
        let mut unclipped = Adam::new(0.1, None);
        let mut a = array![0.0];
        let mut b = array![0.0];
        for g in [100.0, 1.0] {
            clipped.begin_step();
            clipped.update(&mut a, &array![g]);
            unclipped.begin_step();
            unclipped.update(&mut b, &array![g]);
        }
        assert!(a[0] != b[0]);
    }
}
