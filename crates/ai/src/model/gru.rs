use ndarray::{Array1, Array2};
use rand::Rng;

use super::activation::{Activation, sigmoid};
use super::optimizer::Adam;
use super::{glorot, outer};

/// Weights of one GRU gate: `W x + U h + b`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Gate {
    pub(crate) w: Array2<f64>,
    pub(crate) u: Array2<f64>,
    pub(crate) b: Array1<f64>,
}

impl Gate {
    fn glorot<R: Rng>(input: usize, hidden: usize, rng: &mut R) -> Self {
        Self {
            w: glorot(hidden, input, rng),
            u: glorot(hidden, hidden, rng),
            b: Array1::zeros(hidden),
        }
    }

    fn zeros_like(&self) -> Self {
        Self {
            w: Array2::zeros(self.w.raw_dim()),
            u: Array2::zeros(self.u.raw_dim()),
            b: Array1::zeros(self.b.raw_dim()),
        }
    }

    fn pre_activation(&self, x: &Array1<f64>, h: &Array1<f64>) -> Array1<f64> {
        self.w.dot(x) + &self.u.dot(h) + &self.b
    }

    fn accumulate(&mut self, delta: &Array1<f64>, x: &Array1<f64>, h: &Array1<f64>) {
        self.w += &outer(delta, x);
        self.u += &outer(delta, h);
        self.b += delta;
    }

    fn apply(&mut self, grads: &Gate, optimizer: &mut Adam) {
        optimizer.update(&mut self.w, &grads.w);
        optimizer.update(&mut self.u, &grads.u);
        optimizer.update(&mut self.b, &grads.b);
    }
}

/// Values recorded for one timestep, reused by backpropagation.
#[derive(Debug, Clone)]
pub(crate) struct GruStep {
    x: Array1<f64>,
    h_prev: Array1<f64>,
    z: Array1<f64>,
    r: Array1<f64>,
    n: Array1<f64>,
    pub(crate) h: Array1<f64>,
}

/// Gated recurrent unit layer.
///
/// ```text
/// z = sigmoid(Wz x + Uz h + bz)
/// r = sigmoid(Wr x + Ur h + br)
/// n = act(Wn x + Un (r * h) + bn)
/// h' = z * h + (1 - z) * n
/// ```
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GruLayer {
    pub(crate) input_size: usize,
    pub(crate) hidden_size: usize,
    activation: Activation,
    pub(crate) update: Gate,
    pub(crate) reset: Gate,
    pub(crate) candidate: Gate,
}

/// Gradient accumulator with the same shapes as a `GruLayer`.
#[derive(Debug, Clone)]
pub(crate) struct GruGradients {
    pub(crate) update: Gate,
    pub(crate) reset: Gate,
    pub(crate) candidate: Gate,
}

impl GruLayer {
    pub(crate) fn glorot<R: Rng>(
        input_size: usize,
        hidden_size: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        Self {
            input_size,
            hidden_size,
            activation,
            update: Gate::glorot(input_size, hidden_size, rng),
            reset: Gate::glorot(input_size, hidden_size, rng),
            candidate: Gate::glorot(input_size, hidden_size, rng),
        }
    }

    pub(crate) fn zero_gradients(&self) -> GruGradients {
        GruGradients {
            update: self.update.zeros_like(),
            reset: self.reset.zeros_like(),
            candidate: self.candidate.zeros_like(),
        }
    }

    /// Run the layer over `inputs` from a zero initial state.
    pub(crate) fn forward(&self, inputs: &[Array1<f64>]) -> Vec<GruStep> {
        let mut h = Array1::zeros(self.hidden_size);
        let mut steps = Vec::with_capacity(inputs.len());

        for x in inputs {
            let z = self.update.pre_activation(x, &h).mapv(sigmoid);
            let r = self.reset.pre_activation(x, &h).mapv(sigmoid);
            let rh = &r * &h;
            let act = self.activation;
            let n = self.candidate.pre_activation(x, &rh).mapv(|v| act.apply(v));
            let keep = z.mapv(|v| 1.0 - v);
            let h_next = &z * &h + &(&keep * &n);

            steps.push(GruStep {
                x: x.clone(),
                h_prev: h,
                z,
                r,
                n,
                h: h_next.clone(),
            });
            h = h_next;
        }

        steps
    }

    /// Backpropagation through time.
    ///
    /// `dh_external[t]` is the loss gradient arriving at `h_t` from above.
    /// Returns the gradient with respect to each input `x_t`.
    pub(crate) fn backward(
        &self,
        steps: &[GruStep],
        dh_external: &[Array1<f64>],
        grads: &mut GruGradients,
    ) -> Vec<Array1<f64>> {
        let mut dh_next: Array1<f64> = Array1::zeros(self.hidden_size);
        let mut dxs = vec![Array1::zeros(self.input_size); steps.len()];

        for t in (0..steps.len()).rev() {
            let s = &steps[t];
            let dh = &dh_external[t] + &dh_next;

            let dn = &dh * &s.z.mapv(|v| 1.0 - v);
            let dz = &dh * &(&s.h_prev - &s.n);
            let mut dh_prev = &dh * &s.z;

            let act = self.activation;
            let da_n = &dn * &s.n.mapv(|v| act.derivative_from_output(v));
            let da_z = &dz * &s.z.mapv(|v| v * (1.0 - v));

            let rh = &s.r * &s.h_prev;
            grads.candidate.accumulate(&da_n, &s.x, &rh);

            let d_rh = self.candidate.u.t().dot(&da_n);
            let dr = &d_rh * &s.h_prev;
            dh_prev += &(&d_rh * &s.r);
            let da_r = &dr * &s.r.mapv(|v| v * (1.0 - v));

            grads.update.accumulate(&da_z, &s.x, &s.h_prev);
            grads.reset.accumulate(&da_r, &s.x, &s.h_prev);

            dh_prev += &self.update.u.t().dot(&da_z);
            dh_prev += &self.reset.u.t().dot(&da_r);

            dxs[t] = self.update.w.t().dot(&da_z)
                + &self.reset.w.t().dot(&da_r)
                + &self.candidate.w.t().dot(&da_n);
            dh_next = dh_prev;
        }

        dxs
    }

    pub(crate) fn apply(&mut self, grads: &GruGradients, optimizer: &mut Adam) {
        self.update.apply(&grads.update, optimizer);
        self.reset.apply(&grads.reset, optimizer);
        self.candidate.apply(&grads.candidate, optimizer);
    }
}
