//! Single-hidden-layer auto-encoding estimator
//!
//! Each estimator reconstructs its input through a narrower sigmoid layer:
//!
//! ```text
//! hidden = sigmoid(W1 . input + b1)
//! output = W2 . hidden + b2
//! loss_s = sum_j (output_sj - target_sj)^2
//! ```
//!
//! `forward` records the activations it needs on a small tape; `backward` replays the
//! tape in reverse to produce gradients of the batch-mean loss for all four parameters.

use crate::error::{Error, Result};
use crate::matrix::{dot, Matrix};
use rand::Rng;
use rand_distr::StandardNormal;

pub const W1: usize = 0;
pub const B1: usize = 1;
pub const W2: usize = 2;
pub const B2: usize = 3;

/// Trainable tensor with its gradient and optimizer moments.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: &'static str,
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<f64>,
    pub grad: Vec<f64>,
    /// First-moment running estimate
    pub m: Vec<f64>,
    /// Second-moment running estimate
    pub v: Vec<f64>,
}

impl Param {
    fn zeros(name: &'static str, rows: usize, cols: usize) -> Self {
        let len = rows * cols;
        Self {
            name,
            rows,
            cols,
            values: vec![0.0; len],
            grad: vec![0.0; len],
            m: vec![0.0; len],
            v: vec![0.0; len],
        }
    }

    /// Weight matrix drawn from `N(0, 1/fan_in)`, where `fan_in` is the column count.
    fn gaussian<R: Rng>(name: &'static str, rows: usize, cols: usize, rng: &mut R) -> Self {
        let mut param = Self::zeros(name, rows, cols);
        let scale = 1.0 / (cols as f64).sqrt();
        for x in param.values.iter_mut() {
            let draw: f64 = rng.sample(StandardNormal);
            *x = draw * scale;
        }
        param
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn zero_grad(&mut self) {
        self.grad.iter_mut().for_each(|g| *g = 0.0);
    }

    fn row(&self, index: usize) -> &[f64] {
        &self.values[index * self.cols..(index + 1) * self.cols]
    }
}

/// Inputs and targets for one training step, one sample per row.
#[derive(Debug, Clone)]
pub struct Batch {
    pub inputs: Matrix,
    pub targets: Matrix,
}

impl Batch {
    pub fn new(width: usize, size: usize) -> Self {
        Self {
            inputs: Matrix::zeros(width, size),
            targets: Matrix::zeros(width, size),
        }
    }

    pub fn width(&self) -> usize {
        self.inputs.cols
    }

    pub fn size(&self) -> usize {
        self.inputs.rows
    }

    /// Stores one sample and its reconstruction target in slot `slot`.
    pub fn set_slot(&mut self, slot: usize, input: &[f64], target: &[f64]) -> Result<()> {
        if slot >= self.size() {
            return Err(Error::shape("batch slot", self.size(), slot));
        }
        if input.len() != self.width() {
            return Err(Error::shape("batch input width", self.width(), input.len()));
        }
        if target.len() != self.width() {
            return Err(Error::shape("batch target width", self.width(), target.len()));
        }
        self.inputs.row_mut(slot).copy_from_slice(input);
        self.targets.row_mut(slot).copy_from_slice(target);
        Ok(())
    }
}

/// Result of evaluating an estimator over a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Forward {
    /// Mean per-sample loss
    pub loss: f64,
    /// Population variance of the per-sample loss
    pub variance: f64,
    pub per_sample: Vec<f64>,
}

#[derive(Debug, Clone)]
struct Tape {
    inputs: Matrix,
    targets: Matrix,
    hidden: Matrix,
    outputs: Matrix,
}

/// One member of the ensemble.
#[derive(Debug, Clone)]
pub struct Estimator {
    width: usize,
    hidden: usize,
    params: [Param; 4],
    tape: Option<Tape>,
}

impl Estimator {
    /// Allocates an estimator for measurements of `width` values.
    pub fn new<R: Rng>(width: usize, rng: &mut R) -> Result<Self> {
        if width == 0 {
            return Err(Error::Configuration(
                "estimator width must be non-zero".to_string(),
            ));
        }
        let hidden = hidden_width(width);
        let w1 = Param::gaussian("w1", hidden, width, rng);
        let b1 = Param::zeros("b1", hidden, 1);
        let w2 = Param::gaussian("w2", width, hidden, rng);
        let b2 = Param::zeros("b2", width, 1);
        Ok(Self {
            width,
            hidden,
            params: [w1, b1, w2, b2],
            tape: None,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn hidden(&self) -> usize {
        self.hidden
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut [Param] {
        &mut self.params
    }

    /// Clears gradients and recorded activations.
    pub fn reset_scratch(&mut self) {
        for p in self.params.iter_mut() {
            p.zero_grad();
        }
        self.tape = None;
    }

    /// Evaluates the reconstruction loss over `batch` and records the tape for `backward`.
    pub fn forward(&mut self, batch: &Batch) -> Result<Forward> {
        if batch.width() != self.width {
            return Err(Error::shape("batch width", self.width, batch.width()));
        }
        if batch.size() == 0 {
            return Err(Error::Configuration("batch must not be empty".to_string()));
        }

        let size = batch.size();
        let [w1, b1, w2, b2] = &self.params;
        let mut hidden = Matrix::zeros(self.hidden, size);
        let mut outputs = Matrix::zeros(self.width, size);
        let mut per_sample = Vec::with_capacity(size);

        for s in 0..size {
            let input = batch.inputs.row(s);
            let h = hidden.row_mut(s);
            for (k, hk) in h.iter_mut().enumerate() {
                *hk = sigmoid(dot(w1.row(k), input) + b1.values[k]);
            }
            let h = hidden.row(s);
            let target = batch.targets.row(s);
            let out = outputs.row_mut(s);
            let mut loss = 0.0;
            for (j, oj) in out.iter_mut().enumerate() {
                *oj = dot(w2.row(j), h) + b2.values[j];
                let diff = *oj - target[j];
                loss += diff * diff;
            }
            per_sample.push(loss);
        }

        let n = size as f64;
        let loss = per_sample.iter().sum::<f64>() / n;
        let variance = per_sample
            .iter()
            .map(|l| (l - loss) * (l - loss))
            .sum::<f64>()
            / n;

        self.tape = Some(Tape {
            inputs: batch.inputs.clone(),
            targets: batch.targets.clone(),
            hidden,
            outputs,
        });

        Ok(Forward {
            loss,
            variance,
            per_sample,
        })
    }

    /// Gradients of the batch-mean loss from the most recent `forward`.
    ///
    /// Gradients are reset first, so repeated calls never accumulate.
    pub fn backward(&mut self) -> Result<()> {
        let tape = self.tape.take().ok_or_else(|| {
            Error::NotInitialized("backward called before forward".to_string())
        })?;
        for p in self.params.iter_mut() {
            p.zero_grad();
        }

        let size = tape.inputs.rows;
        let scale = 2.0 / size as f64;
        let mut d_out = vec![0.0; self.width];
        let mut d_pre = vec![0.0; self.hidden];

        for s in 0..size {
            let input = tape.inputs.row(s);
            let target = tape.targets.row(s);
            let h = tape.hidden.row(s);
            let out = tape.outputs.row(s);

            for j in 0..self.width {
                d_out[j] = scale * (out[j] - target[j]);
            }

            let [w1, b1, w2, b2] = &mut self.params;

            d_pre.iter_mut().for_each(|d| *d = 0.0);
            for j in 0..self.width {
                let dj = d_out[j];
                b2.grad[j] += dj;
                let row = j * self.hidden;
                for k in 0..self.hidden {
                    w2.grad[row + k] += dj * h[k];
                    d_pre[k] += w2.values[row + k] * dj;
                }
            }

            for k in 0..self.hidden {
                let dk = d_pre[k] * h[k] * (1.0 - h[k]);
                b1.grad[k] += dk;
                let row = k * self.width;
                for i in 0..self.width {
                    w1.grad[row + i] += dk * input[i];
                }
            }
        }

        self.tape = Some(tape);
        Ok(())
    }

    /// Euclidean norm of all gradients taken together.
    pub fn grad_norm(&self) -> f64 {
        self.params
            .iter()
            .flat_map(|p| p.grad.iter())
            .map(|g| g * g)
            .sum::<f64>()
            .sqrt()
    }
}

/// The bottleneck is two units narrower than the input, never below one unit.
pub fn hidden_width(width: usize) -> usize {
    width.saturating_sub(2).max(1)
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
