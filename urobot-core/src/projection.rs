//! Random near-identity projections used to augment a single measurement

use crate::error::{Error, Result};
use crate::matrix::Matrix;
use rand::Rng;
use rand_distr::StandardNormal;

/// Samples a square `dimension x dimension` transform whose rows each sum to one.
///
/// Off-diagonal entries are independent `N(0, stddev^2)` draws taken row by row; the
/// diagonal absorbs the remainder. A zero `stddev` yields the identity.
pub fn sample<R: Rng>(rng: &mut R, dimension: usize, stddev: f64) -> Matrix {
    let mut transform = Matrix::zeros(dimension, dimension);
    let mut off_diagonal = vec![0.0; dimension.saturating_sub(1)];
    for k in 0..dimension {
        let mut sum = 1.0;
        for v in off_diagonal.iter_mut() {
            let draw: f64 = rng.sample(StandardNormal);
            *v = draw * stddev;
            sum -= *v;
        }
        let row = transform.row_mut(k);
        let mut index = 0;
        for (l, entry) in row.iter_mut().enumerate() {
            if l == k {
                *entry = sum;
            } else {
                *entry = off_diagonal[index];
                index += 1;
            }
        }
    }
    transform
}

/// Applies `transform` to `vector`, returning `transform * vector`.
pub fn apply(transform: &Matrix, vector: &[f64]) -> Result<Vec<f64>> {
    if transform.cols != transform.rows {
        return Err(Error::ShapeMismatch(format!(
            "projection must be square, got {}x{}",
            transform.rows, transform.cols
        )));
    }
    let input = Matrix::from_vec(vector.len(), 1, vector.to_vec())?;
    Ok(transform.mul_t(&input)?.data)
}
