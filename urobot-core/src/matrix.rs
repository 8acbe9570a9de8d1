//! Row-major dense matrices

use crate::error::{Error, Result};

/// Row-major matrix of `rows` rows with `cols` entries each.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub cols: usize,
    pub rows: usize,
    pub data: Vec<f64>,
}

impl Matrix {
    /// Empty matrix with room for `cols * rows` entries, filled later with `push_row`.
    pub fn with_capacity(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            data: Vec::with_capacity(cols * rows),
        }
    }

    pub fn zeros(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            data: vec![0.0; cols * rows],
        }
    }

    pub fn from_vec(cols: usize, rows: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != cols * rows {
            return Err(Error::shape("matrix data length", cols * rows, data.len()));
        }
        Ok(Self { cols, rows, data })
    }

    pub fn identity(dimension: usize) -> Self {
        let mut m = Self::zeros(dimension, dimension);
        for k in 0..dimension {
            m.data[k * dimension + k] = 1.0;
        }
        m
    }

    pub fn is_populated(&self) -> bool {
        self.data.len() == self.cols * self.rows
    }

    pub fn row(&self, index: usize) -> &[f64] {
        &self.data[index * self.cols..(index + 1) * self.cols]
    }

    pub fn row_mut(&mut self, index: usize) -> &mut [f64] {
        &mut self.data[index * self.cols..(index + 1) * self.cols]
    }

    pub fn push_row(&mut self, row: &[f64]) -> Result<()> {
        if row.len() != self.cols {
            return Err(Error::shape("row length", self.cols, row.len()));
        }
        if self.data.len() + row.len() > self.cols * self.rows {
            return Err(Error::ShapeMismatch(format!(
                "matrix already holds {} rows",
                self.rows
            )));
        }
        self.data.extend_from_slice(row);
        Ok(())
    }

    pub fn fill(&mut self, value: f64) {
        self.data.iter_mut().for_each(|x| *x = value);
    }

    /// Multiplies `self` against every row of `other` and returns the transposed product.
    ///
    /// Both operands must share a column count. The result has `self.rows` columns and
    /// `other.rows` rows, so entry `(j, i)` is `dot(self.row(i), other.row(j))`.
    pub fn mul_t(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.cols {
            return Err(Error::shape("mul_t column count", self.cols, other.cols));
        }
        let mut out = Matrix::with_capacity(self.rows, other.rows);
        for j in 0..other.rows {
            let n = other.row(j);
            for i in 0..self.rows {
                out.data.push(dot(self.row(i), n));
            }
        }
        Ok(out)
    }

    /// Row sums, used to check row-stochastic transforms.
    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.rows).map(|r| self.row(r).iter().sum()).collect()
    }
}

#[inline]
pub fn dot(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y).map(|(a, b)| a * b).sum()
}
