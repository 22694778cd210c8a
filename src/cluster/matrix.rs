//! Dense row-major matrix used for observations and centroids.

use crate::error::{Error, Result};

/// An `nrows x ncols` matrix of `f64` stored contiguously, row after row.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    data: Vec<f64>,
    nrows: usize,
    ncols: usize,
}

impl Matrix {
    /// Build an observation matrix from one `Vec` per row.
    ///
    /// Rejects empty input, zero-width rows, ragged rows and non-finite values.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(Error::EmptyInput);
        };
        let ncols = first.len();

        let mut data: Vec<f64> = Vec::with_capacity(rows.len() * ncols);
        for row in rows {
            if row.len() != ncols {
                return Err(Error::DimensionMismatch {
                    expected: ncols,
                    found: row.len(),
                });
            }
            data.extend_from_slice(row);
        }

        Self::from_shape_vec(rows.len(), ncols, data)
    }

    /// Build a matrix from a flat row-major buffer.
    pub fn from_shape_vec(nrows: usize, ncols: usize, data: Vec<f64>) -> Result<Self> {
        if nrows == 0 {
            return Err(Error::EmptyInput);
        }
        if ncols == 0 {
            return Err(Error::InvalidParameter {
                name: "dimension",
                message: "must be at least 1",
            });
        }
        if data.len() != nrows * ncols {
            return Err(Error::DimensionMismatch {
                expected: nrows * ncols,
                found: data.len(),
            });
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "data",
                message: "all values must be finite",
            });
        }

        Ok(Self { data, nrows, ncols })
    }

    pub(crate) fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            data: vec![0.0; nrows * ncols],
            nrows,
            ncols,
        }
    }

    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Borrow row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.nrows()`.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        let start = i * self.ncols;
        &self.data[start..start + self.ncols]
    }

    #[inline]
    pub(crate) fn row_mut(&mut self, i: usize) -> &mut [f64] {
        let start = i * self.ncols;
        &mut self.data[start..start + self.ncols]
    }

    /// Iterate over rows in order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        self.data.chunks_exact(self.ncols)
    }

    /// The flat row-major buffer.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Copy out as one `Vec` per row.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows().map(<[f64]>::to_vec).collect()
    }

    /// Largest absolute element-wise difference between two equally shaped matrices.
    pub(crate) fn max_abs_diff(&self, other: &Matrix) -> f64 {
        debug_assert_eq!(self.nrows, other.nrows);
        debug_assert_eq!(self.ncols, other.ncols);
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}
