//! Dense row-major `f32` matrix shared by the device path and the CPU
//! baselines.

use std::fmt;
use std::ops::{Index, IndexMut};

use rand::Rng;

use crate::error::{dimension_mismatch, Result};

/// Dense row-major matrix of `f32`.
#[derive(Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    pub fn filled(rows: usize, cols: usize, value: f32) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Wraps an existing row-major buffer.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(dimension_mismatch(format!(
                "buffer of {} elements can't hold a {rows}x{cols} matrix",
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Builds a matrix from equally sized rows.
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(dimension_mismatch(format!(
                    "row {i} has {} columns, expected {cols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Fills a matrix with integer-valued floats drawn from `1..=100`.
    ///
    /// Integer inputs keep every partial sum exactly representable for the
    /// default dimensions, so device and CPU results agree bit for bit unless
    /// the kernel is wrong.
    pub fn random_integers<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Self {
        let data = (0..rows * cols)
            .map(|_| rng.random_range(1..=100u32) as f32)
            .collect();
        Self { rows, cols, data }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[at(row, col, self.cols)]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Iterates over rows as slices.
    pub fn row_iter(&self) -> impl Iterator<Item = &[f32]> {
        // chunks(0) panics, an empty matrix simply has no rows to yield
        self.data.chunks(self.cols.max(1)).take(self.rows)
    }
}

/// Row-major linear index of `(i, j)` with leading dimension `ld`.
#[inline(always)]
pub(crate) fn at(i: usize, j: usize, ld: usize) -> usize {
    i * ld + j
}

impl Index<(usize, usize)> for Matrix {
    type Output = f32;

    fn index(&self, (row, col): (usize, usize)) -> &f32 {
        &self.data[at(row, col, self.cols)]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f32 {
        &mut self.data[at(row, col, self.cols)]
    }
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Large benchmark operands would flood the output.
        if self.data.len() > 64 {
            return write!(f, "Matrix({}x{})", self.rows, self.cols);
        }
        f.debug_list().entries(self.row_iter()).finish()
    }
}
