//! CPU reference implementations used to verify the device result.
//!
//! Two independent baselines are provided:
//! - [`naive_matmul`]: the textbook `i, j, k` triple loop, single threaded.
//! - [`par_matmul`]: rows of `C` are distributed over the rayon pool, and the
//!   inner dimension is walked in `KC`-sized blocks with an `i-k-j` loop order
//!   so that a row of `B` is streamed contiguously for every element of `A`.
//!
//! Both take row-major operands and return a freshly allocated result.

use std::cmp::min;

use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

use crate::{
    error::{dimension_mismatch, Result},
    matrix::{at, Matrix},
    KC,
};

fn check_shapes(a: &Matrix, b: &Matrix) -> Result<()> {
    if a.cols() != b.rows() {
        return Err(dimension_mismatch(format!(
            "can't multiply {}x{} by {}x{}",
            a.rows(),
            a.cols(),
            b.rows(),
            b.cols()
        )));
    }
    Ok(())
}

/// Computes `a * b` with a plain triple loop.
pub fn naive_matmul(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    check_shapes(a, b)?;

    let (n, l, m) = (a.rows(), a.cols(), b.cols());
    let (a, b) = (a.as_slice(), b.as_slice());
    let mut c = Matrix::zeros(n, m);
    let out = c.as_mut_slice();

    for i in 0..n {
        for j in 0..m {
            let mut acc = 0.0f32;
            for k in 0..l {
                acc += a[at(i, k, l)] * b[at(k, j, m)];
            }
            out[at(i, j, m)] = acc;
        }
    }

    Ok(c)
}

/// Computes `a * b` on the rayon pool, one output row per task.
///
/// # Arguments
///
/// * `a` - Left operand, `n x l`, row-major
/// * `b` - Right operand, `l x m`, row-major
///
/// # Returns
///
/// The `n x m` product, or [`BenchError::DimensionMismatch`] when
/// `a.cols() != b.rows()`.
///
/// [`BenchError::DimensionMismatch`]: crate::error::BenchError::DimensionMismatch
pub fn par_matmul(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    check_shapes(a, b)?;

    let (n, l, m) = (a.rows(), a.cols(), b.cols());
    let mut c = Matrix::zeros(n, m);
    if m == 0 {
        return Ok(c);
    }

    let (a, b) = (a.as_slice(), b.as_slice());

    c.as_mut_slice()
        .par_chunks_mut(m)
        .enumerate()
        .for_each(|(i, c_row)| {
            let a_row = &a[at(i, 0, l)..at(i, 0, l) + l];

            for pc in (0..l).step_by(KC) {
                let kc = min(KC, l - pc);

                for (p, &a_ip) in a_row[pc..pc + kc].iter().enumerate() {
                    let b_row = &b[at(pc + p, 0, m)..at(pc + p, 0, m) + m];
                    c_row
                        .iter_mut()
                        .zip(b_row)
                        .for_each(|(c_ij, &b_pj)| *c_ij += a_ip * b_pj);
                }
            }
        });

    Ok(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(rows: usize, cols: usize, offset: usize) -> Matrix {
        let data = (0..rows * cols)
            .map(|x| ((x + offset) % 100) as f32 / 10.0)
            .collect();
        Matrix::from_vec(rows, cols, data).unwrap()
    }

    fn run_matmul_test(n: usize, l: usize, m: usize) {
        let a = pattern(n, l, 0);
        let b = pattern(l, m, 50);

        let expected = naive_matmul(&a, &b).unwrap();
        let actual = par_matmul(&a, &b).unwrap();

        assert_eq!(actual.rows(), n);
        assert_eq!(actual.cols(), m);
        for (idx, (x, y)) in actual
            .as_slice()
            .iter()
            .zip(expected.as_slice())
            .enumerate()
        {
            assert!(
                (x - y).abs() <= 1e-2 * y.abs().max(1.0),
                "C[{}] mismatch: got {}, expected {}. (n={}, l={}, m={})",
                idx,
                x,
                y,
                n,
                l,
                m
            );
        }
    }

    #[test]
    fn test_two_by_two() {
        let a = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let b = Matrix::from_rows(&[[5.0, 6.0], [7.0, 8.0]]).unwrap();
        let expected = [19.0, 22.0, 43.0, 50.0];

        assert_eq!(naive_matmul(&a, &b).unwrap().as_slice(), &expected);
        assert_eq!(par_matmul(&a, &b).unwrap().as_slice(), &expected);
    }

    #[test]
    fn test_all_ones_sum_to_inner_dimension() {
        let (n, l, m) = (8, 37, 5);
        let a = Matrix::filled(n, l, 1.0);
        let b = Matrix::filled(l, m, 1.0);

        for c in [naive_matmul(&a, &b).unwrap(), par_matmul(&a, &b).unwrap()] {
            assert!(c.as_slice().iter().all(|&v| v == l as f32));
        }
    }

    #[test]
    fn test_identity() {
        let n = 4;
        let mut id = Matrix::zeros(n, n);
        for i in 0..n {
            id[(i, i)] = 1.0;
        }
        let b = pattern(n, 3, 7);
        assert_eq!(naive_matmul(&id, &b).unwrap(), b);
        assert_eq!(par_matmul(&id, &b).unwrap(), b);
    }

    #[test]
    fn test_inner_dimension_crosses_blocks() {
        run_matmul_test(3, KC + KC / 2 + 1, 4);
    }

    #[test]
    fn test_nonsquare() {
        run_matmul_test(17, 9, 33);
        run_matmul_test(1, 64, 1);
    }

    #[test]
    fn test_empty_inner_dimension_yields_zeros() {
        let a = Matrix::zeros(3, 0);
        let b = Matrix::zeros(0, 2);
        assert_eq!(par_matmul(&a, &b).unwrap(), Matrix::zeros(3, 2));
        assert_eq!(naive_matmul(&a, &b).unwrap(), Matrix::zeros(3, 2));
    }

    #[test]
    fn test_shape_mismatch() {
        let a = Matrix::zeros(2, 3);
        let b = Matrix::zeros(2, 3);
        assert!(naive_matmul(&a, &b).is_err());
        assert!(par_matmul(&a, &b).is_err());
    }
}
