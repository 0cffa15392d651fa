//! CPU baselines checked against literal scenarios and an independent
//! `ndarray` product.

use ndarray::Array2;
use rand::{rngs::StdRng, SeedableRng};

use clmatbench::{
    reference::{naive_matmul, par_matmul},
    verify::{compare, Tolerance},
    Matrix,
};

fn to_ndarray(m: &Matrix) -> Array2<f32> {
    Array2::from_shape_vec((m.rows(), m.cols()), m.as_slice().to_vec()).unwrap()
}

#[test]
fn test_two_by_two_scenario() {
    let a = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
    let b = Matrix::from_rows(&[[5.0, 6.0], [7.0, 8.0]]).unwrap();
    let expected = Matrix::from_rows(&[[19.0, 22.0], [43.0, 50.0]]).unwrap();

    assert_eq!(naive_matmul(&a, &b).unwrap(), expected);
    assert_eq!(par_matmul(&a, &b).unwrap(), expected);
}

#[test]
fn test_all_ones_cells_equal_inner_dimension() {
    for (n, l, m) in [(1, 1, 1), (32, 64, 32), (7, 300, 3)] {
        let a = Matrix::filled(n, l, 1.0);
        let b = Matrix::filled(l, m, 1.0);
        let c = par_matmul(&a, &b).unwrap();
        assert!(
            c.as_slice().iter().all(|&v| v == l as f32),
            "n={n}, l={l}, m={m}"
        );
    }
}

#[test]
fn test_random_integers_agree_exactly() {
    let mut rng = StdRng::seed_from_u64(2024);
    let a = Matrix::random_integers(64, 96, &mut rng);
    let b = Matrix::random_integers(96, 32, &mut rng);

    let naive = naive_matmul(&a, &b).unwrap();
    let parallel = par_matmul(&a, &b).unwrap();

    // Integer operands keep every partial sum exact.
    let v = compare(&naive, &parallel, Tolerance::exact()).unwrap();
    assert!(v.is_success(), "first mismatch: {:?}", v.first_mismatch);
}

#[test]
fn test_matches_ndarray_dot() {
    let mut rng = StdRng::seed_from_u64(7);
    let a = Matrix::random_integers(33, 65, &mut rng);
    let b = Matrix::random_integers(65, 17, &mut rng);

    let expected = to_ndarray(&a).dot(&to_ndarray(&b));
    let expected = Matrix::from_vec(33, 17, expected.iter().copied().collect()).unwrap();

    for actual in [naive_matmul(&a, &b).unwrap(), par_matmul(&a, &b).unwrap()] {
        let v = compare(&expected, &actual, Tolerance::default()).unwrap();
        assert!(v.is_success(), "max abs diff {}", v.max_abs_diff);
    }
}
