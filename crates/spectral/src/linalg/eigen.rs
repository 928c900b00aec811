//! Symmetric eigendecomposition sorted by descending eigenvalue
//!
//! `nalgebra::SymmetricEigen` returns eigenpairs in no particular order.
//! Every ranking downstream (explained variance, SNR, truncation to the
//! first k components) assumes the largest eigenvalue comes first, so the
//! reordering lives here behind one tested function.

use super::to_nalgebra;
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2};
use specdim_core::{Error, Result};

/// Eigenvalues and eigenvectors, largest eigenvalue first.
///
/// Column `j` of `vectors` belongs to `values[j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenPairs {
    pub values: Array1<f64>,
    pub vectors: Array2<f64>,
}

/// Eigendecomposition of a symmetric matrix.
///
/// Eigenvalues are non-increasing. Each eigenvector is signed so its
/// largest-magnitude entry is positive, which makes repeated fits of the
/// same data produce identical projections.
///
/// # Errors
/// `InvalidArgument` for non-square, empty or non-finite input.
pub fn symmetric_eigen(matrix: &Array2<f64>) -> Result<EigenPairs> {
    let (rows, cols) = matrix.dim();
    if rows != cols || rows == 0 {
        return Err(Error::invalid_argument(
            "matrix",
            format!("{}x{}", rows, cols),
            "eigendecomposition needs a non-empty square matrix",
        ));
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(Error::invalid_argument(
            "matrix",
            "non-finite entries",
            "eigendecomposition needs finite values",
        ));
    }

    let eigen = SymmetricEigen::new(to_nalgebra(matrix));
    Ok(sort_descending(eigen.eigenvalues.as_slice(), &eigen.eigenvectors))
}

fn sort_descending(values: &[f64], vectors: &DMatrix<f64>) -> EigenPairs {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    let mut sorted = Array2::<f64>::zeros((n, n));
    for (dst, &src) in order.iter().enumerate() {
        let column = vectors.column(src);
        let pivot = column
            .iter()
            .copied()
            .fold(0.0_f64, |best, v| if v.abs() > best.abs() { v } else { best });
        let sign = if pivot < 0.0 { -1.0 } else { 1.0 };
        for (row, v) in column.iter().enumerate() {
            sorted[[row, dst]] = sign * v;
        }
    }

    EigenPairs {
        values: order.iter().map(|&i| values[i]).collect(),
        vectors: sorted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn assert_eigenpairs(matrix: &Array2<f64>, pairs: &EigenPairs) {
        for (j, &lambda) in pairs.values.iter().enumerate() {
            let v = pairs.vectors.column(j);
            let av = matrix.dot(&v);
            for (a, b) in av.iter().zip(v.iter()) {
                assert_abs_diff_eq!(*a, lambda * b, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_diagonal_is_reordered() {
        let m = array![[1.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 2.0]];
        let pairs = symmetric_eigen(&m).unwrap();
        assert_eq!(pairs.values.to_vec(), vec![3.0, 2.0, 1.0]);
        assert_abs_diff_eq!(pairs.vectors[[1, 0]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pairs.vectors[[2, 1]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pairs.vectors[[0, 2]], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_matches_library_eigenpairs_in_descending_order() {
        let m = array![
            [4.0, 1.0, 0.5, 0.2],
            [1.0, 3.0, 0.3, 0.1],
            [0.5, 0.3, 2.0, 0.4],
            [0.2, 0.1, 0.4, 1.0]
        ];
        let raw = SymmetricEigen::new(to_nalgebra(&m));
        let mut expected: Vec<f64> = raw.eigenvalues.iter().copied().collect();
        expected.sort_by(|a, b| b.total_cmp(a));

        let pairs = symmetric_eigen(&m).unwrap();
        for (got, want) in pairs.values.iter().zip(&expected) {
            assert_abs_diff_eq!(*got, *want, epsilon = 1e-12);
        }
        for w in pairs.values.windows(2) {
            assert!(w[0] >= w[1], "eigenvalues not descending: {:?}", pairs.values);
        }
        assert_eigenpairs(&m, &pairs);
    }

    #[test]
    fn test_sign_convention() {
        let m = array![[2.0, -1.0], [-1.0, 2.0]];
        let pairs = symmetric_eigen(&m).unwrap();
        for column in pairs.vectors.columns() {
            let pivot = column
                .iter()
                .copied()
                .fold(0.0_f64, |best, v| if v.abs() > best.abs() { v } else { best });
            assert!(pivot > 0.0);
        }
        assert_abs_diff_eq!(pairs.values[0], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pairs.values[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(symmetric_eigen(&Array2::zeros((2, 3))).is_err());
        assert!(symmetric_eigen(&Array2::zeros((0, 0))).is_err());
        assert!(symmetric_eigen(&array![[f64::NAN, 0.0], [0.0, 1.0]]).is_err());
    }
}
