//! Linear algebra for the spectral rotations
//!
//! - **Eigen**: symmetric eigendecomposition with a descending-eigenvalue contract
//! - **Whitener**: noise whitening and re-diagonalisation for MNF

mod eigen;
mod whiten;

pub use eigen::{symmetric_eigen, EigenPairs};
pub use whiten::{WhitenedRotation, Whitener};

use nalgebra::DMatrix;
use ndarray::Array2;
use specdim_core::{Error, Result};

pub(crate) fn to_nalgebra(matrix: &Array2<f64>) -> DMatrix<f64> {
    let (rows, cols) = matrix.dim();
    DMatrix::from_fn(rows, cols, |i, j| matrix[[i, j]])
}

pub(crate) fn from_nalgebra(matrix: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn(matrix.shape(), |(i, j)| matrix[(i, j)])
}

/// Explicit inverse of a square matrix
pub fn invert(matrix: &Array2<f64>) -> Result<Array2<f64>> {
    let (rows, cols) = matrix.dim();
    if rows != cols {
        return Err(Error::invalid_argument(
            "matrix",
            format!("{}x{}", rows, cols),
            "only square matrices can be inverted",
        ));
    }
    to_nalgebra(matrix)
        .try_inverse()
        .map(|inv| from_nalgebra(&inv))
        .ok_or_else(|| Error::DegenerateInput("projection matrix is singular".into()))
}
