//! Noise whitening for the Minimum Noise Fraction transform
//!
//! Two-stage rotation:
//! 1. `F = E · diag(λ^-½)` from the noise eigenpairs, so `Fᵗ Σ_noise F = I`
//! 2. `Σ' = Fᵗ Σ_data F` is re-diagonalised, `Σ' = G Λ Gᵗ`
//!
//! The MNF projection is `H = F · G`: components ordered by variance in the
//! noise-whitened space, which ranks them by signal-to-noise ratio.

use super::{symmetric_eigen, EigenPairs};
use ndarray::{Array1, Array2};
use specdim_core::{Error, Result};

/// Whitening matrix built from a noise covariance
#[derive(Debug, Clone)]
pub struct Whitener {
    matrix: Array2<f64>,
    noise_eigenvalues: Array1<f64>,
}

/// Result of rotating a data covariance through the whitened space
#[derive(Debug, Clone)]
pub struct WhitenedRotation {
    /// `H = F · G`, one component per column
    pub projection: Array2<f64>,
    /// Eigenvalues of `Fᵗ Σ_data F`, descending
    pub eigenvalues: Array1<f64>,
}

impl Whitener {
    /// Build `F` from a noise covariance.
    ///
    /// # Errors
    /// `DegenerateInput` if the noise covariance has a non-positive
    /// eigenvalue: `λ^-½` would not exist.
    pub fn from_noise(noise_cov: &Array2<f64>) -> Result<Self> {
        let EigenPairs { values, vectors } = symmetric_eigen(noise_cov)?;

        let largest = values[0];
        let floor = largest.abs() * f64::EPSILON * values.len() as f64;
        if let Some(smallest) = values.iter().copied().find(|&v| v <= floor) {
            return Err(Error::DegenerateInput(format!(
                "noise covariance is not positive definite (eigenvalue {:e}); \
                 enable `smooth` or choose a different noise sample region",
                smallest
            )));
        }

        let scale = values.mapv(|v| v.powf(-0.5));
        // broadcasting over the last axis scales column j by scale[j]
        let matrix = &vectors * &scale;
        Ok(Self {
            matrix,
            noise_eigenvalues: values,
        })
    }

    /// The whitening matrix `F`
    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// Noise eigenvalues, descending
    pub fn noise_eigenvalues(&self) -> &Array1<f64> {
        &self.noise_eigenvalues
    }

    /// Rotate a data covariance: whiten, eigendecompose, compose `H = F · G`
    pub fn rotate(&self, data_cov: &Array2<f64>) -> Result<WhitenedRotation> {
        let bands = self.matrix.nrows();
        if data_cov.dim() != (bands, bands) {
            return Err(Error::DimensionMismatch {
                expected: bands,
                actual: data_cov.nrows(),
            });
        }

        let whitened = self.matrix.t().dot(data_cov).dot(&self.matrix);
        let symmetric = (&whitened + &whitened.t()) * 0.5;
        let rotation = symmetric_eigen(&symmetric)?;

        Ok(WhitenedRotation {
            projection: self.matrix.dot(&rotation.vectors),
            eigenvalues: rotation.values,
        })
    }
}
