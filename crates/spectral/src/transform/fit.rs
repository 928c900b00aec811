//! Fitting PCA and MNF models
//!
//! Both pipelines share the same front half: sample complete pixels, then
//! estimate the mean and a second-moment matrix. PCA eigendecomposes that
//! matrix directly; MNF first whitens it against a noise covariance.
//! Every component is kept in the model; truncation happens at projection.

use super::model::TransformModel;
use crate::linalg::{symmetric_eigen, Whitener};
use crate::stats::{
    estimate, noise_covariance, sample_pixels, validate_fraction, NoiseParams, StatMode,
};
use ndarray::{Array1, Array2};
use specdim_core::{Error, RasterSource, Result, Window, WindowedSource};
use tracing::{debug, info};

/// Parameters for PCA
#[derive(Debug, Clone)]
pub struct PcaParams {
    /// Covariance or correlation (default: covariance)
    pub mode: StatMode,
    /// Fraction of complete pixels sampled for the statistics, in (0, 1] (default: 1.0)
    pub fraction: f64,
    /// Seed for the pixel draw
    pub seed: u64,
}

impl Default for PcaParams {
    fn default() -> Self {
        Self {
            mode: StatMode::Cov,
            fraction: 1.0,
            seed: 42,
        }
    }
}

/// Parameters for MNF
#[derive(Debug, Clone)]
pub struct MnfParams {
    /// Fraction of complete pixels sampled for the data covariance, in (0, 1] (default: 1.0)
    pub fraction: f64,
    /// Seed for the pixel draw
    pub seed: u64,
    /// Noise estimation settings
    pub noise: NoiseParams,
    /// Homogeneous region the noise is estimated on (default: the whole source)
    pub noise_window: Option<Window>,
}

impl Default for MnfParams {
    fn default() -> Self {
        Self {
            fraction: 1.0,
            seed: 42,
            noise: NoiseParams::default(),
            noise_window: None,
        }
    }
}

/// Fit a PCA model on a band source.
///
/// # Errors
/// - `InvalidArgument` if `fraction` is outside (0, 1]
/// - `DegenerateInput` if too few complete pixels exist, the sample has no
///   variance, or a band is constant in correlation mode
pub fn fit_pca<S: RasterSource + ?Sized>(source: &S, params: &PcaParams) -> Result<TransformModel> {
    validate_fraction(params.fraction)?;
    let pixels = sample_pixels(source, params.fraction, params.seed)?;
    fit_pca_pixels(&pixels, params.mode)
}

/// Fit a PCA model on a matrix of complete pixels (`pixels × bands`)
pub fn fit_pca_pixels(pixels: &Array2<f64>, mode: StatMode) -> Result<TransformModel> {
    let stats = estimate(pixels, mode)?;
    debug!(
        samples = stats.n_samples,
        bands = stats.mean.len(),
        %mode,
        "estimated band statistics"
    );

    let eigen = symmetric_eigen(&stats.matrix)?;
    log_eigen_range("PCA", &eigen.values);

    let model = TransformModel::pca(mode, stats.mean, stats.scale, eigen)?;
    info!(bands = model.band_count(), %mode, "fitted PCA");
    Ok(model)
}

/// Fit an MNF model on a band source.
///
/// The data covariance comes from a sample of the whole source; the noise
/// covariance from `noise_window` (or the whole source), which should be
/// spectrally homogeneous.
///
/// # Errors
/// As [`fit_pca`], plus `DegenerateInput` when a band has zero noise
/// variance (enable `params.noise.smooth` or pick another region).
pub fn fit_mnf<S: RasterSource + ?Sized>(source: &S, params: &MnfParams) -> Result<TransformModel> {
    validate_fraction(params.fraction)?;
    let pixels = sample_pixels(source, params.fraction, params.seed)?;

    let noise = match params.noise_window {
        Some(window) => noise_covariance(&WindowedSource::new(source, window)?, &params.noise)?,
        None => noise_covariance(source, &params.noise)?,
    };
    fit_mnf_pixels(&pixels, &noise)
}

/// Fit an MNF model from complete pixels and a precomputed noise covariance
pub fn fit_mnf_pixels(pixels: &Array2<f64>, noise_cov: &Array2<f64>) -> Result<TransformModel> {
    let stats = estimate(pixels, StatMode::Cov)?;
    let bands = stats.mean.len();
    if noise_cov.dim() != (bands, bands) {
        return Err(Error::DimensionMismatch {
            expected: bands,
            actual: noise_cov.nrows(),
        });
    }
    debug!(samples = stats.n_samples, bands, "estimated band statistics");

    let whitener = Whitener::from_noise(noise_cov)?;
    log_eigen_range("noise", whitener.noise_eigenvalues());
    let rotation = whitener.rotate(&stats.matrix)?;
    log_eigen_range("MNF", &rotation.eigenvalues);

    let snr = component_snr(&rotation.projection, &stats.matrix, noise_cov);
    let model = TransformModel::mnf(stats.mean, rotation.projection, rotation.eigenvalues, snr)?;
    info!(bands, "fitted MNF");
    Ok(model)
}

/// `(hᵗ Σ_data h) / (hᵗ Σ_noise h) - 1` for every column `h`
fn component_snr(projection: &Array2<f64>, data_cov: &Array2<f64>, noise_cov: &Array2<f64>) -> Array1<f64> {
    projection
        .columns()
        .into_iter()
        .map(|h| {
            let signal = h.dot(&data_cov.dot(&h));
            let noise = h.dot(&noise_cov.dot(&h));
            signal / noise - 1.0
        })
        .collect()
}

fn log_eigen_range(kind: &str, values: &Array1<f64>) {
    if let (Some(first), Some(last)) = (values.first(), values.last()) {
        debug!(kind, largest = first, smallest = last, "eigendecomposition done");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use specdim_core::PixelTable;

    fn correlated() -> Array2<f64> {
        Array2::from_shape_fn((200, 3), |(i, b)| {
            let t = i as f64;
            let x = (t * 0.37).sin() * 10.0;
            let y = (t * 1.13).cos() * 2.0;
            match b {
                0 => x,
                1 => y,
                _ => 2.0 * x + 0.1 * (t * 7.7).sin(),
            }
        })
    }

    #[test]
    fn test_fit_pca_curves() {
        let model = fit_pca_pixels(&correlated(), StatMode::Cov).unwrap();
        let explained = model.explained_variance().unwrap();
        assert_abs_diff_eq!(explained.sum(), 1.0, epsilon = 1e-6);
        assert!(explained.iter().all(|&v| v >= 0.0));
        assert!(explained[0] > 0.9);
        let cumulative = model.cumulative_variance().unwrap();
        assert_abs_diff_eq!(cumulative[2], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_fit_pca_cor_mode_keeps_scale() {
        let model = fit_pca_pixels(&correlated(), StatMode::Cor).unwrap();
        assert_eq!(model.mode(), StatMode::Cor);
        assert_eq!(model.scale().unwrap().len(), 3);
        // correlation eigenvalues sum to the band count
        assert_abs_diff_eq!(model.eigenvalues().sum(), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fit_pca_fraction_bounds() {
        let table = PixelTable::new(correlated());
        for fraction in [0.0, 1.5] {
            let params = PcaParams {
                fraction,
                ..Default::default()
            };
            assert!(matches!(
                fit_pca(&table, &params),
                Err(Error::InvalidArgument { name: "fraction", .. })
            ));
        }
    }

    #[test]
    fn test_snr_is_whitened_eigenvalue_minus_one() {
        let noise = array![[0.2, 0.01, 0.0], [0.01, 0.3, 0.02], [0.0, 0.02, 0.1]];
        let model = fit_mnf_pixels(&correlated(), &noise).unwrap();
        let snr = model.snr().unwrap();
        for (s, l) in snr.iter().zip(model.eigenvalues()) {
            assert_abs_diff_eq!(*s, l - 1.0, epsilon = 1e-6 * l.abs().max(1.0));
        }
        let cumulative = model.cumulative_snr().unwrap();
        assert_eq!(cumulative[2], 1.0);
    }

    #[test]
    fn test_fit_mnf_noise_shape() {
        let err = fit_mnf_pixels(&correlated(), &Array2::eye(2)).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 3, actual: 2 }));
    }
}
