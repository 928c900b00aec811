//! Band means, covariance and correlation
//!
//! All moments are computed in `f64` on mean-centred data (two passes), so
//! large pixel counts with large offsets do not cancel catastrophically.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use specdim_core::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Which second-moment matrix a PCA is built from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatMode {
    /// Covariance: bands keep their own units and variance
    #[default]
    Cov,
    /// Correlation: every band standardised to unit variance
    Cor,
}

impl FromStr for StatMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cov" | "covariance" => Ok(StatMode::Cov),
            "cor" | "correlation" => Ok(StatMode::Cor),
            _ => Err(Error::invalid_argument(
                "mode",
                s,
                "expected `cov` or `cor`",
            )),
        }
    }
}

impl fmt::Display for StatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatMode::Cov => write!(f, "cov"),
            StatMode::Cor => write!(f, "cor"),
        }
    }
}

/// Sample moments of a pixel matrix
#[derive(Debug, Clone)]
pub struct BandStatistics {
    /// Per-band mean
    pub mean: Array1<f64>,
    /// Per-band standard deviation, present in correlation mode
    pub scale: Option<Array1<f64>>,
    /// Covariance or correlation matrix, `bands × bands`
    pub matrix: Array2<f64>,
    /// Number of pixels the moments were computed from
    pub n_samples: usize,
}

/// Per-band mean of a `pixels × bands` matrix
pub fn band_means(pixels: &Array2<f64>) -> Result<Array1<f64>> {
    pixels
        .mean_axis(Axis(0))
        .ok_or_else(|| Error::DegenerateInput("cannot take the mean of zero pixels".into()))
}

/// Unbiased (n - 1) covariance of a `pixels × bands` matrix around `mean`
pub fn covariance(pixels: &Array2<f64>, mean: &Array1<f64>) -> Result<Array2<f64>> {
    let n = pixels.nrows();
    if n < 2 {
        return Err(Error::DegenerateInput(format!(
            "covariance needs at least 2 pixels, got {}",
            n
        )));
    }
    if mean.len() != pixels.ncols() {
        return Err(Error::DimensionMismatch {
            expected: pixels.ncols(),
            actual: mean.len(),
        });
    }

    let centered = pixels - mean;
    let cov = centered.t().dot(&centered) / (n - 1) as f64;
    Ok((&cov + &cov.t()) * 0.5)
}

/// Correlation matrix from a covariance matrix, plus the per-band standard deviations
pub fn correlation(cov: &Array2<f64>) -> Result<(Array2<f64>, Array1<f64>)> {
    let sd = cov.diag().mapv(f64::sqrt);
    if let Some(band) = sd.iter().position(|&s| !(s > 0.0)) {
        return Err(Error::DegenerateInput(format!(
            "band {} has zero variance; correlation is undefined",
            band + 1
        )));
    }

    let mut cor = cov.clone();
    for ((i, j), v) in cor.indexed_iter_mut() {
        *v = if i == j { 1.0 } else { *v / (sd[i] * sd[j]) };
    }
    Ok((cor, sd))
}

/// Mean and mode-selected second-moment matrix of a pixel matrix
pub fn estimate(pixels: &Array2<f64>, mode: StatMode) -> Result<BandStatistics> {
    if pixels.iter().any(|v| !v.is_finite()) {
        return Err(Error::invalid_argument(
            "pixels",
            "non-finite values",
            "statistics need complete pixels; filter missing rows first",
        ));
    }

    let mean = band_means(pixels)?;
    let cov = covariance(pixels, &mean)?;
    let (matrix, scale) = match mode {
        StatMode::Cov => (cov, None),
        StatMode::Cor => {
            let (cor, sd) = correlation(&cov)?;
            (cor, Some(sd))
        }
    };

    Ok(BandStatistics {
        mean,
        scale,
        matrix,
        n_samples: pixels.nrows(),
    })
}
