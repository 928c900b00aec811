//! Fitted transform model
//!
//! A model holds everything needed to move pixels between band space and
//! component space: the centring mean, the optional per-band scale used in
//! correlation mode, the full `bands × bands` projection and its inverse,
//! and per-component statistics. It is immutable once fitted and can be
//! applied to any raster with the same band count.

use crate::linalg::{invert, EigenPairs};
use crate::stats::StatMode;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use specdim_core::{Error, Result};
use std::fmt;

const ORTHONORMAL_TOLERANCE: f64 = 1e-6;

/// Which rotation a model implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    Pca,
    Mnf,
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformKind::Pca => write!(f, "PCA"),
            TransformKind::Mnf => write!(f, "MNF"),
        }
    }
}

/// Per-component statistics, in component order
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentStats {
    Pca {
        /// Variance of each component
        eigenvalues: Array1<f64>,
        /// `λ / Σλ`
        explained_variance: Array1<f64>,
        /// Running sum of `explained_variance`, ending at 1
        cumulative_variance: Array1<f64>,
    },
    Mnf {
        /// Eigenvalues in the noise-whitened space
        eigenvalues: Array1<f64>,
        /// `(hᵗ Σ_data h) / (hᵗ Σ_noise h) - 1` per component
        snr: Array1<f64>,
        /// Running share of the whitened eigenvalues, ending at 1
        cumulative_snr: Array1<f64>,
    },
}

/// Share of each (non-negative part of a) value in the total
pub fn proportions(values: &Array1<f64>) -> Result<Array1<f64>> {
    let clamped = values.mapv(|v| v.max(0.0));
    let total = clamped.sum();
    if !(total > 0.0) || !total.is_finite() {
        return Err(Error::DegenerateInput(format!(
            "component variances sum to {}; the sampled pixels carry no variance",
            total
        )));
    }
    Ok(clamped / total)
}

/// Running sum of `proportions(values)`, with the last entry pinned to 1
pub fn cumulative_fraction(values: &Array1<f64>) -> Result<Array1<f64>> {
    let mut running = 0.0;
    let mut cumulative = proportions(values)?.mapv(|p| {
        running += p;
        running.min(1.0)
    });
    if let Some(last) = cumulative.last_mut() {
        *last = 1.0;
    }
    Ok(cumulative)
}

/// An immutable, fitted PCA or MNF rotation
#[derive(Debug, Clone)]
pub struct TransformModel {
    mode: StatMode,
    mean: Array1<f64>,
    scale: Option<Array1<f64>>,
    projection: Array2<f64>,
    inverse_projection: Array2<f64>,
    stats: ComponentStats,
}

impl TransformModel {
    pub(crate) fn pca(
        mode: StatMode,
        mean: Array1<f64>,
        scale: Option<Array1<f64>>,
        eigen: EigenPairs,
    ) -> Result<Self> {
        let explained_variance = proportions(&eigen.values)?;
        let cumulative_variance = cumulative_fraction(&eigen.values)?;
        let inverse_projection = eigen.vectors.t().to_owned();
        Ok(Self {
            mode,
            mean,
            scale,
            projection: eigen.vectors,
            inverse_projection,
            stats: ComponentStats::Pca {
                eigenvalues: eigen.values,
                explained_variance,
                cumulative_variance,
            },
        })
    }

    pub(crate) fn mnf(
        mean: Array1<f64>,
        projection: Array2<f64>,
        eigenvalues: Array1<f64>,
        snr: Array1<f64>,
    ) -> Result<Self> {
        let cumulative_snr = cumulative_fraction(&eigenvalues)?;
        let inverse_projection = invert(&projection)?;
        Ok(Self {
            mode: StatMode::Cov,
            mean,
            scale: None,
            projection,
            inverse_projection,
            stats: ComponentStats::Mnf {
                eigenvalues,
                snr,
                cumulative_snr,
            },
        })
    }

    pub fn kind(&self) -> TransformKind {
        match self.stats {
            ComponentStats::Pca { .. } => TransformKind::Pca,
            ComponentStats::Mnf { .. } => TransformKind::Mnf,
        }
    }

    /// Second-moment matrix the model was fitted on (always `Cov` for MNF)
    pub fn mode(&self) -> StatMode {
        self.mode
    }

    /// Number of bands the model was trained on
    pub fn band_count(&self) -> usize {
        self.mean.len()
    }

    /// Per-band mean subtracted before projection
    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Per-band standard deviation divided out in correlation mode
    pub fn scale(&self) -> Option<&Array1<f64>> {
        self.scale.as_ref()
    }

    /// Band-to-component matrix, one component per column
    pub fn projection(&self) -> &Array2<f64> {
        &self.projection
    }

    /// Component-to-band matrix, one component per row
    pub fn inverse_projection(&self) -> &Array2<f64> {
        &self.inverse_projection
    }

    pub fn stats(&self) -> &ComponentStats {
        &self.stats
    }

    /// Eigenvalues in component order (variances for PCA, whitened-space for MNF)
    pub fn eigenvalues(&self) -> &Array1<f64> {
        match &self.stats {
            ComponentStats::Pca { eigenvalues, .. } | ComponentStats::Mnf { eigenvalues, .. } => {
                eigenvalues
            }
        }
    }

    /// PCA only
    pub fn explained_variance(&self) -> Option<&Array1<f64>> {
        match &self.stats {
            ComponentStats::Pca {
                explained_variance, ..
            } => Some(explained_variance),
            ComponentStats::Mnf { .. } => None,
        }
    }

    /// PCA only
    pub fn cumulative_variance(&self) -> Option<&Array1<f64>> {
        match &self.stats {
            ComponentStats::Pca {
                cumulative_variance,
                ..
            } => Some(cumulative_variance),
            ComponentStats::Mnf { .. } => None,
        }
    }

    /// MNF only
    pub fn snr(&self) -> Option<&Array1<f64>> {
        match &self.stats {
            ComponentStats::Mnf { snr, .. } => Some(snr),
            ComponentStats::Pca { .. } => None,
        }
    }

    /// MNF only
    pub fn cumulative_snr(&self) -> Option<&Array1<f64>> {
        match &self.stats {
            ComponentStats::Mnf { cumulative_snr, .. } => Some(cumulative_snr),
            ComponentStats::Pca { .. } => None,
        }
    }

    /// Plain-array form for persistence
    pub fn to_record(&self) -> ModelRecord {
        ModelRecord {
            kind: self.kind(),
            mode: self.mode,
            bands: self.band_count(),
            mean: self.mean.to_vec(),
            scale: self.scale.as_ref().map(|s| s.to_vec()),
            projection: self.projection.iter().copied().collect(),
            eigenvalues: self.eigenvalues().to_vec(),
            snr: self.snr().map(|s| s.to_vec()),
        }
    }

    /// Rebuild a model from its record, re-deriving the inverse and the curves.
    ///
    /// # Errors
    /// `DimensionMismatch` when a vector length disagrees with `bands`;
    /// `InvalidArgument` for non-finite values, unsorted eigenvalues, a PCA
    /// projection that is not orthonormal, a PCA record carrying SNR or an
    /// MNF record without it.
    pub fn from_record(record: ModelRecord) -> Result<Self> {
        let bands = record.bands;
        let check_len = |len: usize, expected: usize| -> Result<()> {
            if len != expected {
                return Err(Error::DimensionMismatch {
                    expected,
                    actual: len,
                });
            }
            Ok(())
        };
        if bands == 0 {
            return Err(Error::invalid_argument("bands", 0, "a model needs at least 1 band"));
        }
        check_len(record.mean.len(), bands)?;
        check_len(record.eigenvalues.len(), bands)?;
        check_len(record.projection.len(), bands * bands)?;
        if let Some(scale) = &record.scale {
            check_len(scale.len(), bands)?;
        }
        let finite = |values: &[f64]| values.iter().all(|v| v.is_finite());
        let all_finite = finite(&record.mean)
            && finite(&record.projection)
            && finite(&record.eigenvalues)
            && record.scale.as_deref().map_or(true, finite)
            && record.snr.as_deref().map_or(true, finite);
        if !all_finite {
            return Err(Error::invalid_argument(
                "record",
                "non-finite values",
                "every stored number must be finite",
            ));
        }
        if record.eigenvalues.windows(2).any(|w| w[0] < w[1]) {
            return Err(Error::invalid_argument(
                "eigenvalues",
                format!("{:?}", record.eigenvalues),
                "must be sorted in descending order",
            ));
        }

        let mean = Array1::from(record.mean);
        let projection = Array2::from_shape_vec((bands, bands), record.projection)?;
        let values = Array1::from(record.eigenvalues);

        match (record.kind, record.snr) {
            (TransformKind::Pca, None) => {
                let scale = record.scale.map(Array1::from);
                check_orthonormal(&projection)?;
                if (record.mode == StatMode::Cor) != scale.is_some() {
                    return Err(Error::invalid_argument(
                        "scale",
                        record.mode,
                        "correlation models carry a scale, covariance models do not",
                    ));
                }
                Self::pca(
                    record.mode,
                    mean,
                    scale,
                    EigenPairs {
                        values,
                        vectors: projection,
                    },
                )
            }
            (TransformKind::Mnf, Some(snr)) => {
                check_len(snr.len(), bands)?;
                Self::mnf(mean, projection, values, Array1::from(snr))
            }
            (kind, snr) => Err(Error::invalid_argument(
                "snr",
                if snr.is_some() { "present" } else { "absent" },
                format!("does not match a {} model", kind),
            )),
        }
    }
}

/// Columns of a PCA projection must be orthonormal for its transpose to be the inverse
fn check_orthonormal(projection: &Array2<f64>) -> Result<()> {
    let gram = projection.t().dot(projection);
    let worst = gram
        .indexed_iter()
        .map(|((i, j), &v)| (v - if i == j { 1.0 } else { 0.0 }).abs())
        .fold(0.0_f64, f64::max);
    if worst > ORTHONORMAL_TOLERANCE {
        return Err(Error::invalid_argument(
            "projection",
            format!("max |PᵗP - I| = {:e}", worst),
            "PCA projection columns must be orthonormal",
        ));
    }
    Ok(())
}

/// Serializable form of a [`TransformModel`]: plain numeric vectors.
///
/// `projection` is stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub kind: TransformKind,
    pub mode: StatMode,
    pub bands: usize,
    pub mean: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec<f64>>,
    pub projection: Vec<f64>,
    pub eigenvalues: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snr: Option<Vec<f64>>,
}

impl fmt::Display for TransformModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}) on {} bands", self.kind(), self.mode, self.band_count())?;
        match &self.stats {
            ComponentStats::Pca {
                eigenvalues,
                explained_variance,
                cumulative_variance,
            } => {
                writeln!(
                    f,
                    "{:<8} {:>14} {:>12} {:>12}",
                    "", "eigenvalue", "proportion", "cumulative"
                )?;
                for i in 0..eigenvalues.len() {
                    writeln!(
                        f,
                        "{:<8} {:>14.6} {:>12.6} {:>12.6}",
                        format!("PC{}", i + 1),
                        eigenvalues[i],
                        explained_variance[i],
                        cumulative_variance[i]
                    )?;
                }
            }
            ComponentStats::Mnf {
                eigenvalues,
                snr,
                cumulative_snr,
            } => {
                writeln!(
                    f,
                    "{:<8} {:>14} {:>12} {:>12}",
                    "", "eigenvalue", "snr", "cumulative"
                )?;
                for i in 0..eigenvalues.len() {
                    writeln!(
                        f,
                        "{:<8} {:>14.6} {:>12.6} {:>12.6}",
                        format!("MNF{}", i + 1),
                        eigenvalues[i],
                        snr[i],
                        cumulative_snr[i]
                    )?;
                }
            }
        }
        Ok(())
    }
}
