//! Spectral rotations
//!
//! - **PCA**: components ranked by variance
//! - **MNF**: components ranked by signal-to-noise ratio (noise whitening + PCA)
//!
//! Fitting produces an immutable [`TransformModel`]; projection applies it
//! forward (with truncation to `k` components) or backward.

mod fit;
mod model;
mod project;

pub use fit::{fit_mnf, fit_mnf_pixels, fit_pca, fit_pca_pixels, MnfParams, PcaParams};
pub use model::{
    cumulative_fraction, proportions, ComponentStats, ModelRecord, TransformKind, TransformModel,
};
pub use project::{forward, forward_raster, inverse, inverse_raster, reconstruction_error};
