//! # specdim
//!
//! Spectral dimensionality reduction for multi-band rasters.
//!
//! ## Modules
//!
//! - **stats**: pixel sampling, band moments, noise covariance
//! - **linalg**: descending symmetric eigendecomposition, noise whitening
//! - **transform**: PCA / MNF fitting and forward / inverse projection
//!
//! ```ignore
//! use specdim::prelude::*;
//!
//! let model = fit_pca(&stack, &PcaParams::default())?;
//! let reduced = forward_raster(&model, &stack, 3)?;
//! let restored = inverse_raster(&model, &reduced)?;
//! ```

mod maybe_rayon;

pub mod linalg;
pub mod stats;
pub mod transform;

pub use transform::{
    fit_mnf, fit_pca, forward, forward_raster, inverse, inverse_raster, MnfParams, PcaParams,
    TransformModel,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::stats::{NoiseParams, StatMode};
    pub use crate::transform::{
        fit_mnf, fit_mnf_pixels, fit_pca, fit_pca_pixels, forward, forward_raster, inverse,
        inverse_raster, reconstruction_error, ComponentStats, MnfParams, ModelRecord, PcaParams,
        TransformKind, TransformModel,
    };
    pub use specdim_core::prelude::*;
}
