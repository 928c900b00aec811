//! Statistical estimation over multi-band pixels
//!
//! - **Sampler**: draws complete pixels from a band source
//! - **Moments**: band means, covariance and correlation
//! - **Noise**: neighbor-difference noise covariance for MNF

mod moments;
mod noise;
mod sampler;

pub use moments::{band_means, correlation, covariance, estimate, BandStatistics, StatMode};
pub use noise::{noise_covariance, NoiseParams};
pub use sampler::{sample_pixels, sample_size, validate_fraction};
