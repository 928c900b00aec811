//! Shape descriptor threaded from an input raster to its transformed output

use crate::crs::CRS;
use crate::raster::GeoTransform;
use serde::{Deserialize, Serialize};

/// Spatial dimensions, band count and georeferencing of a band source.
///
/// Forward and inverse projections flatten a raster to a pixel matrix; the
/// shape travels alongside as a value so the output can be rebuilt with the
/// same grid without touching the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterShape {
    pub rows: usize,
    pub cols: usize,
    pub bands: usize,
    pub transform: GeoTransform,
    pub crs: Option<CRS>,
}

impl RasterShape {
    /// Shape with default georeferencing
    pub fn new(rows: usize, cols: usize, bands: usize) -> Self {
        Self {
            rows,
            cols,
            bands,
            transform: GeoTransform::default(),
            crs: None,
        }
    }

    /// Number of pixels per band
    pub fn n_pixels(&self) -> usize {
        self.rows * self.cols
    }

    /// Same grid, different band count
    pub fn with_bands(&self, bands: usize) -> Self {
        Self {
            bands,
            ..self.clone()
        }
    }
}
