//! # specdim core
//!
//! Raster types and the band-source adapter consumed by the specdim
//! spectral transforms.
//!
//! This crate provides:
//! - `Raster<T>`: a single georeferenced band
//! - `BandStack<T>`: an ordered stack of same-shape bands
//! - `RasterShape`: spatial dims, band count, transform and CRS as one value
//! - `RasterSource`: the capability set the transforms are generic over
//! - `PixelTable` and `WindowedSource`: extra source backends

pub mod crs;
pub mod error;
pub mod raster;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{
    BandStack, GeoTransform, PixelTable, Raster, RasterElement, RasterShape, RasterSource,
    Window, WindowedSource, BAND_BATCH,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{
        BandStack, GeoTransform, PixelTable, Raster, RasterElement, RasterShape, RasterSource,
        Window, WindowedSource,
    };
}
