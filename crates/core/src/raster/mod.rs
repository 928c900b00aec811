//! Raster data structures and the band-source adapter

mod element;
mod geotransform;
mod grid;
mod shape;
mod source;
mod stack;

pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use grid::Raster;
pub use shape::RasterShape;
pub use source::{PixelTable, RasterSource, Window, WindowedSource, BAND_BATCH};
pub use stack::BandStack;
