//! Band-source adapter
//!
//! The spectral transforms are generic over [`RasterSource`] only: a grid
//! shape, per-band reads at flat pixel indices, and the all-bands-present
//! predicate derived from them. Backends in this crate:
//! - [`BandStack`](crate::raster::BandStack): in-memory stack of bands
//! - [`PixelTable`]: a sampled row table or raw pixel matrix
//! - [`WindowedSource`]: a rectangular sub-window of another source

use crate::error::{Error, Result};
use crate::raster::RasterShape;
use ndarray::{s, Array2, ArrayView1};

/// Number of bands materialised together when reading wide stacks.
pub const BAND_BATCH: usize = 25;

/// Capability set a raster backend exposes to the transforms.
///
/// Pixel indices are row-major flat offsets into the `rows × cols` grid.
/// Missing cells (nodata, NaN, ±inf) are reported as `NaN`.
pub trait RasterSource {
    /// Grid dimensions, band count and georeferencing
    fn shape(&self) -> RasterShape;

    /// Values of `band` at the given pixel indices, `NaN` where missing
    fn read_band(&self, band: usize, pixels: &[usize]) -> Result<Vec<f64>>;

    /// Number of bands
    fn band_count(&self) -> usize {
        self.shape().bands
    }

    /// A whole band in raster order
    fn read_band_full(&self, band: usize) -> Result<Vec<f64>> {
        let all: Vec<usize> = (0..self.shape().n_pixels()).collect();
        self.read_band(band, &all)
    }

    /// For every pixel, whether all bands hold a value
    fn complete_mask(&self) -> Result<Vec<bool>> {
        let shape = self.shape();
        let mut mask = vec![true; shape.n_pixels()];
        for band in 0..shape.bands {
            let values = self.read_band_full(band)?;
            for (keep, v) in mask.iter_mut().zip(values) {
                if v.is_nan() {
                    *keep = false;
                }
            }
        }
        Ok(mask)
    }

    /// Pixel matrix (`pixels.len() × bands`) for the given pixel indices.
    ///
    /// Bands are read [`BAND_BATCH`] at a time and written column-wise into
    /// the output so hyperspectral stacks never hold more than one batch of
    /// intermediate reads.
    fn read_pixels(&self, pixels: &[usize]) -> Result<Array2<f64>> {
        let bands = self.band_count();
        let mut out = Array2::<f64>::zeros((pixels.len(), bands));
        for start in (0..bands).step_by(BAND_BATCH) {
            let end = (start + BAND_BATCH).min(bands);
            let mut block = Array2::<f64>::zeros((pixels.len(), end - start));
            for (j, band) in (start..end).enumerate() {
                let values = self.read_band(band, pixels)?;
                block.column_mut(j).assign(&ArrayView1::from(&values));
            }
            out.slice_mut(s![.., start..end]).assign(&block);
        }
        Ok(out)
    }
}

impl<S: RasterSource + ?Sized> RasterSource for &S {
    fn shape(&self) -> RasterShape {
        (**self).shape()
    }

    fn read_band(&self, band: usize, pixels: &[usize]) -> Result<Vec<f64>> {
        (**self).read_band(band, pixels)
    }

    fn complete_mask(&self) -> Result<Vec<bool>> {
        (**self).complete_mask()
    }

    fn read_pixels(&self, pixels: &[usize]) -> Result<Array2<f64>> {
        (**self).read_pixels(pixels)
    }
}

pub(crate) fn check_band(band: usize, bands: usize) -> Result<()> {
    if band >= bands {
        return Err(Error::invalid_argument(
            "band",
            band,
            format!("source has {} bands", bands),
        ));
    }
    Ok(())
}

pub(crate) fn check_pixel(index: usize, rows: usize, cols: usize) -> Result<()> {
    if index >= rows * cols {
        return Err(Error::IndexOutOfBounds {
            row: index / cols.max(1),
            col: index % cols.max(1),
            rows,
            cols,
        });
    }
    Ok(())
}

/// Pixel-by-band table without spatial structure.
///
/// Exposed as a `n × 1` grid so raw matrices and sampled row tables flow
/// through the same adapter as spatial rasters.
#[derive(Debug, Clone)]
pub struct PixelTable {
    data: Array2<f64>,
}

impl PixelTable {
    pub fn new(data: Array2<f64>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn into_inner(self) -> Array2<f64> {
        self.data
    }
}

impl RasterSource for PixelTable {
    fn shape(&self) -> RasterShape {
        RasterShape::new(self.data.nrows(), 1, self.data.ncols())
    }

    fn read_band(&self, band: usize, pixels: &[usize]) -> Result<Vec<f64>> {
        check_band(band, self.data.ncols())?;
        let column = self.data.column(band);
        pixels
            .iter()
            .map(|&p| {
                check_pixel(p, self.data.nrows(), 1)?;
                let v = column[p];
                Ok(if v.is_finite() { v } else { f64::NAN })
            })
            .collect()
    }

    fn read_pixels(&self, pixels: &[usize]) -> Result<Array2<f64>> {
        let mut out = Array2::<f64>::zeros((pixels.len(), self.data.ncols()));
        for (i, &p) in pixels.iter().enumerate() {
            check_pixel(p, self.data.nrows(), 1)?;
            for (dst, &v) in out.row_mut(i).iter_mut().zip(self.data.row(p)) {
                *dst = if v.is_finite() { v } else { f64::NAN };
            }
        }
        Ok(out)
    }
}

/// Rectangular pixel window: top-left offset and size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub row_off: usize,
    pub col_off: usize,
    pub rows: usize,
    pub cols: usize,
}

impl Window {
    pub fn new(row_off: usize, col_off: usize, rows: usize, cols: usize) -> Self {
        Self {
            row_off,
            col_off,
            rows,
            cols,
        }
    }
}

/// Read-only view of a sub-window of another source
#[derive(Debug, Clone)]
pub struct WindowedSource<S> {
    inner: S,
    window: Window,
    parent_cols: usize,
}

impl<S: RasterSource> WindowedSource<S> {
    /// Wrap `inner`, failing if the window is empty or exceeds the grid
    pub fn new(inner: S, window: Window) -> Result<Self> {
        let parent = inner.shape();
        if window.rows == 0 || window.cols == 0 {
            return Err(Error::InvalidDimensions {
                width: window.cols,
                height: window.rows,
            });
        }
        if window.row_off + window.rows > parent.rows || window.col_off + window.cols > parent.cols
        {
            return Err(Error::IndexOutOfBounds {
                row: window.row_off + window.rows - 1,
                col: window.col_off + window.cols - 1,
                rows: parent.rows,
                cols: parent.cols,
            });
        }
        Ok(Self {
            inner,
            window,
            parent_cols: parent.cols,
        })
    }

    fn parent_index(&self, index: usize) -> usize {
        let row = index / self.window.cols + self.window.row_off;
        let col = index % self.window.cols + self.window.col_off;
        row * self.parent_cols + col
    }
}

impl<S: RasterSource> RasterSource for WindowedSource<S> {
    fn shape(&self) -> RasterShape {
        let parent = self.inner.shape();
        RasterShape {
            rows: self.window.rows,
            cols: self.window.cols,
            bands: parent.bands,
            transform: parent.transform.shifted(self.window.row_off, self.window.col_off),
            crs: parent.crs,
        }
    }

    fn read_band(&self, band: usize, pixels: &[usize]) -> Result<Vec<f64>> {
        let mapped = pixels
            .iter()
            .map(|&p| {
                check_pixel(p, self.window.rows, self.window.cols)?;
                Ok(self.parent_index(p))
            })
            .collect::<Result<Vec<_>>>()?;
        self.inner.read_band(band, &mapped)
    }
}
