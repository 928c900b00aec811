//! In-memory multi-band raster

use crate::error::{Error, Result};
use crate::raster::source::check_band;
use crate::raster::{Raster, RasterElement, RasterShape, RasterSource};
use ndarray::Array2;

/// An ordered stack of bands sharing one grid.
///
/// The first band's transform and CRS describe the whole stack; every band
/// keeps its own nodata value.
#[derive(Debug, Clone)]
pub struct BandStack<T: RasterElement> {
    bands: Vec<Raster<T>>,
}

impl<T: RasterElement> BandStack<T> {
    /// Build a stack, verifying all bands have the same dimensions
    pub fn new(bands: Vec<Raster<T>>) -> Result<Self> {
        let first = bands
            .first()
            .ok_or_else(|| Error::invalid_argument("bands", 0, "a stack needs at least 1 band"))?;
        let (rows, cols) = first.shape();
        for band in bands.iter().skip(1) {
            if band.shape() != (rows, cols) {
                return Err(Error::SizeMismatch {
                    er: rows,
                    ec: cols,
                    ar: band.rows(),
                    ac: band.cols(),
                });
            }
        }
        Ok(Self { bands })
    }

    /// Band `index` (0-based)
    pub fn band(&self, index: usize) -> Option<&Raster<T>> {
        self.bands.get(index)
    }

    pub fn bands(&self) -> &[Raster<T>] {
        &self.bands
    }

    pub fn into_bands(self) -> Vec<Raster<T>> {
        self.bands
    }

    /// Number of bands
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    /// Always false: a stack holds at least one band
    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

impl BandStack<f64> {
    /// Rebuild a raster from a `pixels × bands` matrix laid out in raster order.
    ///
    /// Output bands take their grid and georeferencing from `shape` and use
    /// `NaN` as the nodata value.
    pub fn from_pixel_matrix(shape: &RasterShape, matrix: &Array2<f64>) -> Result<Self> {
        if matrix.nrows() != shape.n_pixels() {
            return Err(Error::SizeMismatch {
                er: shape.n_pixels(),
                ec: matrix.ncols(),
                ar: matrix.nrows(),
                ac: matrix.ncols(),
            });
        }
        let bands = matrix
            .columns()
            .into_iter()
            .map(|column| -> Result<Raster<f64>> {
                let data = Array2::from_shape_vec((shape.rows, shape.cols), column.to_vec())?;
                let mut band = Raster::from_array(data);
                band.set_transform(shape.transform);
                band.set_crs(shape.crs.clone());
                band.set_nodata(Some(f64::NAN));
                Ok(band)
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(bands)
    }
}

impl<T: RasterElement> RasterSource for BandStack<T> {
    fn shape(&self) -> RasterShape {
        let first = &self.bands[0];
        RasterShape {
            rows: first.rows(),
            cols: first.cols(),
            bands: self.len(),
            transform: *first.transform(),
            crs: first.crs().cloned(),
        }
    }

    fn read_band(&self, band: usize, pixels: &[usize]) -> Result<Vec<f64>> {
        check_band(band, self.len())?;
        let raster = &self.bands[band];
        pixels.iter().map(|&p| raster.sample_flat(p)).collect()
    }

    fn read_band_full(&self, band: usize) -> Result<Vec<f64>> {
        check_band(band, self.len())?;
        let raster = &self.bands[band];
        let nodata = raster.nodata();
        Ok(raster.data().iter().map(|v| v.to_sample(nodata)).collect())
    }
}
