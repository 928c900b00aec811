//! One spectral band on a georeferenced grid

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::Array2;

/// A single band: a `rows × cols` grid of cells plus the transform, CRS and
/// nodata value that give those cells meaning.
///
/// ```ignore
/// use specdim_core::Raster;
///
/// let mut nir: Raster<u16> = Raster::from_vec(counts, 512, 512)?;
/// nir.set_nodata(Some(0));
/// let reflectance = nir.sample_flat(1_000)?; // NaN if the cell is 0
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    data: Array2<T>,
    transform: GeoTransform,
    crs: Option<CRS>,
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Zero-filled band
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::zeros((rows, cols)))
    }

    /// Band from cells in row-major order.
    ///
    /// # Errors
    /// `InvalidDimensions` when `data.len() != rows * cols`
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }
        Ok(Self::from_array(Array2::from_shape_vec((rows, cols), data)?))
    }

    /// Band over an existing array, with the default transform and no CRS
    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        }
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    fn out_of_bounds(&self, row: usize, col: usize) -> Error {
        Error::IndexOutOfBounds {
            row,
            col,
            rows: self.rows(),
            cols: self.cols(),
        }
    }

    /// Raw cell value; nodata is returned as stored
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        match self.data.get((row, col)) {
            Some(&v) => Ok(v),
            None => Err(self.out_of_bounds(row, col)),
        }
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(self.out_of_bounds(row, col));
        }
        self.data[[row, col]] = value;
        Ok(())
    }

    /// Cell at a row-major flat index, as `f64`, `NaN` when missing
    pub fn sample_flat(&self, index: usize) -> Result<f64> {
        let cols = self.cols().max(1);
        let value = self.get(index / cols, index % cols)?;
        Ok(value.to_sample(self.nodata))
    }

    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    /// Sentinel marking missing cells, if the band has one
    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }
}
