//! Pixel-to-map affine transform

use serde::{Deserialize, Serialize};

/// Maps a cell's (col, row) to map coordinates:
///
/// ```text
/// x = origin_x + col * pixel_width  + row * skew_x
/// y = origin_y + col * skew_y       + row * pixel_height
/// ```
///
/// Projected outputs copy the transform of their input untouched; a
/// sub-window gets the same cell size with a moved origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    /// Negative for north-up grids
    pub pixel_height: f64,
    pub skew_x: f64,
    pub skew_y: f64,
}

impl GeoTransform {
    /// North-up transform without skew
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            skew_x: 0.0,
            skew_y: 0.0,
        }
    }

    /// Map coordinates of the upper-left corner of cell (col, row)
    pub fn corner(&self, col: usize, row: usize) -> (f64, f64) {
        let (c, r) = (col as f64, row as f64);
        let x = self.origin_x + c * self.pixel_width + r * self.skew_x;
        let y = self.origin_y + c * self.skew_y + r * self.pixel_height;
        (x, y)
    }

    /// Transform of the window starting at cell (row_off, col_off)
    pub fn shifted(&self, row_off: usize, col_off: usize) -> Self {
        let (origin_x, origin_y) = self.corner(col_off, row_off);
        Self {
            origin_x,
            origin_y,
            ..*self
        }
    }
}

/// Unit cells anchored at the origin, rows going down
impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_shifted_origin() {
        let gt = GeoTransform::new(100.0, 200.0, 10.0, -10.0);
        let sub = gt.shifted(3, 5);
        assert_relative_eq!(sub.origin_x, 150.0, epsilon = 1e-10);
        assert_relative_eq!(sub.origin_y, 170.0, epsilon = 1e-10);
        assert_eq!(sub.pixel_width, gt.pixel_width);
        assert_eq!(sub.pixel_height, gt.pixel_height);
    }

    #[test]
    fn test_corner_with_skew() {
        let mut gt = GeoTransform::new(0.0, 0.0, 2.0, -2.0);
        gt.skew_x = 0.5;
        gt.skew_y = 0.25;
        let (x, y) = gt.corner(4, 2);
        assert_relative_eq!(x, 9.0, epsilon = 1e-12);
        assert_relative_eq!(y, -3.0, epsilon = 1e-12);
    }
}
