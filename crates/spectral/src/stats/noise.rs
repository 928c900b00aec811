//! Noise covariance by neighbor differencing
//!
//! Over a spatially homogeneous region the difference between vertically
//! adjacent pixels is dominated by noise. For uncorrelated noise of
//! covariance `Σ_n`, `cov(x[r+1] - x[r]) = 2 Σ_n`, hence the factor 0.5.
//!
//! A constant band gives a zero noise variance, which MNF cannot whiten.
//! `smooth` adds an independent 0-or-ε dither to every cell before
//! differencing so such bands still carry a tiny, strictly positive noise.

use ndarray::{concatenate, s, Array1, Array2, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use specdim_core::{Error, RasterSource, Result};
use tracing::debug;

/// Pixels read per block when walking the noise region
const BLOCK_PIXELS: usize = 1 << 16;

/// Parameters for noise estimation
#[derive(Debug, Clone)]
pub struct NoiseParams {
    /// Dither every cell by 0 or `dither` before differencing (default: false)
    pub smooth: bool,
    /// Dither amplitude ε (default: 1e-4)
    pub dither: f64,
    /// Seed for the dither draws
    pub seed: u64,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            smooth: false,
            dither: 1e-4,
            seed: 42,
        }
    }
}

/// Mean and centred cross-product sum of the difference rows seen so far
struct DiffMoments {
    count: usize,
    mean: Array1<f64>,
    cross: Array2<f64>,
}

impl DiffMoments {
    fn new(bands: usize) -> Self {
        Self {
            count: 0,
            mean: Array1::zeros(bands),
            cross: Array2::zeros((bands, bands)),
        }
    }

    /// Fold in a block of complete difference rows
    fn merge(&mut self, block: &Array2<f64>) {
        let Some(block_mean) = block.mean_axis(Axis(0)) else {
            return;
        };
        let centered = block - &block_mean;
        let block_cross = centered.t().dot(&centered);

        let (n_a, n_b) = (self.count as f64, block.nrows() as f64);
        let n = n_a + n_b;
        let delta = &block_mean - &self.mean;
        let outer = delta
            .view()
            .insert_axis(Axis(1))
            .dot(&delta.view().insert_axis(Axis(0)));

        self.cross = &self.cross + &block_cross + &(outer * (n_a * n_b / n));
        self.mean = &self.mean + &(delta * (n_b / n));
        self.count += block.nrows();
    }
}

/// Estimate the `bands × bands` noise covariance of `source`.
///
/// The region is read in row blocks, [`BAND_BATCH`](specdim_core::BAND_BATCH)
/// bands at a time, and folded into running moments, so memory stays bounded
/// by one block whatever the region size. A difference is dropped when either
/// pixel is missing in any band.
///
/// # Errors
/// - `InvalidArgument` for a non-positive or non-finite dither with `smooth`
/// - `DegenerateInput` when fewer than 2 differences survive, or when a band's
///   noise variance is zero
pub fn noise_covariance<S: RasterSource + ?Sized>(
    source: &S,
    params: &NoiseParams,
) -> Result<Array2<f64>> {
    let rows_per_block = (BLOCK_PIXELS / source.shape().cols.max(1)).max(1);
    noise_covariance_in_blocks(source, params, rows_per_block)
}

fn noise_covariance_in_blocks<S: RasterSource + ?Sized>(
    source: &S,
    params: &NoiseParams,
    rows_per_block: usize,
) -> Result<Array2<f64>> {
    if params.smooth && !(params.dither.is_finite() && params.dither > 0.0) {
        return Err(Error::invalid_argument(
            "dither",
            params.dither,
            "must be finite and > 0 when smooth is enabled",
        ));
    }

    let shape = source.shape();
    if shape.rows < 2 {
        return Err(Error::DegenerateInput(format!(
            "noise region has {} rows; neighbor differencing needs at least 2",
            shape.rows
        )));
    }

    let cols = shape.cols;
    let mut rng = params.smooth.then(|| ChaCha8Rng::seed_from_u64(params.seed));
    let mut moments = DiffMoments::new(shape.bands);
    // last row of the previous block, already dithered
    let mut carry: Option<Array2<f64>> = None;

    for start in (0..shape.rows).step_by(rows_per_block) {
        let end = (start + rows_per_block).min(shape.rows);
        let indices: Vec<usize> = (start * cols..end * cols).collect();
        let mut block = source.read_pixels(&indices)?;
        if let Some(rng) = rng.as_mut() {
            for v in block.iter_mut() {
                if rng.gen_bool(0.5) {
                    *v += params.dither;
                }
            }
        }

        let rows = match carry.take() {
            Some(previous) => concatenate(Axis(0), &[previous.view(), block.view()])?,
            None => block,
        };
        let n_pairs = rows.nrows() - cols;
        let diffs = &rows.slice(s![cols.., ..]) - &rows.slice(s![..n_pairs, ..]);
        let complete: Vec<usize> = diffs
            .rows()
            .into_iter()
            .enumerate()
            .filter_map(|(p, d)| d.iter().all(|v| !v.is_nan()).then_some(p))
            .collect();
        moments.merge(&diffs.select(Axis(0), &complete));
        carry = Some(rows.slice(s![n_pairs.., ..]).to_owned());
    }

    if moments.count < 2 {
        return Err(Error::DegenerateInput(format!(
            "{} complete neighbor pairs in the noise region; at least 2 are needed",
            moments.count
        )));
    }
    let cov = moments.cross / (moments.count - 1) as f64;
    // symmetrise, then halve
    let noise = (&cov + &cov.t()) * 0.25;

    if let Some(band) = noise.diag().iter().position(|&v| !(v > 0.0)) {
        return Err(Error::DegenerateInput(format!(
            "noise variance of band {} is zero; enable `smooth` or choose a \
             different noise sample region",
            band + 1
        )));
    }

    debug!(
        pairs = moments.count,
        bands = shape.bands,
        blocks = shape.rows.div_ceil(rows_per_block),
        smooth = params.smooth,
        "estimated noise covariance"
    );
    Ok(noise)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use specdim_core::{BandStack, Raster};

    fn stack(
        rows: usize,
        cols: usize,
        f: impl Fn(usize, usize, usize) -> f64,
        bands: usize,
    ) -> BandStack<f64> {
        let rasters = (0..bands)
            .map(|b| {
                let data: Vec<f64> = (0..rows * cols).map(|i| f(i / cols, i % cols, b)).collect();
                Raster::from_vec(data, rows, cols).unwrap()
            })
            .collect();
        BandStack::new(rasters).unwrap()
    }

    #[test]
    fn test_alternating_rows() {
        // band 0 alternates 0 / 1 down the rows: every difference is ±1
        let s = stack(
            4,
            3,
            |r, _, b| if b == 0 { (r % 2) as f64 } else { (r * r) as f64 },
            2,
        );
        let noise = noise_covariance(&s, &NoiseParams::default()).unwrap();
        // nine differences (six +1, three -1): mean 1/3, squared deviations sum to 8
        assert_relative_eq!(noise[[0, 0]], 0.5 * 8.0 / 8.0, epsilon = 1e-12);
        assert!(noise[[1, 1]] > 0.0);
        assert_relative_eq!(noise[[0, 1]], noise[[1, 0]], epsilon = 1e-12);
    }

    #[test]
    fn test_constant_region_needs_smooth() {
        let s = stack(6, 6, |_, _, b| 100.0 + b as f64, 3);
        let err = noise_covariance(&s, &NoiseParams::default()).unwrap_err();
        assert!(matches!(err, Error::DegenerateInput(ref m) if m.contains("smooth")));

        let params = NoiseParams {
            smooth: true,
            ..Default::default()
        };
        let noise = noise_covariance(&s, &params).unwrap();
        assert!(noise.diag().iter().all(|&v| v > 0.0));
    }

    #[test]
    fn test_missing_pairs_are_dropped() {
        let mut s = stack(3, 2, |r, c, _| (r * 2 + c * c) as f64, 1).into_bands();
        s[0].set(1, 0, f64::NAN).unwrap();
        let s = BandStack::new(s).unwrap();
        // column 0 loses both of its pairs, column 1 keeps [2, 2]: zero variance
        assert!(matches!(
            noise_covariance(&s, &NoiseParams::default()),
            Err(Error::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_block_size_does_not_change_estimate() {
        let mut bands = stack(
            9,
            5,
            |r, c, b| ((r * 7 + c * 3 + b * 11) % 13) as f64 + 0.1 * (r * c) as f64,
            3,
        )
        .into_bands();
        bands[2].set(4, 1, f64::NAN).unwrap();
        let s = BandStack::new(bands).unwrap();

        for smooth in [false, true] {
            let params = NoiseParams {
                smooth,
                ..Default::default()
            };
            let whole = noise_covariance_in_blocks(&s, &params, 100).unwrap();
            assert_eq!(whole, noise_covariance(&s, &params).unwrap());
            for rows_per_block in [1, 2, 4] {
                let blocked = noise_covariance_in_blocks(&s, &params, rows_per_block).unwrap();
                for (a, b) in blocked.iter().zip(whole.iter()) {
                    assert_relative_eq!(*a, *b, epsilon = 1e-10, max_relative = 1e-10);
                }
            }
        }
    }

    #[test]
    fn test_rejects_single_row_and_bad_dither() {
        let s = stack(1, 5, |_, c, _| c as f64, 1);
        assert!(noise_covariance(&s, &NoiseParams::default()).is_err());

        let s = stack(4, 4, |r, c, _| (r + c) as f64, 1);
        let params = NoiseParams {
            smooth: true,
            dither: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            noise_covariance(&s, &params),
            Err(Error::InvalidArgument { name: "dither", .. })
        ));
    }
}
