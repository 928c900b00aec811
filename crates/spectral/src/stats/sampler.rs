//! Pixel sampling
//!
//! Draws a fraction of the complete pixels (no band missing) of a source
//! into an in-memory `pixels × bands` matrix. The draw is without
//! replacement and seeded, so a fit is reproducible.

use ndarray::Array2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use specdim_core::{Error, RasterSource, Result};
use tracing::debug;

/// Check that a sampling fraction lies in (0, 1]
pub fn validate_fraction(fraction: f64) -> Result<()> {
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(Error::invalid_argument(
            "fraction",
            fraction,
            "must be in (0, 1]",
        ));
    }
    Ok(())
}

/// Number of pixels drawn from `n_valid` complete pixels.
///
/// `round(n_valid · fraction)`, raised to 2 when possible so a covariance
/// can always be formed.
pub fn sample_size(n_valid: usize, fraction: f64) -> usize {
    let target = (n_valid as f64 * fraction).round() as usize;
    target.clamp(n_valid.min(2), n_valid)
}

/// Sample complete pixels from `source`.
///
/// With `fraction == 1.0` every complete pixel is returned in raster order
/// and the seed is unused. Otherwise pixel indices are drawn without
/// replacement and read back in ascending order.
///
/// # Errors
/// - `InvalidArgument` if `fraction` is outside (0, 1]
/// - `DegenerateInput` if fewer than 2 complete pixels exist
pub fn sample_pixels<S: RasterSource + ?Sized>(
    source: &S,
    fraction: f64,
    seed: u64,
) -> Result<Array2<f64>> {
    validate_fraction(fraction)?;

    let valid: Vec<usize> = source
        .complete_mask()?
        .iter()
        .enumerate()
        .filter_map(|(i, &complete)| complete.then_some(i))
        .collect();
    if valid.len() < 2 {
        return Err(Error::DegenerateInput(format!(
            "{} complete pixels found; at least 2 are needed",
            valid.len()
        )));
    }

    let target = sample_size(valid.len(), fraction);
    let picked = if target == valid.len() {
        valid
    } else {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut picked: Vec<usize> = rand::seq::index::sample(&mut rng, valid.len(), target)
            .into_iter()
            .map(|i| valid[i])
            .collect();
        picked.sort_unstable();
        picked
    };

    debug!(
        sampled = picked.len(),
        bands = source.band_count(),
        fraction,
        "sampled complete pixels"
    );
    source.read_pixels(&picked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use specdim_core::PixelTable;

    fn table(n: usize) -> PixelTable {
        PixelTable::new(Array2::from_shape_fn((n, 3), |(r, c)| (r * 3 + c) as f64))
    }

    #[test]
    fn test_fraction_bounds() {
        for bad in [0.0, -0.1, 1.5, f64::NAN] {
            assert!(matches!(
                sample_pixels(&table(10), bad, 1),
                Err(Error::InvalidArgument { name: "fraction", .. })
            ));
        }
    }

    #[test]
    fn test_full_fraction_keeps_order() {
        let m = sample_pixels(&table(10), 1.0, 1).unwrap();
        assert_eq!(m, table(10).into_inner());
    }

    #[test]
    fn test_partial_fraction_without_replacement() {
        let m = sample_pixels(&table(100), 0.25, 7).unwrap();
        assert_eq!(m.nrows(), 25);
        let mut firsts: Vec<f64> = m.column(0).to_vec();
        firsts.dedup();
        assert_eq!(firsts.len(), 25);
        assert!(firsts.windows(2).all(|w| w[0] < w[1]));

        let again = sample_pixels(&table(100), 0.25, 7).unwrap();
        assert_eq!(m, again);
    }

    #[test]
    fn test_missing_rows_are_excluded() {
        let mut data = table(6).into_inner();
        data[[1, 2]] = f64::NAN;
        data[[4, 0]] = f64::NAN;
        let m = sample_pixels(&PixelTable::new(data), 1.0, 0).unwrap();
        assert_eq!(m.nrows(), 4);
        assert!(m.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_sample_size_floor() {
        assert_eq!(sample_size(100, 0.001), 2);
        assert_eq!(sample_size(1, 0.5), 1);
        assert_eq!(sample_size(10, 1.0), 10);
        assert_eq!(sample_size(10, 0.35), 4);
    }

    #[test]
    fn test_too_few_pixels() {
        let data = Array2::from_elem((3, 2), f64::NAN);
        assert!(matches!(
            sample_pixels(&PixelTable::new(data), 1.0, 0),
            Err(Error::DegenerateInput(_))
        ));
    }
}
