//! Synthetic multi-band rasters shared by the integration tests.

#![allow(dead_code)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use specdim_core::{BandStack, GeoTransform, Raster, CRS};

/// Route library logs to the test output; filter with `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build a stack from a per-cell function `f(row, col, band)`
pub fn stack_from_fn(
    rows: usize,
    cols: usize,
    bands: usize,
    f: impl Fn(usize, usize, usize) -> f64,
) -> BandStack<f64> {
    let rasters = (0..bands)
        .map(|b| {
            let data: Vec<f64> = (0..rows * cols).map(|i| f(i / cols, i % cols, b)).collect();
            let mut raster = Raster::from_vec(data, rows, cols).unwrap();
            raster.set_transform(GeoTransform::new(500_000.0, 4_200_000.0, 30.0, -30.0));
            raster.set_crs(Some(CRS::from_epsg(32633)));
            raster
        })
        .collect();
    BandStack::new(rasters).unwrap()
}

/// Reflectance-like scene: two smooth latent fields mixed into every band
/// plus uniform sensor noise.
pub fn scene(rows: usize, cols: usize, bands: usize, seed: u64) -> BandStack<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let noise: Vec<f64> = (0..rows * cols * bands)
        .map(|_| rng.gen_range(-0.01..0.01))
        .collect();
    stack_from_fn(rows, cols, bands, |r, c, b| {
        let (rf, cf, bf) = (r as f64, c as f64, b as f64);
        let vegetation = (rf / 5.0).sin() + (cf / 7.0).cos();
        let soil = rf * cf / (rows * cols) as f64;
        let weight = (bf + 1.0) / bands as f64;
        0.2 + 0.1 * weight * vegetation + 0.3 * (1.0 - weight) * soil
            + noise[(b * rows + r) * cols + c]
    })
}

/// Three bands where band 3 = 2 · band 1 + small noise
pub fn collinear_scene(rows: usize, cols: usize, seed: u64) -> BandStack<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let jitter: Vec<f64> = (0..rows * cols).map(|_| rng.gen_range(-0.05..0.05)).collect();
    stack_from_fn(rows, cols, 3, |r, c, b| {
        let band1 = 10.0 * ((r as f64) / 3.0).sin() + 0.5 * c as f64;
        match b {
            0 => band1,
            1 => 0.3 * ((c as f64) / 2.0).cos(),
            _ => 2.0 * band1 + jitter[r * cols + c],
        }
    })
}

/// Same data stored as `f32`
pub fn to_f32(stack: &BandStack<f64>) -> BandStack<f32> {
    let rasters = stack
        .bands()
        .iter()
        .map(|band| {
            let mut out = Raster::from_array(band.data().mapv(|v| v as f32));
            out.set_transform(*band.transform());
            out.set_crs(band.crs().cloned());
            out
        })
        .collect();
    BandStack::new(rasters).unwrap()
}

/// Largest absolute difference between two stacks.
///
/// Panics unless both stacks have the same dimensions and the same missing
/// cells; cells missing in both are skipped.
pub fn max_abs_diff(a: &BandStack<f64>, b: &BandStack<f64>) -> f64 {
    assert_eq!(a.len(), b.len(), "band counts differ");
    let mut worst = 0.0_f64;
    for (band, (x, y)) in a.bands().iter().zip(b.bands()).enumerate() {
        assert_eq!(x.shape(), y.shape(), "band {} dimensions differ", band);
        for ((cell, p), q) in x.data().indexed_iter().zip(y.data().iter()) {
            assert_eq!(
                p.is_nan(),
                q.is_nan(),
                "band {} cell {:?}: {} vs {}",
                band,
                cell,
                p,
                q
            );
            if !p.is_nan() {
                worst = worst.max((p - q).abs());
            }
        }
    }
    worst
}
