//! Forward and inverse projection
//!
//! Forward: `y = ((x - μ) ÷ s) · P[:, ..k]`, with `s` the per-band scale in
//! correlation mode. Inverse: `x = (y · P⁻¹[..c, :]) × s + μ`, where `P⁻¹`
//! is the transpose for PCA and an explicit inverse for MNF.
//!
//! Every output component mixes every input band, so a pixel missing in
//! any input band is missing in every output component.

use super::model::TransformModel;
use crate::maybe_rayon::*;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use specdim_core::{BandStack, Error, RasterSource, Result};
use tracing::debug;

/// Pixels read and projected together when transforming a raster
const PIXEL_BLOCK: usize = 1 << 16;

fn check_components(name: &'static str, count: usize, bands: usize) -> Result<()> {
    if count == 0 || count > bands {
        return Err(Error::invalid_argument(
            name,
            count,
            format!("must be in [1, {}]", bands),
        ));
    }
    Ok(())
}

fn check_bands(model: &TransformModel, actual: usize) -> Result<()> {
    if actual != model.band_count() {
        return Err(Error::DimensionMismatch {
            expected: model.band_count(),
            actual,
        });
    }
    Ok(())
}

/// Apply `f` to every complete row; incomplete rows become all-`NaN`
fn map_rows<F>(input: ArrayView2<'_, f64>, width: usize, f: F) -> Result<Array2<f64>>
where
    F: Fn(ArrayView1<'_, f64>) -> Array1<f64> + Send + Sync,
{
    let n = input.nrows();
    let data: Vec<f64> = (0..n)
        .into_par_iter()
        .flat_map(|i| {
            let row = input.row(i);
            if row.iter().any(|v| !v.is_finite()) {
                vec![f64::NAN; width]
            } else {
                f(row).to_vec()
            }
        })
        .collect();
    Ok(Array2::from_shape_vec((n, width), data)?)
}

/// Project `pixels × bands` onto the first `k` components.
///
/// # Errors
/// - `DimensionMismatch` if the column count differs from the model's bands
/// - `InvalidArgument` if `k` is outside [1, bands]
pub fn forward(model: &TransformModel, pixels: &Array2<f64>, k: usize) -> Result<Array2<f64>> {
    check_bands(model, pixels.ncols())?;
    check_components("k", k, model.band_count())?;

    let basis = model.projection().slice(s![.., ..k]);
    let mean = model.mean();
    let scale = model.scale();
    map_rows(pixels.view(), k, |row| {
        let mut centered = &row - mean;
        if let Some(scale) = scale {
            centered /= scale;
        }
        centered.dot(&basis)
    })
}

/// Map `pixels × c` component values back to band space.
///
/// `c` is the number of retained components (columns). With `c` equal to
/// the band count the input of [`forward`] is recovered up to rounding;
/// fewer components give the best rank-`c` approximation.
///
/// # Errors
/// `InvalidArgument` if `c` is outside [1, bands]
pub fn inverse(model: &TransformModel, components: &Array2<f64>) -> Result<Array2<f64>> {
    let bands = model.band_count();
    let c = components.ncols();
    check_components("c", c, bands)?;

    let back = model.inverse_projection().slice(s![..c, ..]);
    let mean = model.mean();
    let scale = model.scale();
    map_rows(components.view(), bands, |row| {
        let mut restored = row.dot(&back);
        if let Some(scale) = scale {
            restored *= scale;
        }
        restored + mean
    })
}

/// Read `source` block by block, apply `f`, and stack the results
fn project_blocks<S, F>(source: &S, width: usize, f: F) -> Result<Array2<f64>>
where
    S: RasterSource + ?Sized,
    F: Fn(&Array2<f64>) -> Result<Array2<f64>>,
{
    let n = source.shape().n_pixels();
    let mut out = Array2::<f64>::zeros((n, width));
    for start in (0..n).step_by(PIXEL_BLOCK) {
        let end = (start + PIXEL_BLOCK).min(n);
        let indices: Vec<usize> = (start..end).collect();
        let block = source.read_pixels(&indices)?;
        out.slice_mut(s![start..end, ..]).assign(&f(&block)?);
    }
    Ok(out)
}

/// Project a raster onto its first `k` components.
///
/// The output has the input's grid, transform and CRS, `k` bands, and `NaN`
/// as nodata.
pub fn forward_raster<S: RasterSource + ?Sized>(
    model: &TransformModel,
    source: &S,
    k: usize,
) -> Result<BandStack<f64>> {
    let shape = source.shape();
    check_bands(model, shape.bands)?;
    check_components("k", k, model.band_count())?;
    debug!(
        rows = shape.rows,
        cols = shape.cols,
        k,
        kind = %model.kind(),
        "forward projection"
    );

    let out = project_blocks(source, k, |block| forward(model, block, k))?;
    BandStack::from_pixel_matrix(&shape.with_bands(k), &out)
}

/// Reconstruct band space from a raster of retained components
pub fn inverse_raster<S: RasterSource + ?Sized>(
    model: &TransformModel,
    source: &S,
) -> Result<BandStack<f64>> {
    let shape = source.shape();
    let bands = model.band_count();
    check_components("c", shape.bands, bands)?;
    debug!(
        rows = shape.rows,
        cols = shape.cols,
        components = shape.bands,
        kind = %model.kind(),
        "inverse projection"
    );

    let out = project_blocks(source, bands, |block| inverse(model, block))?;
    BandStack::from_pixel_matrix(&shape.with_bands(bands), &out)
}

/// Frobenius norm of `X - inverse(forward(X, k))` over the complete rows of `pixels`
pub fn reconstruction_error(model: &TransformModel, pixels: &Array2<f64>, k: usize) -> Result<f64> {
    check_bands(model, pixels.ncols())?;
    let complete: Vec<usize> = pixels
        .rows()
        .into_iter()
        .enumerate()
        .filter_map(|(i, row)| row.iter().all(|v| v.is_finite()).then_some(i))
        .collect();
    let pixels = pixels.select(Axis(0), &complete);

    let restored = inverse(model, &forward(model, &pixels, k)?)?;
    Ok((&pixels - &restored).mapv(|d| d * d).sum().sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatMode;
    use crate::transform::fit_pca_pixels;
    use approx::assert_abs_diff_eq;

    fn pixels() -> Array2<f64> {
        Array2::from_shape_fn((60, 4), |(i, b)| {
            let t = i as f64;
            (t * (0.3 + b as f64 * 0.21)).sin() * (b + 1) as f64 + t * 0.05 * b as f64
        })
    }

    #[test]
    fn test_forward_inverse_full_rank() {
        let x = pixels();
        for mode in [StatMode::Cov, StatMode::Cor] {
            let model = fit_pca_pixels(&x, mode).unwrap();
            let y = forward(&model, &x, 4).unwrap();
            let restored = inverse(&model, &y).unwrap();
            for (a, b) in x.iter().zip(restored.iter()) {
                assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_component_bounds() {
        let x = pixels();
        let model = fit_pca_pixels(&x, StatMode::Cov).unwrap();
        for k in [0, 5] {
            assert!(matches!(
                forward(&model, &x, k),
                Err(Error::InvalidArgument { name: "k", .. })
            ));
        }
        assert!(matches!(
            inverse(&model, &Array2::zeros((3, 5))),
            Err(Error::InvalidArgument { name: "c", .. })
        ));
        assert!(matches!(
            forward(&model, &Array2::zeros((3, 3)), 1),
            Err(Error::DimensionMismatch { expected: 4, actual: 3 })
        ));
    }

    #[test]
    fn test_missing_propagates_to_all_components() {
        let x = pixels();
        let model = fit_pca_pixels(&x, StatMode::Cov).unwrap();
        let mut with_gap = x.clone();
        with_gap[[7, 2]] = f64::NAN;
        with_gap[[9, 0]] = f64::INFINITY;

        let y = forward(&model, &with_gap, 2).unwrap();
        assert!(y.row(7).iter().all(|v| v.is_nan()));
        assert!(y.row(9).iter().all(|v| v.is_nan()));
        assert!(y.row(8).iter().all(|v| v.is_finite()));

        let back = inverse(&model, &y).unwrap();
        assert!(back.row(7).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_reconstruction_error_shrinks_with_k() {
        let x = pixels();
        let model = fit_pca_pixels(&x, StatMode::Cov).unwrap();
        let errors: Vec<f64> = (1..=4)
            .map(|k| reconstruction_error(&model, &x, k).unwrap())
            .collect();
        for w in errors.windows(2) {
            assert!(w[0] >= w[1] - 1e-9, "errors not monotone: {:?}", errors);
        }
        assert!(errors[3] < 1e-8);
    }
}
