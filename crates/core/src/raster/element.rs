//! Cell types a band can hold

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Numeric cell type of a band.
///
/// Statistics run in `f64`, so every element converts to it and decides for
/// itself which values count as missing.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Whether the cell is missing under `nodata`
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }

    /// Value as seen by the transforms: `NaN` when missing.
    fn to_sample(self, nodata: Option<Self>) -> f64 {
        if self.is_nodata(nodata) {
            return f64::NAN;
        }
        self.to_f64().unwrap_or(f64::NAN)
    }
}

macro_rules! impl_integer_element {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                nodata == Some(*self)
            }
        }
    )*};
}

// Non-finite floats are always missing. A NaN sentinel is never compared.
macro_rules! impl_float_element {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                !self.is_finite()
                    || nodata
                        .filter(|nd| !nd.is_nan())
                        .is_some_and(|nd| (self - nd).abs() < <$t>::EPSILON * 100.0)
            }
        }
    )*};
}

impl_integer_element!(i8, i16, i32, i64, u8, u16, u32, u64);
impl_float_element!(f32, f64);
