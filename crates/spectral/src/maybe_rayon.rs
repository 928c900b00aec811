//! `into_par_iter()` for projection rows, with or without rayon.
//!
//! Under `parallel` the rayon traits are re-exported as-is. Otherwise
//! `into_par_iter()` is `into_iter()` and the chain that follows runs on
//! plain `Iterator` adapters, so call sites compile unchanged either way.

#[cfg(feature = "parallel")]
pub(crate) use rayon::iter::{IntoParallelIterator, ParallelIterator};

#[cfg(not(feature = "parallel"))]
pub(crate) trait IntoParallelIterator: IntoIterator + Sized {
    fn into_par_iter(self) -> Self::IntoIter {
        self.into_iter()
    }
}

#[cfg(not(feature = "parallel"))]
impl<I: IntoIterator> IntoParallelIterator for I {}
