//! The forward/adjoint operator interface consumed by reconstruction solvers.
//!
//! Solvers only ever see `op`, `adj_op` and `l2_norm`. `op` takes `&mut self`
//! because both operators record state from the forward pass (the
//! coefficient layout, or the filter bank) that `adj_op` relies on.

use ndarray::ArrayD;

use crate::error::WaveletError;
use crate::image::{even_shape, Image};

/// Linear map with an adjoint.
pub trait LinearOperator {
    /// Image space.
    type Domain;
    /// Coefficient space.
    type Range;

    fn op(&mut self, data: &Self::Domain) -> Result<Self::Range, WaveletError>;

    fn adj_op(&self, coeffs: &Self::Range) -> Result<Self::Domain, WaveletError>;

    /// Zero element of the domain with a unit sample at `shape / 2`.
    fn impulse(shape: &[usize]) -> Result<Self::Domain, WaveletError>;

    /// Euclidean norm of a range element.
    fn range_norm(coeffs: &Self::Range) -> f64;

    /// Norm of the operator response to a centred impulse.
    ///
    /// `shape` is rounded up to even lengths first. Runs `op`, so any state
    /// cached by `op` now describes the impulse.
    fn l2_norm(&mut self, shape: &[usize]) -> Result<f64, WaveletError> {
        let delta = Self::impulse(&even_shape(shape))?;
        let coeffs = self.op(&delta)?;
        Ok(Self::range_norm(&coeffs))
    }
}

/// What [`Wavelet::adj_op_as`](crate::wavelet::Wavelet::adj_op_as) hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputMode {
    #[default]
    Array,
    Image,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reconstruction<T> {
    Array(ArrayD<T>),
    Image(Image<T>),
}

impl<T> Reconstruction<T> {
    pub fn into_array(self) -> ArrayD<T> {
        match self {
            Reconstruction::Array(data) => data,
            Reconstruction::Image(image) => image.into_data(),
        }
    }

    pub fn as_image(&self) -> Option<&Image<T>> {
        match self {
            Reconstruction::Image(image) => Some(image),
            Reconstruction::Array(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::impulse;
    use ndarray::IxDyn;

    /// Scales by two; adjoint is itself.
    struct Doubler {
        calls: usize,
    }

    impl LinearOperator for Doubler {
        type Domain = ArrayD<f64>;
        type Range = ArrayD<f64>;

        fn op(&mut self, data: &ArrayD<f64>) -> Result<ArrayD<f64>, WaveletError> {
            self.calls += 1;
            Ok(data.mapv(|v| 2.0 * v))
        }

        fn adj_op(&self, coeffs: &ArrayD<f64>) -> Result<ArrayD<f64>, WaveletError> {
            Ok(coeffs.mapv(|v| 2.0 * v))
        }

        fn impulse(shape: &[usize]) -> Result<ArrayD<f64>, WaveletError> {
            impulse(shape)
        }

        fn range_norm(coeffs: &ArrayD<f64>) -> f64 {
            libm::sqrt(coeffs.iter().map(|v| v * v).sum())
        }
    }

    #[test]
    fn default_l2_norm_uses_even_impulse() {
        let mut d = Doubler { calls: 0 };
        let norm = d.l2_norm(&[3, 5]).unwrap();
        assert!((norm - 2.0).abs() < 1e-12);
        assert_eq!(d.calls, 1);
    }

    #[test]
    fn reconstruction_unwraps() {
        let a = ArrayD::from_elem(IxDyn(&[2, 2]), 1.0f32);
        let r = Reconstruction::Image(Image::new(a.clone()));
        assert!(r.as_image().is_some());
        assert_eq!(r.into_array(), a);
    }
}
