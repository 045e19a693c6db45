//! Native image representation handed to the transform backends.
//!
//! [`Image`] wraps an N-dimensional [`ArrayD`] with per-axis voxel spacing.
//! Operators accept bare arrays and wrap them on the way in, and
//! [`OutputMode`](crate::operator::OutputMode) picks which of the two comes
//! back out of the adjoint.

use alloc::vec;
use alloc::vec::Vec;
use ndarray::{ArrayD, IxDyn, Zip};

use crate::error::WaveletError;
use crate::num::{Complex, Float};

#[derive(Debug, Clone, PartialEq)]
pub struct Image<T> {
    data: ArrayD<T>,
    spacing: Vec<f64>,
}

impl<T> Image<T> {
    /// Wrap `data` with unit spacing on every axis.
    pub fn new(data: ArrayD<T>) -> Self {
        let spacing = vec![1.0; data.ndim()];
        Self { data, spacing }
    }

    /// Replace the voxel spacing. One entry per axis is required.
    pub fn with_spacing(mut self, spacing: Vec<f64>) -> Result<Self, WaveletError> {
        if spacing.len() != self.data.ndim() {
            return Err(WaveletError::DimensionMismatch {
                expected: self.data.ndim(),
                found: spacing.len(),
            });
        }
        self.spacing = spacing;
        Ok(self)
    }

    pub fn data(&self) -> &ArrayD<T> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut ArrayD<T> {
        &mut self.data
    }

    pub fn into_data(self) -> ArrayD<T> {
        self.data
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    pub fn spacing(&self) -> &[f64] {
        &self.spacing
    }
}

impl<T> From<ArrayD<T>> for Image<T> {
    fn from(data: ArrayD<T>) -> Self {
        Image::new(data)
    }
}

impl<T: Clone> From<&ArrayD<T>> for Image<T> {
    fn from(data: &ArrayD<T>) -> Self {
        Image::new(data.clone())
    }
}

/// Round every axis up to the next even length.
pub fn even_shape(shape: &[usize]) -> Vec<usize> {
    shape.iter().map(|&n| n + n % 2).collect()
}

/// Zero array of `shape` with a single unit sample at `shape / 2`.
pub fn impulse<T: Float>(shape: &[usize]) -> Result<ArrayD<T>, WaveletError> {
    if shape.iter().any(|&n| n == 0) {
        return Err(WaveletError::EmptyInput);
    }
    let mut data = ArrayD::from_elem(IxDyn(shape), T::zero());
    let center: Vec<usize> = shape.iter().map(|&n| n / 2).collect();
    data[center.as_slice()] = T::one();
    Ok(data)
}

/// Build an array from row-major values, checking the element count.
pub(crate) fn array_from_vec<T>(shape: &[usize], values: Vec<T>) -> Result<ArrayD<T>, WaveletError> {
    let expected: usize = shape.iter().product();
    let found = values.len();
    ArrayD::from_shape_vec(IxDyn(shape), values)
        .map_err(|_| WaveletError::ShapeMismatch { expected, found })
}

/// Split a complex array into its real and imaginary planes.
pub fn split_complex<T: Float>(data: &ArrayD<Complex<T>>) -> (ArrayD<T>, ArrayD<T>) {
    (data.mapv(|z| z.re), data.mapv(|z| z.im))
}

/// Recombine real and imaginary planes of identical shape.
pub fn join_complex<T: Float>(
    re: &ArrayD<T>,
    im: &ArrayD<T>,
) -> Result<ArrayD<Complex<T>>, WaveletError> {
    if re.shape() != im.shape() {
        return Err(WaveletError::InvalidShape {
            expected: re.shape().to_vec(),
            found: im.shape().to_vec(),
        });
    }
    Ok(Zip::from(re).and(im).map_collect(|&r, &i| Complex::new(r, i)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_shape_rounds_up() {
        assert_eq!(even_shape(&[63, 64, 1]), vec![64, 64, 2]);
    }

    #[test]
    fn impulse_is_centered() {
        let d = impulse::<f64>(&[4, 6]).unwrap();
        assert_eq!(d[&[2, 3][..]], 1.0);
        assert_eq!(d.iter().filter(|&&v| v != 0.0).count(), 1);
        assert_eq!(impulse::<f32>(&[0, 4]), Err(WaveletError::EmptyInput));
    }

    #[test]
    fn complex_split_join() {
        let z = ArrayD::from_shape_vec(
            IxDyn(&[2]),
            vec![Complex::new(1.0f32, -1.0), Complex::new(2.0, 0.5)],
        )
        .unwrap();
        let (re, im) = split_complex(&z);
        assert_eq!(re.iter().cloned().collect::<Vec<_>>(), vec![1.0, 2.0]);
        assert_eq!(join_complex(&re, &im).unwrap(), z);
    }

    #[test]
    fn spacing_must_match_rank() {
        let img = Image::new(ArrayD::<f32>::zeros(IxDyn(&[2, 2])));
        assert_eq!(img.spacing(), &[1.0, 1.0]);
        assert!(img.with_spacing(vec![0.5]).is_err());
    }
}
