//! Convolution of N-d data with an [`MrFilters`] bank.
//!
//! Samples outside the grid are zero. In [`FilterMode::Forward`] each band is
//! `out[x] = sum_o f[o] * data[x - o]`; [`FilterMode::Rotated`] correlates
//! with the same taps (`data[x + o]`, i.e. the 180° rotated filter) and sums
//! the bands, which is the exact adjoint of the forward mode.

use alloc::vec;
use alloc::vec::Vec;
use ndarray::{ArrayD, Axis};

use crate::error::WaveletError;
use crate::image::array_from_vec;
use crate::mr_filters::{Filter, MrFilters};
use crate::num::Float;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// `S -> [bands, ..S]`.
    #[default]
    Forward,
    /// `[bands, ..S] -> S`, the adjoint of `Forward`.
    Rotated,
}

/// Apply `filters` to `data`.
pub fn filter_convolve<T: Float>(
    data: &ArrayD<T>,
    filters: &MrFilters<T>,
    mode: FilterMode,
) -> Result<ArrayD<T>, WaveletError> {
    let shape = filters.shape();
    let n: usize = shape.iter().product();
    match mode {
        FilterMode::Forward => {
            if data.shape() != shape {
                return Err(WaveletError::InvalidShape {
                    expected: shape.to_vec(),
                    found: data.shape().to_vec(),
                });
            }
            let src: Vec<T> = data.iter().copied().collect();
            let mut out = vec![T::zero(); filters.band_count() * n];
            for (band, dst) in filters.bands().iter().zip(out.chunks_exact_mut(n)) {
                apply_filter(&src, shape, band, -1, dst);
            }
            let mut out_shape = Vec::with_capacity(shape.len() + 1);
            out_shape.push(filters.band_count());
            out_shape.extend_from_slice(shape);
            array_from_vec(&out_shape, out)
        }
        FilterMode::Rotated => {
            let expected_ok = data.ndim() == shape.len() + 1
                && data.shape()[0] == filters.band_count()
                && &data.shape()[1..] == shape;
            if !expected_ok {
                let mut expected = Vec::with_capacity(shape.len() + 1);
                expected.push(filters.band_count());
                expected.extend_from_slice(shape);
                return Err(WaveletError::InvalidShape {
                    expected,
                    found: data.shape().to_vec(),
                });
            }
            let mut out = vec![T::zero(); n];
            for (band, coeffs) in filters.bands().iter().zip(data.axis_iter(Axis(0))) {
                let src: Vec<T> = coeffs.iter().copied().collect();
                apply_filter(&src, shape, band, 1, &mut out);
            }
            array_from_vec(shape, out)
        }
    }
}

/// `out[x] += sum_o f[o] * src[x + sign * o]`, zero outside the grid.
fn apply_filter<T: Float>(src: &[T], shape: &[usize], filter: &Filter<T>, sign: isize, out: &mut [T]) {
    let ndim = shape.len();
    let mut coord = vec![0usize; ndim];
    for slot in out.iter_mut() {
        let mut acc = T::zero();
        'taps: for (offset, value) in filter.taps() {
            let mut flat = 0usize;
            for axis in 0..ndim {
                let p = coord[axis] as isize + sign * offset[axis];
                if p < 0 || p >= shape[axis] as isize {
                    continue 'taps;
                }
                flat = flat * shape[axis] + p as usize;
            }
            acc = value.mul_add(src[flat], acc);
        }
        *slot = *slot + acc;
        for axis in (0..ndim).rev() {
            coord[axis] += 1;
            if coord[axis] < shape[axis] {
                break;
            }
            coord[axis] = 0;
        }
    }
}
