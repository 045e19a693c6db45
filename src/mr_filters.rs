//! Filter generation for the undecimated operator.
//!
//! The filters are the impulse responses of the à trous transform: a unit
//! sample is placed at the centre of a grid of the target shape and
//! decomposed once. Each resulting band, cropped to its non-zero taps, is
//! the filter that produces that band by convolution. Computing them once
//! and convolving afterwards is what lets the undecimated operator expose an
//! exact adjoint.

use alloc::vec::Vec;
use core::fmt;

use crate::atrous::{AtrousTransform, Kernel};
use crate::error::WaveletError;
use crate::image::{impulse, Image};
use crate::num::Float;
use crate::registry::{Transform, TransformConfig};

/// Options for [`get_mr_filters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterOptions {
    /// Kernel id, see [`Kernel::from_wavelet_id`].
    pub wavelet_id: u32,
    /// Number of scales, coarse approximation included.
    pub nb_scale: usize,
    /// Keep the coarse-scale filter.
    pub coarse: bool,
}

impl FilterOptions {
    pub fn new(wavelet_id: u32, nb_scale: usize) -> Self {
        Self {
            wavelet_id,
            nb_scale,
            coarse: true,
        }
    }
}

/// Sparse N-d filter: non-zero taps and their offsets from the centre.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter<T> {
    ndim: usize,
    offsets: Vec<isize>,
    values: Vec<T>,
}

impl<T: Float> Filter<T> {
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    pub fn tap_count(&self) -> usize {
        self.values.len()
    }

    /// `(offset, value)` for every non-zero tap.
    pub fn taps(&self) -> impl Iterator<Item = (&[isize], T)> + '_ {
        self.offsets
            .chunks_exact(self.ndim)
            .zip(self.values.iter().copied())
    }

    /// Sum of squared taps.
    pub fn energy(&self) -> T {
        self.values.iter().fold(T::zero(), |acc, &v| v.mul_add(v, acc))
    }
}

/// Filter bank produced by [`get_mr_filters`], one filter per band.
#[derive(Clone, PartialEq)]
pub struct MrFilters<T> {
    shape: Vec<usize>,
    options: FilterOptions,
    bands: Vec<Filter<T>>,
    fingerprint: [u8; 32],
}

impl<T: Float> MrFilters<T> {
    /// Shape of the grid the filters were generated on.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn bands(&self) -> &[Filter<T>] {
        &self.bands
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// blake3 digest of the shape, options and every tap.
    pub fn fingerprint(&self) -> &[u8; 32] {
        &self.fingerprint
    }
}

impl<T: Float> fmt::Debug for MrFilters<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MrFilters")
            .field("shape", &self.shape)
            .field("options", &self.options)
            .field("bands", &self.bands.len())
            .finish()
    }
}

/// Compute the undecimated filter bank for data of `shape`.
pub fn get_mr_filters<T: Float>(
    shape: &[usize],
    options: &FilterOptions,
) -> Result<MrFilters<T>, WaveletError> {
    if shape.is_empty() || shape.iter().any(|&n| n == 0) {
        return Err(WaveletError::EmptyInput);
    }
    let kernel = Kernel::from_wavelet_id(options.wavelet_id)?;
    let transform = AtrousTransform::<T>::new(
        kernel,
        &TransformConfig::new(options.nb_scale, shape.len()),
    )?;
    let delta = impulse::<T>(shape)?;
    let bundle = transform.analyze(&Image::new(delta))?;
    let center: Vec<isize> = shape.iter().map(|&n| (n / 2) as isize).collect();

    let mut leaves = bundle.leaves();
    if !options.coarse {
        leaves.pop();
    }
    let mut bands = Vec::with_capacity(leaves.len());
    for band in leaves {
        let mut offsets = Vec::new();
        let mut values = Vec::new();
        for (index, &value) in band.indexed_iter() {
            if value == T::zero() {
                continue;
            }
            for (axis, &c) in center.iter().enumerate() {
                offsets.push(index[axis] as isize - c);
            }
            values.push(value);
        }
        bands.push(Filter {
            ndim: shape.len(),
            offsets,
            values,
        });
    }

    let fingerprint = digest(shape, options, &bands);
    crate::vlog!(
        "computed {} undecimated filters for shape {:?} (wavelet id {}, {} taps)",
        bands.len(),
        shape,
        options.wavelet_id,
        bands.iter().map(Filter::tap_count).sum::<usize>()
    );
    Ok(MrFilters {
        shape: shape.to_vec(),
        options: *options,
        bands,
        fingerprint,
    })
}

fn digest<T: Float>(shape: &[usize], options: &FilterOptions, bands: &[Filter<T>]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for &n in shape {
        hasher.update(&(n as u64).to_le_bytes());
    }
    hasher.update(&options.wavelet_id.to_le_bytes());
    hasher.update(&(options.nb_scale as u64).to_le_bytes());
    hasher.update(&[options.coarse as u8]);
    for band in bands {
        hasher.update(&(band.tap_count() as u64).to_le_bytes());
        for (offset, value) in band.taps() {
            for &o in offset {
                hasher.update(&(o as i64).to_le_bytes());
            }
            hasher.update(&value.to_f64().to_le_bytes());
        }
    }
    *hasher.finalize().as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_count_follows_coarse_flag() {
        let with = get_mr_filters::<f64>(&[16, 16], &FilterOptions::new(2, 4)).unwrap();
        assert_eq!(with.band_count(), 4);
        let without = get_mr_filters::<f64>(
            &[16, 16],
            &FilterOptions {
                coarse: false,
                ..FilterOptions::new(2, 4)
            },
        )
        .unwrap();
        assert_eq!(without.band_count(), 3);
        assert_ne!(with.fingerprint(), without.fingerprint());
    }

    #[test]
    fn filters_sum_to_unit_impulse() {
        // Starlet bands add up to the input, so the filters add up to a delta.
        let filters = get_mr_filters::<f64>(&[32, 32], &FilterOptions::new(2, 3)).unwrap();
        let mut at_center = 0.0;
        let mut elsewhere = 0.0;
        for band in filters.bands() {
            for (offset, value) in band.taps() {
                if offset.iter().all(|&o| o == 0) {
                    at_center += value;
                } else {
                    elsewhere += value;
                }
            }
        }
        assert!((at_center - 1.0).abs() < 1e-12);
        assert!(elsewhere.abs() < 1e-12);
    }

    #[test]
    fn first_band_support_is_kernel_width() {
        let filters = get_mr_filters::<f64>(&[32], &FilterOptions::new(1, 2)).unwrap();
        let first = &filters.bands()[0];
        let max_offset = first.taps().map(|(o, _)| o[0].abs()).max().unwrap();
        assert_eq!(max_offset, 1);
    }

    #[test]
    fn deterministic_fingerprint() {
        let a = get_mr_filters::<f32>(&[8, 12], &FilterOptions::new(2, 3)).unwrap();
        let b = get_mr_filters::<f32>(&[8, 12], &FilterOptions::new(2, 3)).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_bad_options() {
        assert_eq!(
            get_mr_filters::<f64>(&[8, 8], &FilterOptions::new(9, 3)).unwrap_err(),
            WaveletError::UnknownWaveletId(9)
        );
        assert_eq!(
            get_mr_filters::<f64>(&[8, 0], &FilterOptions::new(2, 3)).unwrap_err(),
            WaveletError::EmptyInput
        );
    }
}
