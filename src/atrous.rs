//! Undecimated "à trous" (starlet) wavelet transform.
//!
//! Scale `j` smooths the previous approximation with a separable kernel whose
//! taps are spread `2^j` samples apart; the detail band is the difference.
//! All bands keep the input shape, and synthesis is a plain sum:
//!
//! ```text
//! c0 = x,  c(j+1) = smooth(c(j), 2^j),  w(j+1) = c(j) - c(j+1)
//! x  = w1 + w2 + ... + w(J-1) + c(J-1)
//! ```
//!
//! Boundaries are mirrored without repeating the edge sample.

use alloc::vec::Vec;
use ndarray::{ArrayD, Axis, IxDyn, Zip};

use crate::codec::Bundle;
use crate::error::WaveletError;
use crate::image::Image;
use crate::num::Float;
use crate::registry::{Transform, TransformConfig};

const LINEAR: [f64; 3] = [0.25, 0.5, 0.25];
const B3_SPLINE: [f64; 5] = [1.0 / 16.0, 0.25, 3.0 / 8.0, 0.25, 1.0 / 16.0];

/// Smoothing kernel, selected by the numeric wavelet id used by the
/// undecimated operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    /// id 1: linear interpolation, `[1, 2, 1] / 4`.
    Linear,
    /// id 2: cubic B-spline, `[1, 4, 6, 4, 1] / 16`.
    B3Spline,
}

impl Kernel {
    pub fn from_wavelet_id(id: u32) -> Result<Self, WaveletError> {
        match id {
            1 => Ok(Kernel::Linear),
            2 => Ok(Kernel::B3Spline),
            _ => Err(WaveletError::UnknownWaveletId(id)),
        }
    }

    pub fn wavelet_id(self) -> u32 {
        match self {
            Kernel::Linear => 1,
            Kernel::B3Spline => 2,
        }
    }

    pub fn taps(self) -> &'static [f64] {
        match self {
            Kernel::Linear => &LINEAR,
            Kernel::B3Spline => &B3_SPLINE,
        }
    }
}

/// Reflect `idx` into `0..n` (whole-sample symmetry).
#[inline]
pub fn mirror_index(idx: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n as isize - 1);
    let i = idx.rem_euclid(period);
    if i >= n as isize {
        (period - i) as usize
    } else {
        i as usize
    }
}

#[derive(Debug, Clone)]
pub struct AtrousTransform<T> {
    kernel: Kernel,
    taps: Vec<T>,
    nb_scale: usize,
    dim: usize,
}

impl<T: Float> AtrousTransform<T> {
    pub fn new(kernel: Kernel, config: &TransformConfig) -> Result<Self, WaveletError> {
        config.validate()?;
        Ok(Self {
            kernel,
            taps: kernel.taps().iter().map(|&v| T::from_f64(v)).collect(),
            nb_scale: config.nb_scale,
            dim: config.dim,
        })
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    fn smooth_axis(&self, data: &ArrayD<T>, axis: usize, step: usize) -> ArrayD<T> {
        let mut out = data.clone();
        let half = (self.taps.len() / 2) as isize;
        for (lane, mut out_lane) in data
            .lanes(Axis(axis))
            .into_iter()
            .zip(out.lanes_mut(Axis(axis)))
        {
            let n = lane.len();
            for i in 0..n {
                let mut acc = T::zero();
                for (k, &w) in self.taps.iter().enumerate() {
                    let offset = (k as isize - half) * step as isize;
                    acc = w.mul_add(lane[mirror_index(i as isize + offset, n)], acc);
                }
                out_lane[i] = acc;
            }
        }
        out
    }

    /// Separable smoothing with taps `step` samples apart.
    pub fn smooth(&self, data: &ArrayD<T>, step: usize) -> ArrayD<T> {
        let mut current = self.smooth_axis(data, 0, step);
        for axis in 1..data.ndim() {
            current = self.smooth_axis(&current, axis, step);
        }
        current
    }
}

impl<T: Float> Transform<T> for AtrousTransform<T> {
    fn name(&self) -> &str {
        crate::registry::TransformKind::from(self.kernel).name()
    }

    fn nb_scale(&self) -> usize {
        self.nb_scale
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn analyze(&self, image: &Image<T>) -> Result<Bundle<T>, WaveletError> {
        if image.ndim() != self.dim {
            return Err(WaveletError::DimensionMismatch {
                expected: self.dim,
                found: image.ndim(),
            });
        }
        if image.data().is_empty() {
            return Err(WaveletError::EmptyInput);
        }
        let mut bands = Vec::with_capacity(self.nb_scale);
        let mut current = image.data().to_owned();
        for scale in 0..self.nb_scale - 1 {
            let smoothed = self.smooth(&current, 1 << scale);
            let detail = Zip::from(&current)
                .and(&smoothed)
                .map_collect(|&c, &s| c - s);
            bands.push(Bundle::Leaf(detail));
            current = smoothed;
        }
        bands.push(Bundle::Leaf(current));
        Ok(Bundle::Node(bands))
    }

    fn synthesize(&self, bands: &Bundle<T>, shape: &[usize]) -> Result<Image<T>, WaveletError> {
        let scales = match bands {
            Bundle::Node(scales) if scales.len() == self.nb_scale => scales,
            _ => return Err(WaveletError::MalformedBundle),
        };
        let mut out = ArrayD::from_elem(IxDyn(shape), T::zero());
        for band in scales {
            let band = match band {
                Bundle::Leaf(arr) => arr,
                Bundle::Node(_) => return Err(WaveletError::MalformedBundle),
            };
            if band.shape() != shape {
                return Err(WaveletError::InvalidShape {
                    expected: shape.to_vec(),
                    found: band.shape().to_vec(),
                });
            }
            Zip::from(&mut out).and(band).for_each(|o, &b| *o = *o + b);
        }
        Ok(Image::new(out))
    }
}
