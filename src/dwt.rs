//! N-dimensional decimated (Mallat) wavelet transform.
//!
//! Every level splits the current approximation along each axis in turn,
//! giving `2^dim` sub-bands. Band index bits are read axis 0 first, so index
//! 0 is the all-low approximation that feeds the next level and the other
//! `2^dim - 1` bands are that level's details.
//!
//! The decomposition bundle is ordered finest scale first with the coarse
//! approximation last:
//!
//! ```text
//! Node[ Node[details level 1], Node[details level 2], ..., Leaf(approx) ]
//! ```
//!
//! `nb_scale` counts the approximation as a scale, so `nb_scale - 1` levels
//! are computed.

use alloc::vec;
use alloc::vec::Vec;
use ndarray::{ArrayD, Axis, IxDyn};

use crate::codec::Bundle;
use crate::error::WaveletError;
use crate::filters::{Family, FilterBank};
use crate::image::Image;
use crate::num::Float;
use crate::registry::{Transform, TransformConfig};

#[derive(Debug, Clone)]
pub struct DecimatedTransform<T> {
    family: Family,
    bank: FilterBank<T>,
    nb_scale: usize,
    dim: usize,
}

impl<T: Float> DecimatedTransform<T> {
    pub fn new(family: Family, config: &TransformConfig) -> Result<Self, WaveletError> {
        config.validate()?;
        Ok(Self {
            family,
            bank: family.filter_bank(),
            nb_scale: config.nb_scale,
            dim: config.dim,
        })
    }

    pub fn family(&self) -> Family {
        self.family
    }

    /// Number of decomposition levels (detail scales).
    pub fn levels(&self) -> usize {
        self.nb_scale - 1
    }

    /// Array shape at every level, from the input down to the approximation.
    pub fn level_shapes(&self, shape: &[usize]) -> Vec<Vec<usize>> {
        let mut shapes = Vec::with_capacity(self.nb_scale);
        let mut current = shape.to_vec();
        shapes.push(current.clone());
        for _ in 0..self.levels() {
            current = current.iter().map(|&n| FilterBank::<T>::half_len(n)).collect();
            shapes.push(current.clone());
        }
        shapes
    }

    fn split_axis(&self, data: &ArrayD<T>, axis: usize) -> (ArrayD<T>, ArrayD<T>) {
        let n = data.shape()[axis];
        let mut half_shape = data.shape().to_vec();
        half_shape[axis] = FilterBank::<T>::half_len(n);
        let mut lo = ArrayD::from_elem(IxDyn(&half_shape), T::zero());
        let mut hi = ArrayD::from_elem(IxDyn(&half_shape), T::zero());
        let mut buf = Vec::with_capacity(n);
        for ((lane, mut lo_lane), mut hi_lane) in data
            .lanes(Axis(axis))
            .into_iter()
            .zip(lo.lanes_mut(Axis(axis)))
            .zip(hi.lanes_mut(Axis(axis)))
        {
            buf.clear();
            buf.extend(lane.iter().cloned());
            let (approx, detail) = self.bank.analyze(&buf);
            lo_lane.iter_mut().zip(approx).for_each(|(dst, v)| *dst = v);
            hi_lane.iter_mut().zip(detail).for_each(|(dst, v)| *dst = v);
        }
        (lo, hi)
    }

    fn merge_axis(&self, lo: &ArrayD<T>, hi: &ArrayD<T>, axis: usize, n: usize) -> ArrayD<T> {
        let mut full_shape = lo.shape().to_vec();
        full_shape[axis] = n;
        let mut out = ArrayD::from_elem(IxDyn(&full_shape), T::zero());
        let mut a = Vec::with_capacity(lo.shape()[axis]);
        let mut d = Vec::with_capacity(lo.shape()[axis]);
        for ((lo_lane, hi_lane), mut out_lane) in lo
            .lanes(Axis(axis))
            .into_iter()
            .zip(hi.lanes(Axis(axis)))
            .zip(out.lanes_mut(Axis(axis)))
        {
            a.clear();
            a.extend(lo_lane.iter().cloned());
            d.clear();
            d.extend(hi_lane.iter().cloned());
            let samples = self.bank.synthesize(&a, &d, n);
            out_lane.iter_mut().zip(samples).for_each(|(dst, v)| *dst = v);
        }
        out
    }
}

impl<T: Float> Transform<T> for DecimatedTransform<T> {
    fn name(&self) -> &str {
        crate::registry::TransformKind::from(self.family).name()
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
        let mut current = image.data().to_owned();
        let mut scales = Vec::with_capacity(self.nb_scale);
        for _ in 0..self.levels() {
            let mut bands = vec![current];
            for axis in 0..self.dim {
                let mut next = Vec::with_capacity(bands.len() * 2);
                for band in &bands {
                    let (lo, hi) = self.split_axis(band, axis);
                    next.push(lo);
                    next.push(hi);
                }
                bands = next;
            }
            let mut bands = bands.into_iter();
            current = bands.next().ok_or(WaveletError::MalformedBundle)?;
            scales.push(Bundle::Node(bands.map(Bundle::Leaf).collect()));
        }
        scales.push(Bundle::Leaf(current));
        Ok(Bundle::Node(scales))
    }

    fn synthesize(&self, bands: &Bundle<T>, shape: &[usize]) -> Result<Image<T>, WaveletError> {
        if shape.len() != self.dim {
            return Err(WaveletError::DimensionMismatch {
                expected: self.dim,
                found: shape.len(),
            });
        }
        let levels = self.levels();
        let shapes = self.level_shapes(shape);
        let scales = match bands {
            Bundle::Node(scales) if scales.len() == levels + 1 => scales,
            _ => return Err(WaveletError::MalformedBundle),
        };
        let mut current = match &scales[levels] {
            Bundle::Leaf(approx) => expect_shape(approx, &shapes[levels])?.clone(),
            Bundle::Node(_) => return Err(WaveletError::MalformedBundle),
        };
        let band_count = 1usize << self.dim;
        for level in (0..levels).rev() {
            let details = match &scales[level] {
                Bundle::Node(details) if details.len() == band_count - 1 => details,
                _ => return Err(WaveletError::MalformedBundle),
            };
            let mut level_bands = Vec::with_capacity(band_count);
            level_bands.push(current);
            for detail in details {
                match detail {
                    Bundle::Leaf(arr) => {
                        level_bands.push(expect_shape(arr, &shapes[level + 1])?.clone())
                    }
                    Bundle::Node(_) => return Err(WaveletError::MalformedBundle),
                }
            }
            for axis in (0..self.dim).rev() {
                let target = shapes[level][axis];
                level_bands = level_bands
                    .chunks(2)
                    .map(|pair| self.merge_axis(&pair[0], &pair[1], axis, target))
                    .collect();
            }
            current = level_bands.pop().ok_or(WaveletError::MalformedBundle)?;
        }
        Ok(Image::new(current))
    }
}

fn expect_shape<'a, T>(arr: &'a ArrayD<T>, expected: &[usize]) -> Result<&'a ArrayD<T>, WaveletError> {
    if arr.shape() != expected {
        return Err(WaveletError::InvalidShape {
            expected: expected.to_vec(),
            found: arr.shape().to_vec(),
        });
    }
    Ok(arr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(shape: &[usize]) -> ArrayD<f64> {
        let n: usize = shape.iter().product();
        let values = (0..n).map(|i| ((i * 7919) % 97) as f64 * 0.1 - 3.0).collect();
        ArrayD::from_shape_vec(IxDyn(shape), values).unwrap()
    }

    fn config(nb_scale: usize, dim: usize) -> TransformConfig {
        TransformConfig { nb_scale, dim }
    }

    #[test]
    fn bundle_structure_2d() {
        let t = DecimatedTransform::<f64>::new(Family::Haar, &config(3, 2)).unwrap();
        let bundle = t.analyze(&Image::new(ramp(&[8, 8]))).unwrap();
        let layout = bundle.layout();
        let shapes = layout.leaves();
        assert_eq!(shapes.len(), 3 + 3 + 1);
        assert_eq!(shapes[0], &[4usize, 4][..]);
        assert_eq!(shapes[3], &[2usize, 2][..]);
        assert_eq!(shapes[6], &[2usize, 2][..]);
    }

    #[test]
    fn perfect_reconstruction_odd_3d() {
        let t = DecimatedTransform::<f64>::new(Family::Db2, &config(3, 3)).unwrap();
        let x = ramp(&[5, 6, 7]);
        let bundle = t.analyze(&Image::new(x.clone())).unwrap();
        let y = t.synthesize(&bundle, &[5, 6, 7]).unwrap();
        assert_eq!(y.shape(), &[5usize, 6, 7][..]);
        for (a, b) in x.iter().zip(y.data().iter()) {
            assert!((a - b).abs() < 1e-9, "{} vs {}", a, b);
        }
    }

    #[test]
    fn energy_preserved_for_even_sizes() {
        let t = DecimatedTransform::<f64>::new(Family::Sym4, &config(4, 2)).unwrap();
        let x = ramp(&[16, 16]);
        let bundle = t.analyze(&Image::new(x.clone())).unwrap();
        let e_in: f64 = x.iter().map(|v| v * v).sum();
        let e_out: f64 = bundle.leaves().iter().flat_map(|b| b.iter()).map(|v| v * v).sum();
        assert!((e_in - e_out).abs() < 1e-8 * e_in);
    }

    #[test]
    fn rejects_wrong_rank_and_malformed_bundle() {
        let t = DecimatedTransform::<f64>::new(Family::Haar, &config(2, 2)).unwrap();
        assert_eq!(
            t.analyze(&Image::new(ramp(&[4, 4, 4]))),
            Err(WaveletError::DimensionMismatch { expected: 2, found: 3 })
        );
        let bogus = Bundle::Leaf(ramp(&[4, 4]));
        assert_eq!(t.synthesize(&bogus, &[4, 4]), Err(WaveletError::MalformedBundle));
    }
}
