//! Undecimated wavelet operator driven by precomputed filters.
//!
//! The filter bank depends on the spatial shape, so the operator has two
//! phases. [`UndecimatedWavelet::prepare`] computes the filters for a shape
//! and returns a [`PreparedUndecimated`] whose `forward`/`adjoint` are pure.
//! The stateful [`LinearOperator`] view prepares itself from the first input
//! it sees and keeps those filters for the rest of its life; any later input
//! of a different spatial shape is rejected.
//!
//! Complex data is handled by convolving the real and imaginary parts
//! separately. In multichannel mode the leading axis indexes channels, each
//! transformed independently with the same filters.

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use ndarray::{ArrayD, ArrayViewD, Axis};

use crate::atrous::Kernel;
use crate::codec::{flatten, unflatten, Bundle, Layout};
use crate::convolve::{filter_convolve, FilterMode};
use crate::error::WaveletError;
use crate::image::{array_from_vec, even_shape, impulse, join_complex, split_complex};
use crate::mr_filters::{get_mr_filters, FilterOptions, MrFilters};
use crate::num::{Complex, Float};
use crate::operator::LinearOperator;
use crate::registry::MAX_NB_SCALE;

/// Output of [`PreparedUndecimated::forward`].
///
/// `values` has shape `[n_coeffs]`, or `[channels, n_coeffs]` in
/// multichannel mode; `layouts` holds one band layout per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct UndecimatedCoefficients<T: Float> {
    values: ArrayD<Complex<T>>,
    layouts: Vec<Layout>,
}

impl<T: Float> UndecimatedCoefficients<T> {
    pub fn values(&self) -> &ArrayD<Complex<T>> {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut ArrayD<Complex<T>> {
        &mut self.values
    }

    pub fn layouts(&self) -> &[Layout] {
        &self.layouts
    }

    pub fn into_parts(self) -> (ArrayD<Complex<T>>, Vec<Layout>) {
        (self.values, self.layouts)
    }
}

/// Operator with its filter bank computed for one spatial shape.
#[derive(Debug, Clone)]
pub struct PreparedUndecimated<T: Float> {
    filters: Arc<MrFilters<T>>,
    multichannel: bool,
}

impl<T: Float> PreparedUndecimated<T> {
    pub fn filters(&self) -> &Arc<MrFilters<T>> {
        &self.filters
    }

    pub fn spatial_shape(&self) -> &[usize] {
        self.filters.shape()
    }

    pub fn multichannel(&self) -> bool {
        self.multichannel
    }

    pub fn forward(
        &self,
        data: &ArrayD<Complex<T>>,
    ) -> Result<UndecimatedCoefficients<T>, WaveletError> {
        let spatial = spatial_shape(data, self.multichannel)?;
        if spatial != self.spatial_shape() {
            return Err(WaveletError::InvalidShape {
                expected: self.spatial_shape().to_vec(),
                found: spatial.to_vec(),
            });
        }
        if !self.multichannel {
            let (values, layout) = self.forward_channel(data.view())?;
            let n = values.len();
            return Ok(UndecimatedCoefficients {
                values: array_from_vec(&[n], values)?,
                layouts: vec![layout],
            });
        }
        let channels = data.shape()[0];
        let per_channel = map_channels(channels, |c| {
            self.forward_channel(data.index_axis(Axis(0), c))
        })?;
        let n = per_channel.first().map_or(0, |(values, _)| values.len());
        let mut flat = Vec::with_capacity(channels * n);
        let mut layouts = Vec::with_capacity(channels);
        for (values, layout) in per_channel {
            flat.extend(values);
            layouts.push(layout);
        }
        Ok(UndecimatedCoefficients {
            values: array_from_vec(&[channels, n], flat)?,
            layouts,
        })
    }

    pub fn adjoint(
        &self,
        coeffs: &UndecimatedCoefficients<T>,
    ) -> Result<ArrayD<Complex<T>>, WaveletError> {
        self.adjoint_with(&coeffs.values, &coeffs.layouts)
    }

    fn adjoint_with(
        &self,
        values: &ArrayD<Complex<T>>,
        layouts: &[Layout],
    ) -> Result<ArrayD<Complex<T>>, WaveletError> {
        let expected_ndim = if self.multichannel { 2 } else { 1 };
        if values.ndim() != expected_ndim {
            return Err(WaveletError::DimensionMismatch {
                expected: expected_ndim,
                found: values.ndim(),
            });
        }
        if !self.multichannel {
            let layout = match layouts {
                [layout] => layout,
                _ => {
                    return Err(WaveletError::ShapeMismatch {
                        expected: 1,
                        found: layouts.len(),
                    })
                }
            };
            let row: Vec<Complex<T>> = values.iter().copied().collect();
            return self.adjoint_channel(&row, layout);
        }
        let channels = values.shape()[0];
        if channels != layouts.len() {
            return Err(WaveletError::ShapeMismatch {
                expected: layouts.len(),
                found: channels,
            });
        }
        let images = map_channels(channels, |c| {
            let row: Vec<Complex<T>> = values.index_axis(Axis(0), c).iter().copied().collect();
            self.adjoint_channel(&row, &layouts[c])
        })?;
        let mut shape = Vec::with_capacity(self.spatial_shape().len() + 1);
        shape.push(channels);
        shape.extend_from_slice(self.spatial_shape());
        let mut flat = Vec::with_capacity(shape.iter().product());
        for image in &images {
            flat.extend(image.iter().copied());
        }
        array_from_vec(&shape, flat)
    }

    fn forward_channel(
        &self,
        channel: ArrayViewD<'_, Complex<T>>,
    ) -> Result<(Vec<Complex<T>>, Layout), WaveletError> {
        let (re, im) = split_complex(&channel.to_owned());
        let re_bands = filter_convolve(&re, &self.filters, FilterMode::Forward)?;
        let im_bands = filter_convolve(&im, &self.filters, FilterMode::Forward)?;
        let (re_values, layout) = flatten(&band_bundle(&re_bands));
        let (im_values, _) = flatten(&band_bundle(&im_bands));
        let values = re_values
            .into_iter()
            .zip(im_values)
            .map(|(r, i)| Complex::new(r, i))
            .collect();
        Ok((values, layout))
    }

    fn adjoint_channel(
        &self,
        values: &[Complex<T>],
        layout: &Layout,
    ) -> Result<ArrayD<Complex<T>>, WaveletError> {
        let re: Vec<T> = values.iter().map(|z| z.re).collect();
        let im: Vec<T> = values.iter().map(|z| z.im).collect();
        let re = self.stack_bands(&unflatten(&re, layout)?)?;
        let im = self.stack_bands(&unflatten(&im, layout)?)?;
        join_complex(
            &filter_convolve(&re, &self.filters, FilterMode::Rotated)?,
            &filter_convolve(&im, &self.filters, FilterMode::Rotated)?,
        )
    }

    /// `[bands, ..spatial]` array from a bundle of per-band leaves.
    fn stack_bands(&self, bundle: &Bundle<T>) -> Result<ArrayD<T>, WaveletError> {
        let spatial = self.spatial_shape();
        let leaves = bundle.leaves();
        let mut flat = Vec::with_capacity(leaves.len() * spatial.iter().product::<usize>());
        for leaf in &leaves {
            if leaf.shape() != spatial {
                return Err(WaveletError::InvalidShape {
                    expected: spatial.to_vec(),
                    found: leaf.shape().to_vec(),
                });
            }
            flat.extend(leaf.iter().copied());
        }
        let mut shape = Vec::with_capacity(spatial.len() + 1);
        shape.push(leaves.len());
        shape.extend_from_slice(spatial);
        array_from_vec(&shape, flat)
    }
}

fn band_bundle<T: Clone>(bands: &ArrayD<T>) -> Bundle<T> {
    Bundle::Node(
        bands
            .axis_iter(Axis(0))
            .map(|band| Bundle::Leaf(band.to_owned()))
            .collect(),
    )
}

fn spatial_shape<T>(data: &ArrayD<T>, multichannel: bool) -> Result<&[usize], WaveletError> {
    if !multichannel {
        return Ok(data.shape());
    }
    if data.ndim() < 2 {
        return Err(WaveletError::DimensionMismatch {
            expected: 2,
            found: data.ndim(),
        });
    }
    Ok(&data.shape()[1..])
}

/// Run `f` for every channel index, on the rayon pool when enabled and the
/// channel count reaches the configured threshold.
fn map_channels<R, F>(channels: usize, f: F) -> Result<Vec<R>, WaveletError>
where
    R: Send,
    F: Fn(usize) -> Result<R, WaveletError> + Send + Sync,
{
    #[cfg(feature = "parallel")]
    {
        if crate::parallel::should_parallelize(channels) {
            use rayon::prelude::*;
            return (0..channels).into_par_iter().map(f).collect();
        }
    }
    (0..channels).map(f).collect()
}

/// Stateful undecimated operator.
#[derive(Debug, Clone)]
pub struct UndecimatedWavelet<T: Float> {
    options: FilterOptions,
    multichannel: bool,
    prepared: Option<PreparedUndecimated<T>>,
    layouts: Vec<Layout>,
}

impl<T: Float> UndecimatedWavelet<T> {
    /// `wavelet_id` selects the à trous kernel (1 linear, 2 B3-spline).
    pub fn new(wavelet_id: u32, nb_scale: usize, multichannel: bool) -> Result<Self, WaveletError> {
        let kernel = Kernel::from_wavelet_id(wavelet_id)?;
        if nb_scale == 0 || nb_scale > MAX_NB_SCALE {
            return Err(WaveletError::InvalidScaleCount(nb_scale));
        }
        crate::vlog!(
            "undecimated operator: {:?} kernel, {} scales, multichannel={}",
            kernel,
            nb_scale,
            multichannel
        );
        Ok(Self {
            options: FilterOptions::new(wavelet_id, nb_scale),
            multichannel,
            prepared: None,
            layouts: Vec::new(),
        })
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn multichannel(&self) -> bool {
        self.multichannel
    }

    /// Compute the filters for `spatial_shape` without touching `self`.
    pub fn prepare(&self, spatial_shape: &[usize]) -> Result<PreparedUndecimated<T>, WaveletError> {
        let options = FilterOptions {
            coarse: true,
            ..self.options
        };
        Ok(PreparedUndecimated {
            filters: Arc::new(get_mr_filters(spatial_shape, &options)?),
            multichannel: self.multichannel,
        })
    }

    /// Filters frozen by the first `op`.
    pub fn filters(&self) -> Option<&Arc<MrFilters<T>>> {
        self.prepared.as_ref().map(PreparedUndecimated::filters)
    }

    pub fn prepared(&self) -> Option<&PreparedUndecimated<T>> {
        self.prepared.as_ref()
    }

    fn prepared_for(&mut self, spatial: &[usize]) -> Result<&PreparedUndecimated<T>, WaveletError> {
        let prepared = match self.prepared.take() {
            Some(prepared) => prepared,
            None => self.prepare(spatial)?,
        };
        let prepared = self.prepared.insert(prepared);
        if prepared.spatial_shape() != spatial {
            return Err(WaveletError::InvalidShape {
                expected: prepared.spatial_shape().to_vec(),
                found: spatial.to_vec(),
            });
        }
        Ok(&*prepared)
    }

    pub fn op(&mut self, data: &ArrayD<Complex<T>>) -> Result<ArrayD<Complex<T>>, WaveletError> {
        let spatial = spatial_shape(data, self.multichannel)?.to_vec();
        let coeffs = self.prepared_for(&spatial)?.forward(data)?;
        let (values, layouts) = coeffs.into_parts();
        crate::vlog!("undecimated op: {:?} -> {:?}", data.shape(), values.shape());
        self.layouts = layouts;
        Ok(values)
    }

    pub fn adj_op(&self, coeffs: &ArrayD<Complex<T>>) -> Result<ArrayD<Complex<T>>, WaveletError> {
        let prepared = self.prepared.as_ref().ok_or(WaveletError::NotReady)?;
        let image = prepared.adjoint_with(coeffs, &self.layouts)?;
        crate::vlog!("undecimated adj_op: {:?} -> {:?}", coeffs.shape(), image.shape());
        Ok(image)
    }
}

impl<T: Float> LinearOperator for UndecimatedWavelet<T> {
    type Domain = ArrayD<Complex<T>>;
    type Range = ArrayD<Complex<T>>;

    fn op(&mut self, data: &Self::Domain) -> Result<Self::Range, WaveletError> {
        UndecimatedWavelet::op(self, data)
    }

    fn adj_op(&self, coeffs: &Self::Range) -> Result<Self::Domain, WaveletError> {
        UndecimatedWavelet::adj_op(self, coeffs)
    }

    fn impulse(shape: &[usize]) -> Result<Self::Domain, WaveletError> {
        Ok(impulse::<T>(shape)?.mapv(Complex::from_real))
    }

    fn range_norm(coeffs: &Self::Range) -> f64 {
        libm::sqrt(coeffs.iter().map(|z| z.norm_sqr().to_f64()).sum())
    }

    /// Runs on filters prepared for the rounded shape without freezing them,
    /// so a later `op` on odd-sized data still succeeds.
    fn l2_norm(&mut self, shape: &[usize]) -> Result<f64, WaveletError> {
        let delta = Self::impulse(&even_shape(shape))?;
        let spatial = spatial_shape(&delta, self.multichannel)?;
        let coeffs = match &self.prepared {
            Some(prepared) if prepared.spatial_shape() == spatial => prepared.forward(&delta)?,
            _ => self.prepare(spatial)?.forward(&delta)?,
        };
        Ok(Self::range_norm(coeffs.values()))
    }
}
