//! General wavelet operator over any registered backend.
//!
//! [`Wavelet::forward`] and [`Wavelet::adjoint`] are pure: the forward pass
//! returns a [`Coefficients`] value that carries its own layout, so an
//! adjoint can never be applied against the wrong structure. The stateful
//! [`LinearOperator`] view (`op`/`adj_op`) keeps the layout of the last
//! forward pass instead and is what iterative solvers drive.
//!
//! ```
//! use mrwave::wavelet::Wavelet;
//! use ndarray::{ArrayD, IxDyn};
//!
//! let mut w = Wavelet::<f64>::new("db2", 3).unwrap();
//! let x = ArrayD::from_shape_fn(IxDyn(&[16, 16]), |ix| (ix[0] * ix[1]) as f64);
//! let coeffs = w.op(&x).unwrap();
//! let back = w.adj_op(&coeffs).unwrap();
//! assert!((back[&[3, 5][..]] - 15.0).abs() < 1e-9);
//! ```

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use ndarray::ArrayD;

use crate::codec::{flatten, unflatten, Bundle, Layout};
use crate::error::WaveletError;
use crate::image::{impulse, Image};
use crate::num::Float;
use crate::operator::{LinearOperator, OutputMode, Reconstruction};
use crate::registry::{Transform, TransformConfig, TransformKind, TransformRegistry, DEFAULT_DIM};

/// Structure of one forward pass: the band layout plus the shape and voxel
/// spacing of the analysed image.
#[derive(Debug, Clone, PartialEq)]
pub struct CoeffLayout {
    bands: Layout,
    shape: Vec<usize>,
    spacing: Vec<f64>,
}

impl CoeffLayout {
    pub fn bands(&self) -> &Layout {
        &self.bands
    }

    /// Shape of the data that was analysed.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Spacing restored on the image returned by the adjoint.
    pub fn spacing(&self) -> &[f64] {
        &self.spacing
    }

    /// Number of flat coefficients.
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

/// Flat coefficients together with the layout that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficients<T> {
    values: Vec<T>,
    layout: CoeffLayout,
}

impl<T: Float> Coefficients<T> {
    /// Flatten a (possibly hand-edited) bundle for an image of `shape` with
    /// unit spacing.
    pub fn from_bundle(bundle: &Bundle<T>, shape: &[usize]) -> Self {
        Self::from_bundle_spaced(bundle, shape, vec![1.0; shape.len()])
    }

    fn from_bundle_spaced(bundle: &Bundle<T>, shape: &[usize], spacing: Vec<f64>) -> Self {
        let (values, bands) = flatten(bundle);
        Self {
            values,
            layout: CoeffLayout {
                bands,
                shape: shape.to_vec(),
                spacing,
            },
        }
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    pub fn layout(&self) -> &CoeffLayout {
        &self.layout
    }

    pub fn into_parts(self) -> (Vec<T>, CoeffLayout) {
        (self.values, self.layout)
    }

    /// Nested per-band view of the coefficients.
    pub fn bands(&self) -> Result<Bundle<T>, WaveletError> {
        unflatten(&self.values, &self.layout.bands)
    }
}

pub struct Wavelet<T: Float> {
    transform: Box<dyn Transform<T>>,
    cached: Option<CoeffLayout>,
}

impl<T: Float> Wavelet<T> {
    /// Operator on 2-D data using the built-in backend `name`.
    pub fn new(name: &str, nb_scale: usize) -> Result<Self, WaveletError> {
        Self::with_config(name, TransformConfig::new(nb_scale, DEFAULT_DIM))
    }

    pub fn with_config(name: &str, config: TransformConfig) -> Result<Self, WaveletError> {
        let kind: TransformKind = name.parse()?;
        config.validate()?;
        Ok(Self::from_transform(kind.build(&config)?))
    }

    /// Operator backed by whatever `registry` has under `name`.
    pub fn from_registry(
        registry: &TransformRegistry<T>,
        name: &str,
        config: TransformConfig,
    ) -> Result<Self, WaveletError> {
        Ok(Self::from_transform(registry.create(name, &config)?))
    }

    fn from_transform(transform: Box<dyn Transform<T>>) -> Self {
        crate::vlog!(
            "wavelet operator '{}' ({} scales, {}-d)",
            transform.name(),
            transform.nb_scale(),
            transform.dim()
        );
        Self {
            transform,
            cached: None,
        }
    }

    pub fn name(&self) -> &str {
        self.transform.name()
    }

    pub fn nb_scale(&self) -> usize {
        self.transform.nb_scale()
    }

    pub fn dim(&self) -> usize {
        self.transform.dim()
    }

    /// Layout recorded by the last `op`, if any.
    pub fn cached_layout(&self) -> Option<&CoeffLayout> {
        self.cached.as_ref()
    }

    pub fn forward(&self, data: impl Into<Image<T>>) -> Result<Coefficients<T>, WaveletError> {
        let image = data.into();
        let bundle = self.transform.analyze(&image)?;
        Ok(Coefficients::from_bundle_spaced(
            &bundle,
            image.shape(),
            image.spacing().to_vec(),
        ))
    }

    pub fn adjoint(&self, coeffs: &Coefficients<T>) -> Result<Image<T>, WaveletError> {
        let bundle = coeffs.bands()?;
        self.transform
            .synthesize(&bundle, coeffs.layout.shape())?
            .with_spacing(coeffs.layout.spacing.clone())
    }

    /// Analyse `data` and return the flat coefficients, remembering their
    /// layout for [`Wavelet::adj_op`].
    pub fn op(&mut self, data: impl Into<Image<T>>) -> Result<Vec<T>, WaveletError> {
        let (values, layout) = self.forward(data)?.into_parts();
        crate::vlog!(
            "{}: op on {:?} -> {} coefficients",
            self.transform.name(),
            layout.shape(),
            values.len()
        );
        self.cached = Some(layout);
        Ok(values)
    }

    pub fn adj_op(&self, coeffs: &[T]) -> Result<ArrayD<T>, WaveletError> {
        Ok(self.adj_op_as(coeffs, OutputMode::Array)?.into_array())
    }

    /// [`Wavelet::adj_op`] returning either a bare array or an [`Image`].
    pub fn adj_op_as(
        &self,
        coeffs: &[T],
        mode: OutputMode,
    ) -> Result<Reconstruction<T>, WaveletError> {
        let layout = self.cached.as_ref().ok_or(WaveletError::StaleState)?;
        let bundle = unflatten(coeffs, &layout.bands)?;
        let image = self
            .transform
            .synthesize(&bundle, &layout.shape)?
            .with_spacing(layout.spacing.clone())?;
        crate::vlog!(
            "{}: adj_op {} coefficients -> {:?}",
            self.transform.name(),
            coeffs.len(),
            image.shape()
        );
        Ok(match mode {
            OutputMode::Array => Reconstruction::Array(image.into_data()),
            OutputMode::Image => Reconstruction::Image(image),
        })
    }
}

impl<T: Float> fmt::Debug for Wavelet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wavelet")
            .field("name", &self.name())
            .field("nb_scale", &self.nb_scale())
            .field("dim", &self.dim())
            .field("cached", &self.cached)
            .finish()
    }
}

impl<T: Float> LinearOperator for Wavelet<T> {
    type Domain = ArrayD<T>;
    type Range = Vec<T>;

    fn op(&mut self, data: &ArrayD<T>) -> Result<Vec<T>, WaveletError> {
        Wavelet::op(self, data)
    }

    fn adj_op(&self, coeffs: &Vec<T>) -> Result<ArrayD<T>, WaveletError> {
        Wavelet::adj_op(self, coeffs)
    }

    fn impulse(shape: &[usize]) -> Result<ArrayD<T>, WaveletError> {
        impulse(shape)
    }

    fn range_norm(coeffs: &Vec<T>) -> f64 {
        libm::sqrt(coeffs.iter().map(|v| v.to_f64() * v.to_f64()).sum())
    }
}
