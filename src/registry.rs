//! Transform backends and the name → factory registry.
//!
//! A backend is anything implementing [`Transform`]: it analyzes an
//! [`Image`] into a coefficient [`Bundle`] and synthesizes it back. Built-in
//! backends are enumerated by [`TransformKind`]; [`TransformRegistry`] maps
//! names to factories so applications can add their own. Names are resolved
//! when an operator is constructed, never at call time.

use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;
use hashbrown::HashMap;

use crate::atrous::{AtrousTransform, Kernel};
use crate::codec::Bundle;
use crate::dwt::DecimatedTransform;
use crate::error::WaveletError;
use crate::filters::Family;
use crate::image::Image;
use crate::num::Float;

/// Default number of scales, approximation included.
pub const DEFAULT_NB_SCALE: usize = 4;
/// Default dimensionality of the data handed to a backend.
pub const DEFAULT_DIM: usize = 2;
/// Largest scale count whose dilation step `2^(nb_scale - 2)` still leaves
/// room for tap offsets in an `isize`.
pub const MAX_NB_SCALE: usize = usize::BITS as usize - 2;
/// Largest supported rank. A decimated level has `2^dim` bands.
pub const MAX_DIM: usize = 16;

/// Parameters every backend is constructed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransformConfig {
    pub nb_scale: usize,
    pub dim: usize,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            nb_scale: DEFAULT_NB_SCALE,
            dim: DEFAULT_DIM,
        }
    }
}

impl TransformConfig {
    pub fn new(nb_scale: usize, dim: usize) -> Self {
        Self { nb_scale, dim }
    }

    pub fn validate(&self) -> Result<(), WaveletError> {
        if self.nb_scale == 0 || self.nb_scale > MAX_NB_SCALE {
            return Err(WaveletError::InvalidScaleCount(self.nb_scale));
        }
        if self.dim == 0 {
            return Err(WaveletError::DimensionMismatch {
                expected: DEFAULT_DIM,
                found: 0,
            });
        }
        if self.dim > MAX_DIM {
            return Err(WaveletError::DimensionMismatch {
                expected: MAX_DIM,
                found: self.dim,
            });
        }
        Ok(())
    }
}

/// Analysis/synthesis capability of a wavelet backend.
pub trait Transform<T: Float>: Send + Sync {
    fn name(&self) -> &str;
    fn nb_scale(&self) -> usize;
    fn dim(&self) -> usize;
    /// Decompose `image` into a nested coefficient bundle.
    fn analyze(&self, image: &Image<T>) -> Result<Bundle<T>, WaveletError>;
    /// Rebuild an image of `shape` from a bundle produced by [`Transform::analyze`].
    fn synthesize(&self, bands: &Bundle<T>, shape: &[usize]) -> Result<Image<T>, WaveletError>;
}

/// Built-in backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    Haar,
    Db2,
    Db4,
    Sym4,
    Coif1,
    LinearAtrous,
    BsplineAtrous,
}

impl TransformKind {
    pub const ALL: [TransformKind; 7] = [
        TransformKind::Haar,
        TransformKind::Db2,
        TransformKind::Db4,
        TransformKind::Sym4,
        TransformKind::Coif1,
        TransformKind::LinearAtrous,
        TransformKind::BsplineAtrous,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TransformKind::Haar => "haar",
            TransformKind::Db2 => "db2",
            TransformKind::Db4 => "db4",
            TransformKind::Sym4 => "sym4",
            TransformKind::Coif1 => "coif1",
            TransformKind::LinearAtrous => "linear_atrous",
            TransformKind::BsplineAtrous => "bspline_atrous",
        }
    }

    /// Whether the backend subsamples (its synthesis is then the exact
    /// inverse and, for even sizes, the adjoint).
    pub fn is_decimated(self) -> bool {
        !matches!(self, TransformKind::LinearAtrous | TransformKind::BsplineAtrous)
    }

    pub fn build<T: Float>(
        self,
        config: &TransformConfig,
    ) -> Result<Box<dyn Transform<T>>, WaveletError> {
        Ok(match self {
            TransformKind::Haar => Box::new(DecimatedTransform::new(Family::Haar, config)?),
            TransformKind::Db2 => Box::new(DecimatedTransform::new(Family::Db2, config)?),
            TransformKind::Db4 => Box::new(DecimatedTransform::new(Family::Db4, config)?),
            TransformKind::Sym4 => Box::new(DecimatedTransform::new(Family::Sym4, config)?),
            TransformKind::Coif1 => Box::new(DecimatedTransform::new(Family::Coif1, config)?),
            TransformKind::LinearAtrous => Box::new(AtrousTransform::new(Kernel::Linear, config)?),
            TransformKind::BsplineAtrous => {
                Box::new(AtrousTransform::new(Kernel::B3Spline, config)?)
            }
        })
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TransformKind {
    type Err = WaveletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransformKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| WaveletError::UnknownTransform(s.to_owned()))
    }
}

impl From<Family> for TransformKind {
    fn from(family: Family) -> Self {
        match family {
            Family::Haar => TransformKind::Haar,
            Family::Db2 => TransformKind::Db2,
            Family::Db4 => TransformKind::Db4,
            Family::Sym4 => TransformKind::Sym4,
            Family::Coif1 => TransformKind::Coif1,
        }
    }
}

impl From<Kernel> for TransformKind {
    fn from(kernel: Kernel) -> Self {
        match kernel {
            Kernel::Linear => TransformKind::LinearAtrous,
            Kernel::B3Spline => TransformKind::BsplineAtrous,
        }
    }
}

/// Names of the built-in backends.
pub fn available_transforms() -> Vec<&'static str> {
    TransformKind::ALL.iter().map(|k| k.name()).collect()
}

/// Constructor stored in a [`TransformRegistry`].
pub type TransformFactory<T> = fn(&TransformConfig) -> Result<Box<dyn Transform<T>>, WaveletError>;

/// Name → factory mapping consulted when operators are constructed.
pub struct TransformRegistry<T: Float> {
    factories: HashMap<String, TransformFactory<T>>,
}

impl<T: Float> TransformRegistry<T> {
    /// Registry with no backends.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry pre-populated with every [`TransformKind`].
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("haar", |c| TransformKind::Haar.build(c));
        registry.register("db2", |c| TransformKind::Db2.build(c));
        registry.register("db4", |c| TransformKind::Db4.build(c));
        registry.register("sym4", |c| TransformKind::Sym4.build(c));
        registry.register("coif1", |c| TransformKind::Coif1.build(c));
        registry.register("linear_atrous", |c| TransformKind::LinearAtrous.build(c));
        registry.register("bspline_atrous", |c| TransformKind::BsplineAtrous.build(c));
        registry
    }

    /// Add or replace a backend, returning the factory it displaced.
    pub fn register(
        &mut self,
        name: &str,
        factory: TransformFactory<T>,
    ) -> Option<TransformFactory<T>> {
        self.factories.insert(name.to_owned(), factory)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Instantiate the backend registered under `name`.
    pub fn create(
        &self,
        name: &str,
        config: &TransformConfig,
    ) -> Result<Box<dyn Transform<T>>, WaveletError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| WaveletError::UnknownTransform(name.to_owned()))?;
        config.validate()?;
        factory(config)
    }
}

impl<T: Float> Default for TransformRegistry<T> {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl<T: Float> fmt::Debug for TransformRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("names", &self.names())
            .finish()
    }
}
