//! Error taxonomy shared by the codec, the backends and the operators.
//!
//! Every variant is a caller contract violation: nothing here is transient,
//! so nothing is retried and nothing is logged before being returned.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaveletError {
    /// The requested backend name is not present in the registry.
    UnknownTransform(String),
    /// The undecimated wavelet id has no à trous kernel.
    UnknownWaveletId(u32),
    /// `adj_op` was called on a general operator before any `op`.
    StaleState,
    /// `adj_op` was called on an undecimated operator whose filters were
    /// never computed.
    NotReady,
    /// A flat coefficient vector does not match its layout.
    ShapeMismatch { expected: usize, found: usize },
    /// An array shape does not match the shape the operator was prepared for.
    InvalidShape { expected: Vec<usize>, found: Vec<usize> },
    /// Input rank differs from the configured dimensionality.
    DimensionMismatch { expected: usize, found: usize },
    /// Scale counts must be at least one.
    InvalidScaleCount(usize),
    /// Input has no samples (or a zero-length axis).
    EmptyInput,
    /// A coefficient bundle does not have the nesting a backend produces.
    MalformedBundle,
}

impl fmt::Display for WaveletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaveletError::UnknownTransform(name) => {
                write!(f, "unknown transformation '{}'", name)
            }
            WaveletError::UnknownWaveletId(id) => write!(f, "unknown wavelet id {}", id),
            WaveletError::StaleState => {
                write!(f, "`op` must be run before `adj_op` to record the coefficient layout")
            }
            WaveletError::NotReady => {
                write!(f, "`op` must be run before `adj_op` to get the data shape")
            }
            WaveletError::ShapeMismatch { expected, found } => write!(
                f,
                "coefficient vector has {} values but the layout describes {}",
                found, expected
            ),
            WaveletError::InvalidShape { expected, found } => {
                write!(f, "expected shape {:?}, got {:?}", expected, found)
            }
            WaveletError::DimensionMismatch { expected, found } => {
                write!(f, "expected {}-dimensional data, got {} dimensions", expected, found)
            }
            WaveletError::InvalidScaleCount(n) => {
                write!(f, "number of scales must be at least 1, got {}", n)
            }
            WaveletError::EmptyInput => write!(f, "input is empty"),
            WaveletError::MalformedBundle => {
                write!(f, "coefficient bundle does not match the transform structure")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for WaveletError {}
