//! # mrwave - wavelet sparsifying operators for MRI reconstruction
//!
//! Forward/adjoint operator pairs over wavelet decompositions, meant to be
//! plugged into compressed-sensing solvers as the sparsity transform.
//!
//! ## Operators
//!
//! - [`Wavelet`]: N-dimensional wavelet transform whose backend is picked by
//!   name from a [`TransformRegistry`] (periodized orthogonal DWT families and
//!   à trous starlets are built in).
//! - [`UndecimatedWavelet`]: undecimated transform expressed as convolution
//!   with precomputed filters, for complex and multichannel data. Its
//!   `adj_op` is the exact adjoint of `op`.
//!
//! Both implement [`LinearOperator`] (`op`, `adj_op`, `l2_norm`) and also
//! expose a pure API ([`Wavelet::forward`], [`PreparedUndecimated::forward`])
//! where the coefficient layout travels with the coefficients.
//!
//! ## Cargo Features
//!
//! - `std` (default): `std::error::Error` for [`WaveletError`]
//! - `parallel`: fan multichannel work out with Rayon
//! - `verbose-logging`: debug records through the `log` facade
//!
//! ## Examples
//!
//! ```bash
//! cargo run --example operator_usage
//! cargo run --example multichannel
//! cargo run --example verbose_logging --features verbose-logging
//! ```
//!
//! ## License
//!
//! Licensed under either of
//! - Apache License, Version 2.0
//! - MIT license
//!
//! at your option.

#![no_std]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

/// Debug record through `log` when `verbose-logging` is enabled; otherwise
/// the arguments are type-checked and discarded.
macro_rules! vlog {
    ($($arg:tt)*) => {{
        #[cfg(feature = "verbose-logging")]
        {
            log::debug!($($arg)*);
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            if false {
                core::mem::drop(core::format_args!($($arg)*));
            }
        }
    }};
}
pub(crate) use vlog;

/// Float trait and complex numbers
pub mod num;

/// Error type shared by every operation
pub mod error;

/// Image wrapper and array helpers
pub mod image;

/// Coefficient bundles and the flatten/unflatten codec
pub mod codec;

/// Orthonormal filter banks
pub mod filters;

/// Decimated N-d DWT backend
pub mod dwt;

/// À trous (starlet) backend
pub mod atrous;

/// Backend trait and name registry
pub mod registry;

/// Undecimated filter generation
pub mod mr_filters;

/// N-d convolution with filter banks
pub mod convolve;

pub mod operator;

/// General wavelet operator
pub mod wavelet;

/// Undecimated wavelet operator
pub mod undecimated;

pub mod parallel;

pub use codec::{flatten, unflatten, Bundle, Layout};
pub use convolve::{filter_convolve, FilterMode};
pub use error::WaveletError;
pub use image::Image;
pub use mr_filters::{get_mr_filters, FilterOptions, MrFilters};
pub use num::{Complex, Complex32, Complex64, Float};
pub use operator::{LinearOperator, OutputMode, Reconstruction};
pub use registry::{available_transforms, Transform, TransformConfig, TransformKind, TransformRegistry};
pub use undecimated::{PreparedUndecimated, UndecimatedCoefficients, UndecimatedWavelet};
pub use wavelet::{CoeffLayout, Coefficients, Wavelet};
