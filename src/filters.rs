//! Orthonormal two-channel filter banks and periodized 1-D analysis/synthesis.
//!
//! Each [`Family`] is tabulated by its scaling (low-pass) filter `h`; the
//! high-pass filter is the quadrature mirror `g[k] = (-1)^k h[L-1-k]`.
//! Signals are periodized, which keeps the single-level transform orthogonal
//! for any even length. Odd lengths are extended by repeating the last sample
//! before analysis and truncated again after synthesis.

use alloc::vec;
use alloc::vec::Vec;

use crate::num::Float;

const FRAC_1_SQRT_2: f64 = core::f64::consts::FRAC_1_SQRT_2;

const HAAR: [f64; 2] = [FRAC_1_SQRT_2, FRAC_1_SQRT_2];

const DB2: [f64; 4] = [
    0.4829629131445341,
    0.8365163037378079,
    0.2241438680420134,
    -0.1294095225512604,
];

const DB4: [f64; 8] = [
    0.2303778133088965,
    0.7148465705529157,
    0.6308807679298589,
    -0.027983769416859854,
    -0.18703481171909309,
    0.030841381835560764,
    0.0328830116668852,
    -0.010597401785069032,
];

const SYM4: [f64; 8] = [
    -0.07576571478927333,
    -0.02963552764599851,
    0.49761866763201545,
    0.8037387518059161,
    0.29785779560527736,
    -0.09921954357684722,
    -0.012603967262037833,
    0.0322231006040427,
];

const COIF1: [f64; 6] = [
    -0.015655728135791993,
    -0.07273261951252645,
    0.3848648468648578,
    0.8525720202116004,
    0.3378976624574818,
    -0.07273261951252645,
];

/// Orthonormal wavelet families available to the decimated backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Haar,
    Db2,
    Db4,
    Sym4,
    Coif1,
}

impl Family {
    pub fn scaling_filter(self) -> &'static [f64] {
        match self {
            Family::Haar => &HAAR,
            Family::Db2 => &DB2,
            Family::Db4 => &DB4,
            Family::Sym4 => &SYM4,
            Family::Coif1 => &COIF1,
        }
    }

    pub fn filter_bank<T: Float>(self) -> FilterBank<T> {
        FilterBank::from_scaling(self.scaling_filter())
    }
}

/// Low/high-pass analysis filters. Synthesis uses the same taps transposed.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterBank<T> {
    lo: Vec<T>,
    hi: Vec<T>,
}

impl<T: Float> FilterBank<T> {
    /// Build the quadrature mirror pair from an orthonormal scaling filter.
    pub fn from_scaling(h: &[f64]) -> Self {
        let len = h.len();
        let lo = h.iter().map(|&v| T::from_f64(v)).collect();
        let hi = (0..len)
            .map(|k| {
                let v = h[len - 1 - k];
                T::from_f64(if k % 2 == 0 { v } else { -v })
            })
            .collect();
        Self { lo, hi }
    }

    pub fn lo(&self) -> &[T] {
        &self.lo
    }

    pub fn hi(&self) -> &[T] {
        &self.hi
    }

    /// Length of each half after one analysis step on `n` samples.
    pub fn half_len(n: usize) -> usize {
        (n + 1) / 2
    }

    /// Single-level analysis into `(approx, detail)` halves.
    pub fn analyze(&self, input: &[T]) -> (Vec<T>, Vec<T>) {
        let n = input.len();
        let half = Self::half_len(n);
        let period = 2 * half;
        let sample = |idx: usize| -> T {
            let i = idx % period;
            if i < n {
                input[i]
            } else {
                input[n - 1]
            }
        };
        let mut approx = vec![T::zero(); half];
        let mut detail = vec![T::zero(); half];
        for i in 0..half {
            let j = 2 * i;
            let mut a = T::zero();
            let mut d = T::zero();
            for (k, (&h, &g)) in self.lo.iter().zip(self.hi.iter()).enumerate() {
                let v = sample(j + k);
                a = h.mul_add(v, a);
                d = g.mul_add(v, d);
            }
            approx[i] = a;
            detail[i] = d;
        }
        (approx, detail)
    }

    /// Single-level synthesis back to `n` samples.
    pub fn synthesize(&self, approx: &[T], detail: &[T], n: usize) -> Vec<T> {
        let half = approx.len();
        let period = 2 * half;
        let mut output = vec![T::zero(); period];
        for i in 0..half {
            let j = 2 * i;
            for (k, (&h, &g)) in self.lo.iter().zip(self.hi.iter()).enumerate() {
                let idx = (j + k) % period;
                output[idx] = output[idx] + h * approx[i] + g * detail[i];
            }
        }
        output.truncate(n);
        output
    }
}
