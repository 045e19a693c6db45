//! Basic usage of the general wavelet operator.
//!
//! Decomposes a synthetic phantom, keeps the largest coefficients and
//! reconstructs, the way a sparsity-promoting solver would.

use mrwave::{available_transforms, LinearOperator, Wavelet};
use ndarray::{ArrayD, IxDyn};

fn phantom(n: usize) -> ArrayD<f64> {
    let c = n as f64 / 2.0;
    ArrayD::from_shape_fn(IxDyn(&[n, n]), |ix| {
        let (y, x) = (ix[0] as f64 - c, ix[1] as f64 - c);
        let outer = (x / (0.7 * c)).powi(2) + (y / (0.9 * c)).powi(2) <= 1.0;
        let inner = ((x - 0.2 * c) / (0.2 * c)).powi(2) + (y / (0.3 * c)).powi(2) <= 1.0;
        match (outer, inner) {
            (true, true) => 0.3,
            (true, false) => 1.0,
            _ => 0.0,
        }
    })
}

fn main() {
    println!("=== mrwave operator usage ===\n");
    println!("Backends: {:?}\n", available_transforms());

    let x = phantom(64);
    for name in ["haar", "db4", "bspline_atrous"] {
        let mut w = Wavelet::<f64>::new(name, 4).unwrap();
        let mut coeffs = w.op(&x).unwrap();

        // Hard-threshold everything below the 90th percentile in magnitude.
        let mut mags: Vec<f64> = coeffs.iter().map(|v| v.abs()).collect();
        mags.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let cut = mags[mags.len() * 9 / 10];
        coeffs.iter_mut().filter(|v| v.abs() < cut).for_each(|v| *v = 0.0);

        let y = w.adj_op(&coeffs).unwrap();
        let err: f64 = x.iter().zip(y.iter()).map(|(a, b)| (a - b).powi(2)).sum::<f64>().sqrt();
        let norm = w.l2_norm(&[64, 64]).unwrap();
        println!(
            "{:>16}: {:>6} coefficients, 10% kept, error {:.4}, impulse norm {:.4}",
            name,
            coeffs.len(),
            err,
            norm
        );
    }
}
