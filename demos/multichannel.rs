//! Undecimated operator on complex multichannel data (e.g. coil images).

use mrwave::{Complex64, LinearOperator, UndecimatedWavelet};
use ndarray::{ArrayD, Axis, IxDyn};

fn main() {
    let coils = 4;
    let n = 48;
    let data = ArrayD::from_shape_fn(IxDyn(&[coils, n, n]), |ix| {
        let phase = 0.1 * (ix[0] as f64 + 1.0) * ix[1] as f64;
        let r = ((ix[1] as f64 - 24.0).powi(2) + (ix[2] as f64 - 24.0).powi(2)).sqrt();
        let mag = if r < 16.0 { 1.0 } else { 0.0 };
        Complex64::new(mag * phase.cos(), mag * phase.sin())
    });

    let mut op = UndecimatedWavelet::<f64>::new(2, 4, true).unwrap();
    let coeffs = op.op(&data).unwrap();
    println!("input {:?} -> coefficients {:?}", data.shape(), coeffs.shape());

    let filters = op.filters().unwrap();
    println!(
        "{} filters on {:?}, fingerprint {:02x?}",
        filters.band_count(),
        filters.shape(),
        &filters.fingerprint()[..8]
    );
    for (i, band) in filters.bands().iter().enumerate() {
        println!("  band {}: {} taps, energy {:.4}", i, band.tap_count(), band.energy());
    }

    let back = op.adj_op(&coeffs).unwrap();
    for (c, channel) in back.axis_iter(Axis(0)).enumerate() {
        let energy: f64 = channel.iter().map(|z| z.norm_sqr()).sum();
        println!("  coil {}: adjoint energy {:.3}", c, energy);
    }
    println!("operator norm estimate: {:.4}", op.l2_norm(&[coils, n, n]).unwrap());
}
