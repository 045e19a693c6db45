//! Demonstrates enabling verbose logging for mrwave.
use mrwave::{Complex64, UndecimatedWavelet, Wavelet};
use ndarray::{ArrayD, IxDyn};

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .init();

    let image = ArrayD::from_shape_fn(IxDyn(&[16, 16]), |ix| (ix[0] ^ ix[1]) as f32);
    let mut w = Wavelet::<f32>::new("sym4", 3).unwrap();
    let coeffs = w.op(&image).unwrap();
    w.adj_op(&coeffs).unwrap();

    let mut u = UndecimatedWavelet::<f64>::new(1, 3, false).unwrap();
    let y = u.op(&image.mapv(|v| Complex64::new(v as f64, 0.0))).unwrap();
    u.adj_op(&y).unwrap();
}
