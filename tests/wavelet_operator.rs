// Test intent: the general operator reconstructs exactly, is adjoint to
// itself for orthogonal backends, and enforces its op-before-adj_op contract.
use mrwave::{
    available_transforms, Coefficients, LinearOperator, OutputMode, Reconstruction, Transform,
    TransformConfig, TransformKind, TransformRegistry, Wavelet, WaveletError,
};
use ndarray::{ArrayD, IxDyn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_array(shape: &[usize], seed: u64) -> ArrayD<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    ArrayD::from_shape_simple_fn(IxDyn(shape), || rng.gen_range(-1.0..1.0))
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
/// Every built-in backend reconstructs even and odd 2-D shapes.
fn perfect_reconstruction_all_backends() {
    for name in available_transforms() {
        for shape in [[16usize, 16], [15, 9]] {
            let mut w = Wavelet::<f64>::new(name, 3).unwrap();
            let x = random_array(&shape, 7);
            let coeffs = w.op(&x).unwrap();
            let y = w.adj_op(&coeffs).unwrap();
            assert_eq!(y.shape(), &shape[..]);
            for (a, b) in x.iter().zip(y.iter()) {
                assert!((a - b).abs() < 1e-9, "{} {:?}: {} vs {}", name, shape, a, b);
            }
        }
    }
}

#[test]
/// 3-D data through a configured dimensionality.
fn three_dimensional_roundtrip() {
    let mut w = Wavelet::<f32>::with_config("db2", TransformConfig::new(2, 3)).unwrap();
    let x = random_array(&[8, 6, 5], 3).mapv(|v| v as f32);
    let c = w.op(&x).unwrap();
    let y = w.adj_op(&c).unwrap();
    for (a, b) in x.iter().zip(y.iter()) {
        assert!((a - b).abs() < 1e-4);
    }
}

#[test]
/// `<Wx, c> == <x, W*c>` for orthogonal backends on power-of-two shapes.
fn decimated_adjoint_identity() {
    for name in ["haar", "db2", "db4", "sym4", "coif1"] {
        let mut w = Wavelet::<f64>::new(name, 3).unwrap();
        let x = random_array(&[32, 32], 11);
        let wx = w.op(&x).unwrap();
        let c: Vec<f64> = random_array(&[wx.len()], 12).iter().copied().collect();
        let wtc = w.adj_op(&c).unwrap();
        let lhs = dot(&wx, &c);
        let rhs = dot(x.as_slice().unwrap(), wtc.as_slice().unwrap());
        assert!((lhs - rhs).abs() < 1e-9 * lhs.abs().max(1.0), "{}: {} vs {}", name, lhs, rhs);
    }
}

#[test]
/// Two operators built from the same arguments behave identically.
fn construction_is_idempotent() {
    let x = random_array(&[12, 12], 5);
    let mut a = Wavelet::<f64>::new("bspline_atrous", 4).unwrap();
    let mut b = Wavelet::<f64>::new("bspline_atrous", 4).unwrap();
    assert_eq!(a.op(&x).unwrap(), b.op(&x).unwrap());
    assert_eq!(a.cached_layout(), b.cached_layout());
}

#[test]
fn adj_op_before_op_is_stale_state() {
    let w = Wavelet::<f64>::new("db4", 3).unwrap();
    assert_eq!(w.adj_op(&[1.0, 2.0]), Err(WaveletError::StaleState));
    assert!(matches!(
        w.adj_op_as(&[], OutputMode::Image),
        Err(WaveletError::StaleState)
    ));
}

#[test]
fn unknown_backend_rejected_at_construction() {
    let err = Wavelet::<f64>::new("mallat_9_7", 3).unwrap_err();
    assert_eq!(err, WaveletError::UnknownTransform("mallat_9_7".into()));
    assert_eq!(err.to_string(), "unknown transformation 'mallat_9_7'");
}

#[test]
/// Impulse norms are finite and non-negative, even for odd shapes.
fn l2_norm_is_finite() {
    for name in ["haar", "sym4", "linear_atrous"] {
        let mut w = Wavelet::<f64>::new(name, 3).unwrap();
        for shape in [[64usize, 64], [17, 31]] {
            let norm = w.l2_norm(&shape).unwrap();
            assert!(norm.is_finite() && norm >= 0.0, "{} {:?}: {}", name, shape, norm);
        }
        // The impulse is rounded up to even sizes and refreshes the layout.
        assert_eq!(w.cached_layout().unwrap().shape(), &[18usize, 32][..]);
    }
    // Orthonormal transforms preserve the unit impulse energy.
    let mut haar = Wavelet::<f64>::new("haar", 4).unwrap();
    assert!((haar.l2_norm(&[32, 32]).unwrap() - 1.0).abs() < 1e-12);
}

#[test]
/// The session API never consults cached state.
fn explicit_session_roundtrip() {
    let w = Wavelet::<f64>::new("coif1", 3).unwrap();
    let x = random_array(&[20, 14], 21);
    let coeffs = w.forward(x.clone()).unwrap();
    assert!(w.cached_layout().is_none());
    assert_eq!(coeffs.layout().shape(), &[20usize, 14][..]);
    let image = w.adjoint(&coeffs).unwrap();
    for (a, b) in x.iter().zip(image.data().iter()) {
        assert!((a - b).abs() < 1e-9);
    }
    let rebuilt = Coefficients::from_bundle(&coeffs.bands().unwrap(), &[20, 14]);
    assert_eq!(rebuilt, coeffs);
}

#[test]
fn adj_op_as_image_keeps_shape() {
    let mut w = Wavelet::<f64>::new("haar", 2).unwrap();
    let c = w.op(&random_array(&[6, 6], 1)).unwrap();
    match w.adj_op_as(&c, OutputMode::Image).unwrap() {
        Reconstruction::Image(image) => assert_eq!(image.shape(), &[6usize, 6][..]),
        Reconstruction::Array(_) => panic!("expected an image"),
    }
}

#[test]
/// Custom backends are resolved through the registry.
fn registry_backed_operator() {
    fn doubled_scales(c: &TransformConfig) -> Result<Box<dyn Transform<f64>>, WaveletError> {
        TransformKind::Db2.build(&TransformConfig::new(c.nb_scale * 2, c.dim))
    }
    let mut registry = TransformRegistry::<f64>::with_builtins();
    registry.register("db2_deep", doubled_scales);
    let w = Wavelet::from_registry(&registry, "db2_deep", TransformConfig::new(2, 2)).unwrap();
    assert_eq!(w.nb_scale(), 4);
    assert_eq!(w.name(), "db2");
    assert!(matches!(
        Wavelet::from_registry(&registry, "nope", TransformConfig::default()),
        Err(WaveletError::UnknownTransform(_))
    ));
}
