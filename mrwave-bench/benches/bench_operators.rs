use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use mrwave::{Complex32, UndecimatedWavelet, Wavelet};
use ndarray::{ArrayD, IxDyn};

fn image(n: usize) -> ArrayD<f32> {
    ArrayD::from_shape_fn(IxDyn(&[n, n]), |ix| ((ix[0] * 31 + ix[1] * 17) % 97) as f32)
}

fn bench_wavelet(c: &mut Criterion) {
    let mut group = c.benchmark_group("wavelet");
    for name in ["haar", "db4", "bspline_atrous"] {
        for n in [64usize, 256] {
            let x = image(n);
            let mut w = Wavelet::<f32>::new(name, 4).unwrap();
            let coeffs = w.op(&x).unwrap();
            group.bench_with_input(BenchmarkId::new(format!("{name}/op"), n), &x, |b, x| {
                b.iter(|| w.op(x).unwrap());
            });
            group.bench_with_input(BenchmarkId::new(format!("{name}/adj_op"), n), &coeffs, |b, c| {
                b.iter(|| w.adj_op(c).unwrap());
            });
        }
    }
    group.finish();
}

fn bench_undecimated(c: &mut Criterion) {
    let mut group = c.benchmark_group("undecimated");
    group.sample_size(20);
    for channels in [1usize, 8] {
        let n = 128;
        let data = ArrayD::from_shape_fn(IxDyn(&[channels, n, n]), |ix| {
            Complex32::new(ix[1] as f32, ix[2] as f32)
        });
        let mut op = UndecimatedWavelet::<f32>::new(2, 4, true).unwrap();
        let coeffs = op.op(&data).unwrap();
        group.bench_with_input(BenchmarkId::new("op", channels), &data, |b, d| {
            b.iter(|| op.op(d).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("adj_op", channels), &coeffs, |b, c| {
            b.iter(|| op.adj_op(c).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_wavelet, bench_undecimated);
criterion_main!(benches);
