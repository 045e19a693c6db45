use clap::Parser;
use mrwave::{
    available_transforms, Complex64, LinearOperator, UndecimatedWavelet, Wavelet, WaveletError,
};
use ndarray::{ArrayD, Axis};
use sanity_check::{coil_phantom, mosaic, relative_error, save_png, shepp_logan, ColorMap, PngDepth};
use std::error::Error;
use std::path::PathBuf;

/// Run every wavelet operator on a Shepp-Logan phantom and report
/// reconstruction errors, adjoint mismatches and impulse norms.
#[derive(Parser)]
struct Args {
    /// Phantom height
    #[arg(long, default_value_t = 128)]
    rows: usize,

    /// Phantom width
    #[arg(long, default_value_t = 128)]
    cols: usize,

    /// Number of scales, coarse approximation included
    #[arg(long, default_value_t = 4)]
    nb_scale: usize,

    /// Backends to check (all built-ins when omitted)
    #[arg(long)]
    backend: Vec<String>,

    /// Undecimated kernel id (1 linear, 2 B3-spline)
    #[arg(long, default_value_t = 2)]
    wavelet_id: u32,

    /// Channels for the undecimated check
    #[arg(long, default_value_t = 4)]
    channels: usize,

    /// Largest tolerated relative reconstruction error
    #[arg(long, default_value_t = 1e-9)]
    tolerance: f64,

    /// Save the undecimated bands of the first channel as a PNG
    #[arg(long)]
    output: Option<PathBuf>,

    /// Color map for the output PNG
    #[arg(long, value_enum, default_value_t = ColorMap::Inferno)]
    colormap: ColorMap,

    /// Bit depth for the output PNG
    #[arg(long, value_enum, default_value_t = PngDepth::Eight)]
    png_depth: PngDepth,
}

fn check_backend(name: &str, x: &ArrayD<f64>, args: &Args) -> Result<bool, WaveletError> {
    let mut w = Wavelet::<f64>::new(name, args.nb_scale)?;
    let coeffs = w.op(x)?;
    let y = w.adj_op(&coeffs)?;
    let err = relative_error(x, &y);
    let norm = w.l2_norm(&[args.rows, args.cols])?;
    let ok = err <= args.tolerance;
    println!(
        "{:>16}: {:>8} coeffs  rel. error {:.3e}  impulse norm {:.4}  {}",
        name,
        coeffs.len(),
        err,
        norm,
        if ok { "ok" } else { "FAIL" }
    );
    Ok(ok)
}

fn dot(a: &ArrayD<Complex64>, b: &ArrayD<Complex64>) -> f64 {
    a.iter().zip(b.iter()).map(|(p, q)| p.re * q.re + p.im * q.im).sum()
}

fn check_undecimated(args: &Args) -> Result<bool, Box<dyn Error>> {
    let data = coil_phantom(args.channels, args.rows, args.cols);
    let mut op = UndecimatedWavelet::<f64>::new(args.wavelet_id, args.nb_scale, true)?;
    let ax = op.op(&data)?;
    // <Ax, Ax> == <x, A*Ax> for an exact adjoint.
    let atax = op.adj_op(&ax)?;
    let (lhs, rhs) = (dot(&ax, &ax), dot(&data, &atax));
    let mismatch = (lhs - rhs).abs() / lhs.abs().max(f64::EPSILON);
    let ok = mismatch <= args.tolerance;
    let filters = op.filters().ok_or(WaveletError::NotReady)?;
    println!(
        "{:>16}: {:?} -> {:?}  {} filters  adjoint mismatch {:.3e}  {}",
        format!("undecimated({})", args.wavelet_id),
        data.shape(),
        ax.shape(),
        filters.band_count(),
        mismatch,
        if ok { "ok" } else { "FAIL" }
    );

    if let Some(path) = &args.output {
        let per_band = args.rows * args.cols;
        let first = ax.index_axis(Axis(0), 0);
        let bands = first
            .as_slice()
            .ok_or("coefficients are not contiguous")?
            .chunks(per_band)
            .map(|band| {
                ArrayD::from_shape_vec(vec![args.rows, args.cols], band.iter().map(|z| z.norm()).collect())
            })
            .collect::<Result<Vec<_>, _>>()?;
        save_png(&mosaic(&bands)?, path, args.colormap, args.png_depth)?;
        println!("saved {} bands to {}", bands.len(), path.display());
    }
    Ok(ok)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let x = shepp_logan(args.rows, args.cols);
    let names: Vec<String> = if args.backend.is_empty() {
        available_transforms().into_iter().map(String::from).collect()
    } else {
        args.backend.clone()
    };

    let mut ok = true;
    for name in &names {
        ok &= check_backend(name, &x, &args)?;
    }
    ok &= check_undecimated(&args)?;

    if !ok {
        return Err("sanity check failed".into());
    }
    Ok(())
}
