use clap::ValueEnum;
use image::{
    codecs::png::{CompressionType, FilterType, PngEncoder},
    ColorType, ImageEncoder,
};
use mrwave::Complex64;
use ndarray::{concatenate, Array2, ArrayD, Axis, Ix2, IxDyn};
use std::error::Error;
use std::fs::File;
use std::path::Path;

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum PngDepth {
    Eight,
    Sixteen,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ColorMap {
    Gray,
    Viridis,
    Inferno,
}

/// Modified Shepp-Logan ellipses: intensity, semi-axes, centre, rotation (degrees).
const SHEPP_LOGAN: [[f64; 6]; 10] = [
    [1.0, 0.69, 0.92, 0.0, 0.0, 0.0],
    [-0.8, 0.6624, 0.874, 0.0, -0.0184, 0.0],
    [-0.2, 0.11, 0.31, 0.22, 0.0, -18.0],
    [-0.2, 0.16, 0.41, -0.22, 0.0, 18.0],
    [0.1, 0.21, 0.25, 0.0, 0.35, 0.0],
    [0.1, 0.046, 0.046, 0.0, 0.1, 0.0],
    [0.1, 0.046, 0.046, 0.0, -0.1, 0.0],
    [0.1, 0.046, 0.023, -0.08, -0.605, 0.0],
    [0.1, 0.023, 0.023, 0.0, -0.606, 0.0],
    [0.1, 0.023, 0.046, 0.06, -0.605, 0.0],
];

/// `rows x cols` Shepp-Logan phantom on `[-1, 1]^2`.
pub fn shepp_logan(rows: usize, cols: usize) -> ArrayD<f64> {
    ArrayD::from_shape_fn(IxDyn(&[rows, cols]), |ix| {
        let y = 1.0 - 2.0 * (ix[0] as f64 + 0.5) / rows as f64;
        let x = 2.0 * (ix[1] as f64 + 0.5) / cols as f64 - 1.0;
        SHEPP_LOGAN
            .iter()
            .filter(|e| {
                let (sin, cos) = e[5].to_radians().sin_cos();
                let (dx, dy) = (x - e[3], y - e[4]);
                let u = dx * cos + dy * sin;
                let v = -dx * sin + dy * cos;
                (u / e[1]).powi(2) + (v / e[2]).powi(2) <= 1.0
            })
            .map(|e| e[0])
            .sum()
    })
}

/// Stack of `channels` phantoms, each with its own linear phase ramp.
pub fn coil_phantom(channels: usize, rows: usize, cols: usize) -> ArrayD<Complex64> {
    let base = shepp_logan(rows, cols);
    ArrayD::from_shape_fn(IxDyn(&[channels, rows, cols]), |ix| {
        let phase = 0.05 * (ix[0] as f64 + 1.0) * (ix[1] + ix[2]) as f64;
        let m = base[&[ix[1], ix[2]][..]];
        Complex64::new(m * phase.cos(), m * phase.sin())
    })
}

/// `||a - b|| / max(||a||, eps)`.
pub fn relative_error(a: &ArrayD<f64>, b: &ArrayD<f64>) -> f64 {
    let diff: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum();
    let norm: f64 = a.iter().map(|x| x * x).sum();
    (diff / norm.max(f64::EPSILON)).sqrt()
}

/// Place equally tall 2-D bands side by side.
pub fn mosaic(bands: &[ArrayD<f64>]) -> Result<Array2<f64>, Box<dyn Error>> {
    let views = bands
        .iter()
        .map(|b| b.view().into_dimensionality::<Ix2>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(concatenate(Axis(1), &views)?)
}

fn map_color(t: f64, cmap: ColorMap) -> [u16; 3] {
    let c = match cmap {
        ColorMap::Gray => {
            let g = (t * 65535.0).round() as u16;
            return [g, g, g];
        }
        ColorMap::Viridis => colorous::VIRIDIS.eval_continuous(t),
        ColorMap::Inferno => colorous::INFERNO.eval_continuous(t),
    };
    [
        u16::from(c.r) * 257,
        u16::from(c.g) * 257,
        u16::from(c.b) * 257,
    ]
}

/// Write `|values|` as a PNG, the largest magnitude mapped to the top of
/// `cmap`. Rows of `values` become image rows.
pub fn save_png(
    values: &Array2<f64>,
    path: &Path,
    cmap: ColorMap,
    depth: PngDepth,
) -> Result<(), Box<dyn Error>> {
    let (rows, cols) = values.dim();
    let (w, h) = (u32::try_from(cols)?, u32::try_from(rows)?);
    let max = values.iter().fold(0.0f64, |m, v| m.max(v.abs())).max(f64::EPSILON);
    let pixels = values
        .iter()
        .flat_map(|v| map_color((v.abs() / max).clamp(0.0, 1.0), cmap));
    let (raw, color): (Vec<u8>, _) = match depth {
        PngDepth::Eight => (pixels.map(|c| (c >> 8) as u8).collect(), ColorType::Rgb8),
        PngDepth::Sixteen => (pixels.flat_map(u16::to_ne_bytes).collect(), ColorType::Rgb16),
    };
    let encoder = PngEncoder::new_with_quality(
        File::create(path)?,
        CompressionType::Best,
        FilterType::Adaptive,
    );
    encoder.write_image(&raw, w, h, color)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::PngDecoder;
    use image::ImageDecoder;
    use std::fs;

    #[test]
    fn phantom_has_expected_levels() {
        let p = shepp_logan(64, 64);
        assert_eq!(p[&[0, 0][..]], 0.0);
        // Centre lies inside the skull and the brain ellipse only.
        assert!((p[&[32, 32][..]] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn mosaic_concatenates_columns() {
        let a = ArrayD::from_elem(IxDyn(&[4, 3]), 1.0);
        let b = ArrayD::from_elem(IxDyn(&[4, 5]), 2.0);
        let m = mosaic(&[a, b]).unwrap();
        assert_eq!(m.dim(), (4, 8));
        assert_eq!(m[[0, 3]], 2.0);
        assert!(mosaic(&[ArrayD::from_elem(IxDyn(&[4]), 0.0)]).is_err());
    }

    #[test]
    fn saves_png_with_specified_depth() {
        let values = Array2::from_shape_vec((2, 3), vec![0.0, -1.0, 0.5, 0.25, 1.0, 0.0]).unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let path8 = tmp.path().join("depth8.png");
        let path16 = tmp.path().join("depth16.png");

        save_png(&values, &path8, ColorMap::Gray, PngDepth::Eight).unwrap();
        save_png(&values, &path16, ColorMap::Viridis, PngDepth::Sixteen).unwrap();

        let dec8 = PngDecoder::new(File::open(&path8).unwrap()).unwrap();
        assert_eq!(dec8.dimensions(), (3, 2));
        assert_eq!(dec8.color_type(), ColorType::Rgb8);
        let mut buf = vec![0u8; dec8.total_bytes() as usize];
        dec8.read_image(&mut buf).unwrap();
        // Gray: zero is black, the largest magnitude is white.
        assert_eq!(&buf[..3], &[0, 0, 0]);
        assert_eq!(&buf[3..6], &[255, 255, 255]);

        let dec16 = PngDecoder::new(File::open(&path16).unwrap()).unwrap();
        assert_eq!(dec16.color_type(), ColorType::Rgb16);
        assert!(fs::metadata(&path8).unwrap().len() > 0);
    }
}
