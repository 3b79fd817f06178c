//! Pixel normalization applied before embedding.

use anyhow::Result;
use image::DynamicImage;
use ndarray::{Array, Array3, Dimension};

/// Zero-mean, unit-variance scaling with the standard deviation floored at
/// `1/sqrt(n)` so flat images do not blow up.
pub fn prewhiten<D: Dimension>(x: &Array<f32, D>) -> Array<f32, D> {
    let n = x.len().max(1) as f32;
    let mean = x.sum() / n;
    let std = (x.mapv(|v| (v - mean) * (v - mean)).sum() / n).sqrt();
    let std_adj = std.max(1.0 / n.sqrt());
    x.mapv(|v| (v - mean) / std_adj)
}

/// Plain zero-mean, unit-variance scaling. A constant input maps to zeros.
pub fn standardize<D: Dimension>(x: &Array<f32, D>) -> Array<f32, D> {
    let n = x.len().max(1) as f32;
    let mean = x.sum() / n;
    let std = (x.mapv(|v| (v - mean) * (v - mean)).sum() / n).sqrt();
    if std == 0.0 {
        return x.mapv(|_| 0.0);
    }
    x.mapv(|v| (v - mean) / std)
}

/// HWC float array of an RGB image with raw [0, 255] values.
pub fn to_hwc(img: &DynamicImage) -> Result<Array3<f32>> {
    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    let data: Vec<f32> = rgb.as_raw().iter().map(|&v| v as f32).collect();
    Ok(Array3::from_shape_vec((h as usize, w as usize, 3), data)?)
}
