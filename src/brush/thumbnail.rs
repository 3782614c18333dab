//! Aspect-preserving thumbnail scaling.

use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Scales `src` into a `width` x `height` canvas without stretching.
///
/// The scale factor is the smaller of the two axis ratios, so one axis fills
/// the canvas and the other is centered between equal transparent margins.
/// Resampling is bilinear.
pub fn scale_nostretch_centered(src: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let mut dst = RgbaImage::new(width, height);
    if src.width() == 0 || src.height() == 0 || width == 0 || height == 0 {
        return dst;
    }

    let scale_x = width as f64 / src.width() as f64;
    let scale_y = height as f64 / src.height() as f64;
    let scale = scale_x.min(scale_y);

    let scaled_w = ((src.width() as f64 * scale).round() as u32).clamp(1, width);
    let scaled_h = ((src.height() as f64 * scale).round() as u32).clamp(1, height);
    let scaled = imageops::resize(src, scaled_w, scaled_h, FilterType::Triangle);

    let offset_x = (width - scaled_w) / 2;
    let offset_y = (height - scaled_h) / 2;
    imageops::replace(&mut dst, &scaled, offset_x as i64, offset_y as i64);
    dst
}
