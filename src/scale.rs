//! Aspect-preserving image scaling with Lanczos resampling.

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::asset::AssetKind;
use crate::error::{ComposeError, Result};

/// Resampling filter used for every resize in the pipeline.
pub const FILTER: FilterType = FilterType::Lanczos3;

/// Output dimensions for scaling `(width, height)` by `factor`, rounded to the
/// nearest pixel and never smaller than 1.
pub fn scaled_dimensions(width: u32, height: u32, factor: f64) -> (u32, u32) {
    let scale = |v: u32| ((f64::from(v) * factor).round() as u32).max(1);
    (scale(width), scale(height))
}

/// Scale `image` uniformly by `factor`.
///
/// # Errors
///
/// Returns [`ComposeError::InvalidAsset`] if the image is empty or `factor` is
/// not a positive finite number.
pub fn scale_by(image: &RgbaImage, factor: f64, kind: AssetKind) -> Result<RgbaImage> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return Err(ComposeError::invalid(kind, format!("cannot scale a {w}x{h} image")));
    }
    if !(factor.is_finite() && factor > 0.0) {
        return Err(ComposeError::invalid(kind, format!("invalid scale factor {factor}")));
    }

    let (nw, nh) = scaled_dimensions(w, h, factor);
    if (nw, nh) == (w, h) {
        return Ok(image.clone());
    }
    Ok(imageops::resize(image, nw, nh, FILTER))
}

/// Scale `image` so its width becomes `target_width`, keeping the aspect ratio.
///
/// # Errors
///
/// See [`scale_by`].
pub fn scale_to_width(image: &RgbaImage, target_width: f64, kind: AssetKind) -> Result<RgbaImage> {
    let width = image.width();
    if width == 0 {
        return Err(ComposeError::invalid(kind, "cannot scale a zero-width image"));
    }
    scale_by(image, target_width / f64::from(width), kind)
}

/// Scale `image` so its height becomes `target_height`, keeping the aspect ratio.
///
/// # Errors
///
/// See [`scale_by`].
pub fn scale_to_height(
    image: &RgbaImage,
    target_height: f64,
    kind: AssetKind,
) -> Result<RgbaImage> {
    let height = image.height();
    if height == 0 {
        return Err(ComposeError::invalid(kind, "cannot scale a zero-height image"));
    }
    scale_by(image, target_height / f64::from(height), kind)
}

/// Resize to exact dimensions, ignoring aspect ratio. Used to stretch the
/// background over an extended canvas.
pub fn stretch(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, FILTER)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use image::Rgba;

    fn solid(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([90, 120, 30, 255]))
    }

    #[test]
    fn dimensions_round_to_nearest() {
        assert_eq!(scaled_dimensions(1000, 679, 0.56), (560, 380));
        assert_eq!(scaled_dimensions(3, 3, 0.5), (2, 2));
        assert_eq!(scaled_dimensions(10, 1, 0.01), (1, 1));
    }

    #[test]
    fn scale_to_width_keeps_aspect() {
        let scaled = scale_to_width(&solid(200, 100), 50.0, AssetKind::Room).unwrap();
        assert_eq!(scaled.dimensions(), (50, 25));
    }

    #[test]
    fn scale_to_height_keeps_aspect() {
        let scaled = scale_to_height(&solid(200, 100), 300.0, AssetKind::Room).unwrap();
        assert_eq!(scaled.dimensions(), (600, 300));
    }

    #[test]
    fn scaling_is_deterministic() {
        let source = RgbaImage::from_fn(37, 23, |x, y| Rgba([x as u8 * 6, y as u8 * 9, 77, 255]));
        let a = scale_to_width(&source, 61.3, AssetKind::Entrance).unwrap();
        let b = scale_to_width(&source, 61.3, AssetKind::Entrance).unwrap();
        assert_eq!(a.dimensions(), (61, 38));
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(matches!(
            scale_to_width(&RgbaImage::new(0, 4), 10.0, AssetKind::Room),
            Err(ComposeError::InvalidAsset { .. })
        ));
        assert!(scale_by(&solid(4, 4), 0.0, AssetKind::Room).is_err());
        assert!(scale_by(&solid(4, 4), f64::NAN, AssetKind::Room).is_err());
        assert!(scale_to_width(&solid(4, 4), -3.0, AssetKind::Room).is_err());
    }

    #[test]
    fn stretch_hits_exact_size() {
        assert_eq!(stretch(&solid(8, 6), 8, 20).dimensions(), (8, 20));
    }
}
