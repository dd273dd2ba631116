//! Background segmentation: turning a sprite's white backdrop transparent.
//!
//! Two algorithms are available and chosen per asset in the config:
//!
//! - **Chroma key** keys out every near-white pixel. Cheap and fine for small
//!   object sprites whose interiors rarely contain large white regions.
//! - **Flood fill** only keys out near-white pixels reachable from the image
//!   corners, so white lights and doors inside a room stay opaque.
//!
//! Both return a new image; the source is never modified.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::geometry::Rect;

/// Backdrop removal method for one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SegmentMethod {
    /// Key out every pixel whose channels all exceed `threshold`.
    ChromaKey {
        threshold: u8,
        /// Width of the partial-alpha band below `threshold`. 0 disables it.
        #[serde(default)]
        soft_band: u8,
        /// Also key out pixels whose channels are all below this value.
        #[serde(default)]
        dark_threshold: Option<u8>,
    },
    /// Key out near-white pixels 4-connected to an image corner.
    FloodFill {
        threshold: u8,
        /// Afterwards, key out any remaining pixel brighter than this.
        #[serde(default)]
        fringe_threshold: Option<u8>,
    },
    /// Leave the image untouched.
    None,
}

/// Apply the configured method to `image`.
pub fn segment(image: &RgbaImage, method: SegmentMethod) -> RgbaImage {
    match method {
        SegmentMethod::ChromaKey {
            threshold,
            soft_band,
            dark_threshold,
        } => key_pixels(image, threshold, soft_band, dark_threshold),
        SegmentMethod::FloodFill {
            threshold,
            fringe_threshold,
        } => flood_fill(image, threshold, fringe_threshold),
        SegmentMethod::None => image.clone(),
    }
}

/// Hard chroma key: alpha 0 for every pixel with r, g and b above `threshold`.
///
/// Other pixels are left exactly as they were. Applying this twice gives the
/// same result as applying it once.
pub fn chroma_key(image: &RgbaImage, threshold: u8) -> RgbaImage {
    key_pixels(image, threshold, 0, None)
}

/// Chroma key with a linear alpha fade for pixels just below `threshold`.
///
/// A pixel whose channels all exceed `threshold - band` (but which is not
/// keyed outright) has its alpha scaled by
/// `(255 - brightness) / (255 - (threshold - band))`, clamped to `[0, 1]`,
/// where brightness is the channel mean. This avoids a hard white fringe.
pub fn chroma_key_soft(image: &RgbaImage, threshold: u8, band: u8) -> RgbaImage {
    key_pixels(image, threshold, band, None)
}

fn key_pixels(image: &RgbaImage, threshold: u8, soft_band: u8, dark: Option<u8>) -> RgbaImage {
    let mut out = image.clone();
    let edge = threshold.saturating_sub(soft_band);
    let fade_span = 255.0 - f32::from(edge);

    for pixel in out.pixels_mut() {
        if all_above(pixel, threshold) {
            pixel[3] = 0;
        } else if dark.is_some_and(|d| all_below(pixel, d)) {
            pixel[3] = 0;
        } else if soft_band > 0 && all_above(pixel, edge) {
            let brightness =
                (f32::from(pixel[0]) + f32::from(pixel[1]) + f32::from(pixel[2])) / 3.0;
            let factor = ((255.0 - brightness) / fade_span).clamp(0.0, 1.0);
            pixel[3] = (f32::from(pixel[3]) * factor) as u8;
        }
    }
    out
}

fn all_above(pixel: &Rgba<u8>, threshold: u8) -> bool {
    pixel[0] > threshold && pixel[1] > threshold && pixel[2] > threshold
}

fn all_below(pixel: &Rgba<u8>, threshold: u8) -> bool {
    pixel[0] < threshold && pixel[1] < threshold && pixel[2] < threshold
}

/// Why a flood-fill seed could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeedError {
    OutOfRange,
    NotBackground,
}

/// Flood-fill segmentation seeded from the four corners.
///
/// Pixels that are near-white (all channels above `threshold`) or already
/// fully transparent are background candidates; those 4-connected to a
/// usable corner become transparent. A corner that is out of range or not a
/// background candidate is skipped. If no corner is usable the image is
/// returned unsegmented.
///
/// When `fringe_threshold` is set, a second pass keys out every remaining
/// pixel brighter than it, catching anti-aliased edges the fill could not
/// reach.
pub fn flood_fill(image: &RgbaImage, threshold: u8, fringe_threshold: Option<u8>) -> RgbaImage {
    let (w, h) = image.dimensions();
    let mut reached = vec![false; (w as usize) * (h as usize)];

    let right = w.checked_sub(1);
    let bottom = h.checked_sub(1);
    let seeds = [
        (Some(0), Some(0)),
        (right, Some(0)),
        (Some(0), bottom),
        (right, bottom),
    ];

    let mut usable = 0usize;
    for (i, seed) in seeds.into_iter().enumerate() {
        match fill_from(image, seed, threshold, &mut reached) {
            Ok(filled) => {
                usable += 1;
                debug!(seed = i, filled, "flood fill seed applied");
            }
            Err(err) => debug!(seed = i, ?err, "flood fill seed skipped"),
        }
    }

    if usable == 0 {
        warn!(width = w, height = h, "no usable flood fill seed, image left unsegmented");
        return image.clone();
    }

    let mut out = image.clone();
    for (pixel, &is_background) in out.pixels_mut().zip(&reached) {
        if is_background || fringe_threshold.is_some_and(|t| all_above(pixel, t)) {
            pixel[3] = 0;
        }
    }
    out
}

fn fill_from(
    image: &RgbaImage,
    seed: (Option<u32>, Option<u32>),
    threshold: u8,
    reached: &mut [bool],
) -> Result<usize, SeedError> {
    let (Some(sx), Some(sy)) = seed else {
        return Err(SeedError::OutOfRange);
    };
    let (w, h) = image.dimensions();
    if sx >= w || sy >= h {
        return Err(SeedError::OutOfRange);
    }

    let is_background = |x: u32, y: u32| {
        let pixel = image.get_pixel(x, y);
        pixel[3] == 0 || all_above(pixel, threshold)
    };
    if !is_background(sx, sy) {
        return Err(SeedError::NotBackground);
    }

    let index = |x: u32, y: u32| (y as usize) * (w as usize) + x as usize;
    let mut filled = 0usize;
    let mut stack = vec![(sx, sy)];
    while let Some((x, y)) = stack.pop() {
        let i = index(x, y);
        if reached[i] || !is_background(x, y) {
            continue;
        }
        reached[i] = true;
        filled += 1;

        if x > 0 {
            stack.push((x - 1, y));
        }
        if x + 1 < w {
            stack.push((x + 1, y));
        }
        if y > 0 {
            stack.push((x, y - 1));
        }
        if y + 1 < h {
            stack.push((x, y + 1));
        }
    }
    Ok(filled)
}

/// Bounding box of all pixels with non-zero alpha, or `None` if the image is
/// fully transparent.
///
/// Always computed from the pixels given; a box measured on one sprite is not
/// valid for another.
pub fn opaque_bounds(image: &RgbaImage) -> Option<Rect> {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0;
    let mut max_y = 0;
    let mut any = false;

    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[3] > 0 {
            any = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    any.then(|| {
        Rect::new(
            min_x as i32,
            min_y as i32,
            max_x - min_x + 1,
            max_y - min_y + 1,
        )
    })
}

/// Crop to [`opaque_bounds`]. A fully transparent image is returned as is.
pub fn crop_to_content(image: &RgbaImage) -> RgbaImage {
    match opaque_bounds(image) {
        Some(bounds) => image::imageops::crop_imm(
            image,
            bounds.x as u32,
            bounds.y as u32,
            bounds.width,
            bounds.height,
        )
        .to_image(),
        None => image.clone(),
    }
}

/// Transparent margin around a sprite's visible content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentPadding {
    /// Opaque bounding box.
    pub bounds: Rect,
    /// Left plus right transparent columns as a fraction of the width.
    pub horizontal: f64,
    /// Top plus bottom transparent rows as a fraction of the height.
    pub vertical: f64,
    /// Transparent rows below the content, in pixels.
    pub bottom: u32,
}

/// Measure the transparent padding around `image`'s content.
pub fn content_padding(image: &RgbaImage) -> Option<ContentPadding> {
    let bounds = opaque_bounds(image)?;
    let (w, h) = image.dimensions();
    let horizontal = f64::from(w - bounds.width) / f64::from(w);
    let vertical = f64::from(h - bounds.height) / f64::from(h);
    let bottom = h - (bounds.y as u32 + bounds.height);
    Some(ContentPadding {
        bounds,
        horizontal,
        vertical,
        bottom,
    })
}
