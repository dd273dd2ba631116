//! Shared test fixtures used across multiple test modules.

use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const WALL: Rgba<u8> = Rgba([90, 90, 100, 255]);

/// A `w` x `h` sprite on a white backdrop with a `fill` block inset by
/// `inset_x` and `inset_y` pixels on each side.
pub fn framed_sprite(w: u32, h: u32, inset_x: u32, inset_y: u32, fill: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| {
        let inside_x = x >= inset_x && x + inset_x < w;
        let inside_y = y >= inset_y && y + inset_y < h;
        if inside_x && inside_y { fill } else { WHITE }
    })
}

/// Encode `image` as PNG under `dir` and return its path.
pub fn write_png(dir: &Path, name: &str, image: &RgbaImage) -> PathBuf {
    let path = dir.join(name);
    image.save(&path).expect("write test png");
    path
}
