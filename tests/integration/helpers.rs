//! Shared fixtures for integration tests.

use std::path::{Path, PathBuf};

use bunkermap::BunkerConfig;
use image::{Rgba, RgbaImage};

pub(crate) const SKY: Rgba<u8> = Rgba([20, 40, 120, 255]);
pub(crate) const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub(crate) const WALL: Rgba<u8> = Rgba([90, 90, 100, 255]);
pub(crate) const DOOR: Rgba<u8> = Rgba([150, 60, 40, 255]);
pub(crate) const LEAF: Rgba<u8> = Rgba([30, 200, 40, 255]);

/// White backdrop with a `fill` block inset by `inset_x`/`inset_y` per side.
pub(crate) fn framed(w: u32, h: u32, inset_x: u32, inset_y: u32, fill: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| {
        let inside = x >= inset_x && x + inset_x < w && y >= inset_y && y + inset_y < h;
        if inside { fill } else { WHITE }
    })
}

/// Config text for an 800x600 background and three 560x400 rooms at a
/// -40 padding starting at y=30. The room ratio of 0.7 keeps the room
/// template at its source size.
pub(crate) const BUNKER_TOML: &str = r#"
[assets]
background = "bg.png"
room = "room.png"

[assets.objects]
garden = "garden.png"

[grid]
vertical_padding = -40

[layout]
room_count = 3
start_y = 30
trailing_margin = 50

[[placements]]
kind = "garden"
start_slot = 0
slot_span = 2

[[placements]]
kind = "scrap_machine"
start_slot = 6
rooms = [1]
"#;

/// Write the fixture images and `config_text` into `dir`, returning the
/// config path.
pub(crate) fn write_bunker(dir: &Path, config_text: &str) -> PathBuf {
    RgbaImage::from_pixel(800, 600, SKY)
        .save(dir.join("bg.png"))
        .expect("write background");
    framed(560, 400, 20, 20, WALL)
        .save(dir.join("room.png"))
        .expect("write room");
    framed(60, 40, 5, 5, LEAF)
        .save(dir.join("garden.png"))
        .expect("write garden");

    let path = dir.join("bunker.toml");
    std::fs::write(&path, config_text).expect("write config");
    path
}

pub(crate) fn load_config(path: &Path) -> BunkerConfig {
    let config = BunkerConfig::from_file(path).expect("parse config");
    config.validate().expect("valid config");
    config
}
