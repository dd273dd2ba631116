//! Scene compositing: painting background, rooms, objects, and the entrance
//! onto one canvas in a fixed painter's order.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use image::{RgbaImage, imageops};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::asset::ObjectKind;
use crate::config::BunkerConfig;
use crate::error::Result;
use crate::grid::{self, PlacementRequest};
use crate::pipeline::PreparedAssets;
use crate::scale;
use crate::scene::ScenePlan;

/// How the background fills a canvas taller than the background image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundFit {
    /// Stretch vertically, keeping one continuous horizon.
    #[default]
    Stretch,
    /// Repeat the background downwards, cropping the last copy.
    Tile,
}

/// A mutable RGBA canvas with alpha-composited paste.
#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// A canvas as wide as `background` and `height` tall, filled with it.
    ///
    /// A shorter canvas shows the top of the background; a taller one is
    /// filled according to `fit`.
    pub fn with_background(background: &RgbaImage, height: u32, fit: BackgroundFit) -> Self {
        let (width, bg_height) = background.dimensions();
        if height == bg_height {
            return Self {
                image: background.clone(),
            };
        }
        if height < bg_height {
            debug!(width, from = bg_height, to = height, "background cropped");
            return Self {
                image: imageops::crop_imm(background, 0, 0, width, height).to_image(),
            };
        }

        let image = match fit {
            BackgroundFit::Stretch => scale::stretch(background, width, height),
            BackgroundFit::Tile => {
                let mut tiled = RgbaImage::new(width, height);
                let mut y = 0i64;
                while bg_height > 0 && y < i64::from(height) {
                    imageops::replace(&mut tiled, background, 0, y);
                    y += i64::from(bg_height);
                }
                tiled
            }
        };
        debug!(width, from = bg_height, to = height, ?fit, "background extended");
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Composite `src` over the canvas with its top-left at `(x, y)`.
    ///
    /// Uses the source alpha as the mask: `dst = src * a + dst * (1 - a)` per
    /// colour channel and `dst_a = a + dst_a * (1 - a)`. Parts of `src` outside
    /// the canvas are clipped; negative origins are allowed.
    pub fn paste_over(&mut self, src: &RgbaImage, x: i32, y: i32) {
        let (cw, ch) = (i64::from(self.width()), i64::from(self.height()));
        let (sw, sh) = (i64::from(src.width()), i64::from(src.height()));
        let (x, y) = (i64::from(x), i64::from(y));

        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + sw).min(cw);
        let y1 = (y + sh).min(ch);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        for dy in y0..y1 {
            for dx in x0..x1 {
                let s = src.get_pixel((dx - x) as u32, (dy - y) as u32);
                let sa = s[3];
                if sa == 0 {
                    continue;
                }
                let d = self.image.get_pixel_mut(dx as u32, dy as u32);
                if sa == 255 {
                    *d = *s;
                    continue;
                }

                let a = f32::from(sa) / 255.0;
                let inv = 1.0 - a;
                for c in 0..3 {
                    d[c] = (f32::from(s[c]) * a + f32::from(d[c]) * inv).round() as u8;
                }
                let da = f32::from(d[3]) / 255.0;
                d[3] = ((a + da * inv) * 255.0).round() as u8;
            }
        }
    }
}

/// A placement that could not be painted because its sprite is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedPlacement {
    /// Global room index.
    pub room: usize,
    pub kind: ObjectKind,
}

/// A finished scene canvas.
#[derive(Debug, Clone)]
pub struct RenderedScene {
    pub plan: ScenePlan,
    pub image: RgbaImage,
    pub skipped: Vec<SkippedPlacement>,
}

/// Paint one scene.
///
/// Order: background, rooms top to bottom, placed objects (in room order,
/// then config order), and the entrance last so it covers room seams.
///
/// # Errors
///
/// Returns an error if an object sprite cannot be scaled.
pub fn compose_scene(
    plan: &ScenePlan,
    assets: &PreparedAssets,
    config: &BunkerConfig,
) -> Result<RenderedScene> {
    let mut canvas = Canvas::with_background(
        &assets.background,
        plan.height,
        config.layout.background_fit,
    );

    for room in &plan.rooms {
        canvas.paste_over(&assets.room, room.x, room.y);
    }

    let mut scaled: HashMap<(ObjectKind, u64), RgbaImage> = HashMap::new();
    let mut skipped = Vec::new();
    for slotted in &plan.requests {
        let request: &PlacementRequest = &slotted.request;
        let Some(sprite) = assets.objects.get(&request.kind) else {
            warn!(
                scene = plan.index,
                room = slotted.room_index,
                kind = %request.kind,
                "no sprite for placement, skipping"
            );
            skipped.push(SkippedPlacement {
                room: slotted.room_index,
                kind: request.kind,
            });
            continue;
        };

        let (w, h) = sprite.dimensions();
        let geometry = grid::resolve_geometry(request, w, h, &config.grid);
        // Every room shares one template, so a kind/width pair scales identically.
        let key = (request.kind, geometry.target_width.to_bits());
        let image = match scaled.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                entry.insert(grid::resolve(request, sprite, &config.grid)?.image)
            }
        };

        let (x, y) = geometry.origin_for(image.width(), image.height());
        debug!(
            scene = plan.index,
            room = slotted.room_index,
            kind = %request.kind,
            x,
            y,
            "placing object"
        );
        canvas.paste_over(image, x, y);
    }

    if let Some(rect) = plan.entrance {
        match &assets.entrance {
            Some(entrance) => canvas.paste_over(entrance, rect.x, rect.y),
            None => warn!(scene = plan.index, "entrance planned without a sprite"),
        }
    }

    Ok(RenderedScene {
        plan: plan.clone(),
        image: canvas.into_image(),
        skipped,
    })
}
