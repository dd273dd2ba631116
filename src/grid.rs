//! Slot-grid placement: turning "room, slot, span" into pixels.
//!
//! Each room is divided into `slot_count` equal slots between two side
//! margins of `position_padding_ratio * room.width`. An object spanning
//! `slot_span` slots is scaled to that span (times its per-kind scale and the
//! gap factor), centred horizontally over the span, and stood on the floor
//! line at `y_offset_factor * room.height`.
//!
//! Everything here is a pure function of the request and the [`GridConfig`].

use image::RgbaImage;

use crate::asset::{AssetKind, ObjectKind};
use crate::config::GridConfig;
use crate::error::Result;
use crate::geometry::Rect;
use crate::scale;

/// Intent to place one object on a room's slot grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRequest {
    pub room: Rect,
    pub start_slot: u32,
    pub slot_span: u32,
    pub kind: ObjectKind,
}

/// Slot grid of a single room.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotGrid {
    /// Left edge of slot 0.
    pub start_x: f64,
    /// Width between the two side margins.
    pub available_width: f64,
    pub slot_width: f64,
}

impl SlotGrid {
    pub fn for_room(room: &Rect, config: &GridConfig) -> Self {
        let width = f64::from(room.width);
        let ratio = config.position_padding_ratio;
        let available_width = width * (1.0 - 2.0 * ratio);
        Self {
            start_x: f64::from(room.x) + width * ratio,
            available_width,
            slot_width: available_width / f64::from(config.slot_count.max(1)),
        }
    }

    /// Left edge of `slot`. Slots past the end continue at the same pitch.
    pub fn slot_x(&self, slot: u32) -> f64 {
        self.start_x + f64::from(slot) * self.slot_width
    }
}

/// Where and how large a placed object ends up, before rasterising.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementGeometry {
    pub dest_x: f64,
    pub dest_y: f64,
    pub target_width: f64,
    pub target_height: f64,
}

impl PlacementGeometry {
    /// The floor line the sprite stands on, rounded to a pixel row.
    pub fn floor_row(&self) -> i32 {
        (self.dest_y + self.target_height).round() as i32
    }

    /// Integer paste origin for the rasterised sprite of `width` x `height`.
    ///
    /// The sprite's bottom edge lands exactly on [`floor_row`](Self::floor_row)
    /// and it is centred on the span, whatever rounding the resize applied.
    pub fn origin_for(&self, width: u32, height: u32) -> (i32, i32) {
        let center_x = self.dest_x + self.target_width / 2.0;
        let x = (center_x - f64::from(width) / 2.0).round() as i32;
        (x, self.floor_row() - height as i32)
    }
}

/// A resolved placement with its scaled sprite.
#[derive(Debug, Clone)]
pub struct Placement {
    pub kind: ObjectKind,
    pub geometry: PlacementGeometry,
    pub image: RgbaImage,
}

impl Placement {
    pub fn origin(&self) -> (i32, i32) {
        self.geometry.origin_for(self.image.width(), self.image.height())
    }
}

/// Compute the destination of an object whose source sprite is
/// `source_width` x `source_height`.
///
/// Requests that run past the last slot are not rejected; the geometry simply
/// extends beyond the room's right margin.
pub fn resolve_geometry(
    request: &PlacementRequest,
    source_width: u32,
    source_height: u32,
    config: &GridConfig,
) -> PlacementGeometry {
    let grid = SlotGrid::for_room(&request.room, config);
    let tuning = config.tuning(request.kind);
    let span = f64::from(request.slot_span);
    let span_width = grid.slot_width * span;

    let target_width = span_width * tuning.scale * config.slot_gap_factor;
    let target_height = if source_width == 0 {
        0.0
    } else {
        f64::from(source_height) * (target_width / f64::from(source_width))
    };

    let dest_x =
        grid.slot_x(request.start_slot) - (target_width - span_width) / 2.0 + tuning.x_offset;
    let floor_y =
        f64::from(request.room.y) + f64::from(request.room.height) * config.y_offset_factor;
    let dest_y = floor_y - target_height + tuning.y_offset;

    PlacementGeometry {
        dest_x,
        dest_y,
        target_width,
        target_height,
    }
}

/// Resolve a request against a sprite and scale the sprite to fit.
///
/// # Errors
///
/// Returns [`crate::ComposeError::InvalidAsset`] if the sprite is empty or the
/// computed width is not positive.
pub fn resolve(
    request: &PlacementRequest,
    image: &RgbaImage,
    config: &GridConfig,
) -> Result<Placement> {
    let (w, h) = image.dimensions();
    let geometry = resolve_geometry(request, w, h, config);
    let scaled = scale::scale_to_width(
        image,
        geometry.target_width,
        AssetKind::Object(request.kind),
    )?;
    Ok(Placement {
        kind: request.kind,
        geometry,
        image: scaled,
    })
}
