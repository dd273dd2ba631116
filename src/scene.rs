//! Scene planning: splitting the room stack into bounded scenes and turning
//! placement specs into per-room grid requests.
//!
//! The whole bunker is one global stack: the entrance at `start_y`, then
//! `room_count` rooms below it. A split run partitions the rooms into
//! contiguous groups and lays each group out again in its own frame with the
//! same [`GridConfig`](crate::config::GridConfig), so every scene has the same
//! room scale. `origin_y` maps a scene's frame back into the global one.

use std::ops::Range;

use tracing::{info, warn};

use crate::config::BunkerConfig;
use crate::error::{ComposeError, Result};
use crate::geometry::Rect;
use crate::grid::PlacementRequest;
use crate::stack::{RoomStack, StackParams};

/// Sizes of the prepared templates that layout depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutDims {
    /// Canvas width, equal to the background width.
    pub canvas_width: u32,
    pub background_height: u32,
    /// Scaled room template size.
    pub room: (u32, u32),
    /// Scaled entrance size, if there is an entrance.
    pub entrance: Option<(u32, u32)>,
}

/// A grid request tagged with the global index of its room.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlottedRequest {
    pub room_index: usize,
    pub request: PlacementRequest,
}

/// Everything needed to paint one scene.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenePlan {
    /// Zero-based scene index.
    pub index: usize,
    pub width: u32,
    pub height: u32,
    /// Add to a local y coordinate to get the global one.
    pub origin_y: i32,
    /// Global index of `rooms[0]`.
    pub first_room: usize,
    /// Room rectangles in this scene's frame, top to bottom.
    pub rooms: Vec<Rect>,
    /// Entrance rectangle, only in the first scene.
    pub entrance: Option<Rect>,
    /// Object placements, in room order then config order.
    pub requests: Vec<SlottedRequest>,
}

impl ScenePlan {
    /// Global indices of this scene's rooms.
    pub fn room_indices(&self) -> Range<usize> {
        self.first_room..self.first_room + self.rooms.len()
    }

    /// Room rectangles translated into the global frame.
    pub fn global_rooms(&self) -> Vec<Rect> {
        self.rooms
            .iter()
            .map(|room| room.translated(0, self.origin_y))
            .collect()
    }
}

/// Top of the first room when an entrance of `entrance` size sits above it.
fn rooms_start_y(config: &BunkerConfig, entrance: Option<(u32, u32)>) -> i32 {
    let start_y = config.layout.start_y;
    match entrance {
        Some((_, height)) => start_y + height as i32 + config.grid.vertical_padding,
        None => start_y,
    }
}

/// How many rooms fit under `max_height` when the first starts at `rooms_start`.
fn capacity(config: &BunkerConfig, dims: &LayoutDims, rooms_start: i32, max_height: u32) -> usize {
    let room_height = i64::from(dims.room.1);
    let step = room_height + i64::from(config.grid.vertical_padding);
    let room_budget = i64::from(max_height)
        - i64::from(config.layout.trailing_margin)
        - i64::from(rooms_start)
        - room_height;
    if room_budget < 0 || step <= 0 {
        return 1;
    }
    (room_budget / step + 1) as usize
}

/// Rooms per scene for scenes without the entrance.
///
/// An explicit `layout.rooms_per_scene` wins. Otherwise it is the largest
/// count (at least 1) whose stack fits `layout.max_scene_height`, or every
/// room when no limit is set. The first scene may hold fewer rooms when the
/// entrance takes part of its height.
pub fn rooms_per_scene(config: &BunkerConfig, dims: &LayoutDims) -> usize {
    let total = config.layout.room_count.max(1);
    if let Some(per_scene) = config.layout.rooms_per_scene {
        return per_scene.max(1);
    }
    match config.layout.max_scene_height {
        Some(max_height) => capacity(config, dims, rooms_start_y(config, None), max_height),
        None => total,
    }
}

/// Partition global room indices into contiguous scene groups.
pub fn partition_rooms(config: &BunkerConfig, dims: &LayoutDims) -> Vec<Range<usize>> {
    let total = config.layout.room_count;

    let Some(max_height) = config
        .layout
        .max_scene_height
        .filter(|_| config.layout.rooms_per_scene.is_none())
    else {
        let per_scene = rooms_per_scene(config, dims);
        return (0..total)
            .step_by(per_scene)
            .map(|start| start..(start + per_scene).min(total))
            .collect();
    };

    let mut groups = Vec::new();
    let mut start = 0;
    while start < total {
        let entrance = if start == 0 { dims.entrance } else { None };
        let rooms_start = rooms_start_y(config, entrance);
        let fits = capacity(config, dims, rooms_start, max_height);
        if fits == 1 && rooms_start + dims.room.1 as i32 > max_height as i32 {
            warn!(max_height, scene = groups.len(), "a single room exceeds max_scene_height");
        }
        let end = (start + fits).min(total);
        groups.push(start..end);
        start = end;
    }
    groups
}

/// Whether the run is configured to split rooms across scenes.
pub fn is_split(config: &BunkerConfig) -> bool {
    config.layout.rooms_per_scene.is_some() || config.layout.max_scene_height.is_some()
}

/// Lay out one group of rooms.
///
/// With `fit_background` the canvas is at least as tall as the background;
/// otherwise it is sized to its own content plus the trailing margin.
fn plan_group(
    config: &BunkerConfig,
    dims: &LayoutDims,
    index: usize,
    rooms: Range<usize>,
    fit_background: bool,
) -> Result<ScenePlan> {
    let entrance_size = if index == 0 { dims.entrance } else { None };
    let centered = |width: u32| ((i64::from(dims.canvas_width) - i64::from(width)) / 2) as i32;
    let entrance = entrance_size.map(|(w, h)| Rect::new(centered(w), config.layout.start_y, w, h));

    let stack = RoomStack::build(&StackParams {
        canvas_width: dims.canvas_width,
        room_width: dims.room.0,
        room_height: dims.room.1,
        count: rooms.len(),
        start_y: rooms_start_y(config, entrance_size),
        vertical_padding: config.grid.vertical_padding,
        trailing_margin: config.layout.trailing_margin,
    })?;

    let mut content_height = stack.required_height;
    if let Some(rect) = entrance {
        let entrance_bottom = (rect.bottom() + i64::from(config.layout.trailing_margin)).max(0);
        content_height = content_height.max(entrance_bottom as u32);
    }
    let height = if fit_background {
        content_height.max(dims.background_height)
    } else {
        content_height
    };

    let mut requests = Vec::new();
    for (offset, room) in stack.rooms.iter().enumerate() {
        let room_index = rooms.start + offset;
        for spec in config.placements.iter().filter(|s| s.applies_to(room_index)) {
            requests.push(SlottedRequest {
                room_index,
                request: PlacementRequest {
                    room: *room,
                    start_slot: spec.start_slot,
                    slot_span: spec.slot_span,
                    kind: spec.kind,
                },
            });
        }
    }

    Ok(ScenePlan {
        index,
        width: dims.canvas_width,
        height,
        origin_y: 0,
        first_room: rooms.start,
        rooms: stack.rooms,
        entrance,
        requests,
    })
}

/// Lay out the whole bunker as a single scene.
///
/// # Errors
///
/// Returns an error if the room template is empty or the stacking step is not
/// positive.
pub fn global_layout(config: &BunkerConfig, dims: &LayoutDims) -> Result<ScenePlan> {
    plan_group(config, dims, 0, 0..config.layout.room_count, true)
}

/// Plan every scene of the run.
///
/// An unsplit run gets one canvas at least as tall as the background. Split
/// scenes are sized to their own rooms plus margins, so `max_scene_height`
/// bounds every scene whose rooms fit under it.
///
/// # Errors
///
/// Returns an error if the room template is empty or the stacking step is not
/// positive.
pub fn plan_scenes(config: &BunkerConfig, dims: &LayoutDims) -> Result<Vec<ScenePlan>> {
    if dims.canvas_width == 0 || dims.background_height == 0 {
        return Err(ComposeError::Config(format!(
            "background is {}x{}",
            dims.canvas_width, dims.background_height
        )));
    }

    let global = global_layout(config, dims)?;
    let groups = partition_rooms(config, dims);
    let fit_background = !is_split(config);

    let mut scenes = Vec::with_capacity(groups.len());
    for (index, rooms) in groups.into_iter().enumerate() {
        let first = rooms.start;
        let mut plan = plan_group(config, dims, index, rooms, fit_background)?;
        if let (Some(global_room), Some(local_room)) = (global.rooms.get(first), plan.rooms.first())
        {
            plan.origin_y = global_room.y - local_room.y;
        }
        scenes.push(plan);
    }

    info!(
        scenes = scenes.len(),
        rooms = config.layout.room_count,
        placements = scenes.iter().map(|s| s.requests.len()).sum::<usize>(),
        "scenes planned"
    );
    Ok(scenes)
}
