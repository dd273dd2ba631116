//! Vertical room stacking.

use tracing::debug;

use crate::error::{ComposeError, Result};
use crate::geometry::Rect;

/// Inputs for one stack of identical rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackParams {
    pub canvas_width: u32,
    pub room_width: u32,
    pub room_height: u32,
    pub count: usize,
    /// Top of the first room.
    pub start_y: i32,
    /// Added to the room height to get the step between rooms. Negative
    /// values overlap adjoining rooms so their walls read as continuous.
    pub vertical_padding: i32,
    /// Space kept below the last room.
    pub trailing_margin: u32,
}

impl StackParams {
    /// Distance between the tops of consecutive rooms.
    pub fn step(&self) -> i64 {
        i64::from(self.room_height) + i64::from(self.vertical_padding)
    }
}

/// Room rectangles laid out top to bottom, horizontally centred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomStack {
    pub rooms: Vec<Rect>,
    /// Smallest canvas height that shows every room plus the trailing margin.
    pub required_height: u32,
}

impl RoomStack {
    /// Lay out `params.count` rooms.
    ///
    /// `rooms[i].y = start_y + i * (room_height + vertical_padding)`.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::Config`] if the room size is zero or the step
    /// between rooms is not positive (rooms would not advance down the canvas).
    pub fn build(params: &StackParams) -> Result<Self> {
        if params.room_width == 0 || params.room_height == 0 {
            return Err(ComposeError::Config(format!(
                "room template is {}x{}",
                params.room_width, params.room_height
            )));
        }
        let step = params.step();
        if step <= 0 {
            return Err(ComposeError::Config(format!(
                "vertical_padding {} cancels room height {}; rooms would not advance",
                params.vertical_padding, params.room_height
            )));
        }

        let x = ((i64::from(params.canvas_width) - i64::from(params.room_width)) / 2) as i32;
        let rooms: Vec<Rect> = (0..params.count)
            .map(|i| {
                let y = i64::from(params.start_y) + i as i64 * step;
                Rect::new(x, y as i32, params.room_width, params.room_height)
            })
            .collect();

        let content_bottom = rooms
            .iter()
            .map(Rect::bottom)
            .max()
            .unwrap_or(i64::from(params.start_y))
            .max(0);
        let required_height = (content_bottom + i64::from(params.trailing_margin)) as u32;

        debug!(
            count = params.count,
            step,
            required_height,
            "room stack built"
        );

        Ok(Self {
            rooms,
            required_height,
        })
    }

    /// Canvas height for a background of `background_height`: the background
    /// height, or the required height if the background is too short.
    pub fn canvas_height(&self, background_height: u32) -> u32 {
        background_height.max(self.required_height)
    }

    /// Whether a background of this height must be extended to fit the stack.
    pub fn needs_extension(&self, background_height: u32) -> bool {
        background_height < self.required_height
    }
}
