//! Bunkermap: offline compositor for multi-floor bunker level backgrounds.
//!
//! Takes a background, a room template, an optional entrance, and object
//! sprites, and paints a vertical stack of rooms with objects snapped onto a
//! per-room slot grid. Tall bunkers can be split into several scenes that
//! render in parallel.
//!
//! # Architecture
//!
//! Each stage is a plain function over owned images:
//! - **Segmentation**: chroma key or corner flood fill to remove backdrops
//! - **Scaling**: room template to the configured floor width or height
//! - **Scene planning**: room stacking, scene partitioning, grid requests
//! - **Compositing**: background, rooms, objects, entrance, in that order
//! - **Batch**: one rayon task per scene, outcomes collected per scene

pub mod asset;
pub mod compositor;
pub mod config;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod scale;
pub mod scene;
pub mod segment;
pub mod stack;

#[cfg(test)]
pub(crate) mod test_utils;

pub use asset::{AssetKind, AssetSet, ObjectKind};
pub use compositor::{BackgroundFit, RenderedScene};
pub use config::BunkerConfig;
pub use error::{ComposeError, Result};
pub use pipeline::{BatchReport, PreparedAssets};
pub use progress::{ProgressCallback, ProgressEvent};
pub use scene::ScenePlan;
pub use segment::SegmentMethod;
