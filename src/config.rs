//! Configuration types for the bunker compositor.
//!
//! All tuning lives in one TOML file: grid constants, per-object offsets,
//! per-asset segmentation, stacking layout, placements, and output settings.
//! The parsed [`BunkerConfig`] is immutable for the rest of the run and is
//! passed by reference into every layout and placement call.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::asset::{AssetKind, ObjectKind};
use crate::compositor::BackgroundFit;
use crate::error::{ComposeError, Result};
use crate::segment::SegmentMethod;

/// Top-level configuration for a compositing run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BunkerConfig {
    /// Source image locations.
    pub assets: AssetPaths,
    /// Slot grid and stacking constants.
    pub grid: GridConfig,
    /// Backdrop removal method for each asset.
    pub segmentation: SegmentationConfig,
    /// Room template sizing and scene splitting.
    pub layout: LayoutConfig,
    /// Objects to place on room slot grids.
    pub placements: Vec<PlacementSpec>,
    /// Where and how scenes are written.
    pub output: OutputConfig,
    /// Worker pool settings.
    pub batch: BatchConfig,
}

/// Paths of the source images, relative to the config file's directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub background: Option<PathBuf>,
    pub room: Option<PathBuf>,
    pub entrance: Option<PathBuf>,
    pub objects: ObjectPaths,
}

/// Sprite path for each object kind. Unset kinds are simply never placed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectPaths {
    pub garden: Option<PathBuf>,
    pub water_purifier: Option<PathBuf>,
    pub scrap_machine: Option<PathBuf>,
}

impl ObjectPaths {
    pub fn get(&self, kind: ObjectKind) -> Option<&Path> {
        match kind {
            ObjectKind::Garden => self.garden.as_deref(),
            ObjectKind::WaterPurifier => self.water_purifier.as_deref(),
            ObjectKind::ScrapMachine => self.scrap_machine.as_deref(),
        }
    }
}

/// Slot grid configuration shared by every room in every scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of equal horizontal slots per room.
    pub slot_count: u32,
    /// Fraction of the room width reserved as margin on each side.
    pub position_padding_ratio: f64,
    /// Signed pixel gap between stacked rooms; negative values overlap them.
    pub vertical_padding: i32,
    /// Nominal room height. When set, the room template is scaled to this
    /// height instead of to `layout.room_width_ratio` of the canvas width.
    pub floor_height: Option<u32>,
    /// Fraction of the room height where an object's bottom edge rests.
    pub y_offset_factor: f64,
    /// Shrinks objects slightly below their slot span so neighbours do not touch.
    pub slot_gap_factor: f64,
    /// Per-object scale and offset overrides.
    pub objects: ObjectTuningTable,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            slot_count: 8,
            position_padding_ratio: 0.14,
            vertical_padding: -150,
            floor_height: None,
            y_offset_factor: 0.85,
            slot_gap_factor: 0.95,
            objects: ObjectTuningTable::default(),
        }
    }
}

impl GridConfig {
    pub fn tuning(&self, kind: ObjectKind) -> &ObjectTuning {
        self.objects.get(kind)
    }
}

/// Scale and nudge applied to one object kind after grid placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectTuning {
    /// Multiplier on the slot-span width.
    pub scale: f64,
    /// Horizontal nudge in canvas pixels.
    pub x_offset: f64,
    /// Vertical nudge in canvas pixels.
    pub y_offset: f64,
    /// Trim transparent borders after segmentation so the visible sprite,
    /// not its padding, sits on the floor line.
    pub crop_to_content: bool,
}

impl Default for ObjectTuning {
    fn default() -> Self {
        Self {
            scale: 1.0,
            x_offset: 0.0,
            y_offset: 0.0,
            crop_to_content: false,
        }
    }
}

/// Lookup table from object kind to its tuning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectTuningTable {
    pub garden: ObjectTuning,
    pub water_purifier: ObjectTuning,
    pub scrap_machine: ObjectTuning,
}

impl ObjectTuningTable {
    pub fn get(&self, kind: ObjectKind) -> &ObjectTuning {
        match kind {
            ObjectKind::Garden => &self.garden,
            ObjectKind::WaterPurifier => &self.water_purifier,
            ObjectKind::ScrapMachine => &self.scrap_machine,
        }
    }

    fn iter(&self) -> impl Iterator<Item = (ObjectKind, &ObjectTuning)> {
        ObjectKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }
}

/// Backdrop removal method for each asset role.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    pub room: SegmentMethod,
    pub entrance: SegmentMethod,
    pub garden: SegmentMethod,
    pub water_purifier: SegmentMethod,
    pub scrap_machine: SegmentMethod,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        // Rooms and the entrance carry white lights and doors, so only the
        // border-connected backdrop may go.
        let wall = SegmentMethod::FloodFill {
            threshold: 230,
            fringe_threshold: Some(250),
        };
        let sprite = SegmentMethod::ChromaKey {
            threshold: 230,
            soft_band: 0,
            dark_threshold: None,
        };
        Self {
            room: wall,
            entrance: wall,
            garden: sprite,
            water_purifier: sprite,
            scrap_machine: sprite,
        }
    }
}

impl SegmentationConfig {
    /// The configured method for an asset. Backgrounds are never segmented.
    pub fn method(&self, kind: AssetKind) -> SegmentMethod {
        match kind {
            AssetKind::Background => SegmentMethod::None,
            AssetKind::Room => self.room,
            AssetKind::Entrance => self.entrance,
            AssetKind::Object(ObjectKind::Garden) => self.garden,
            AssetKind::Object(ObjectKind::WaterPurifier) => self.water_purifier,
            AssetKind::Object(ObjectKind::ScrapMachine) => self.scrap_machine,
        }
    }
}

/// Room template sizing, stacking origin, and scene splitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Room template width as a fraction of the canvas (background) width.
    pub room_width_ratio: f64,
    /// Total number of rooms below the entrance.
    pub room_count: usize,
    /// Top of the first stacked element, in pixels.
    pub start_y: i32,
    /// Space left below the last room.
    pub trailing_margin: u32,
    /// Fixed number of rooms per scene. Takes precedence over `max_scene_height`.
    pub rooms_per_scene: Option<usize>,
    /// Largest scene canvas height; rooms are split across scenes to fit.
    pub max_scene_height: Option<u32>,
    /// How the background fills a canvas taller than itself.
    pub background_fit: BackgroundFit,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            room_width_ratio: 0.70,
            room_count: 3,
            start_y: 30,
            trailing_margin: 50,
            rooms_per_scene: None,
            max_scene_height: None,
            background_fit: BackgroundFit::default(),
        }
    }
}

/// One object placement, repeated over the selected rooms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementSpec {
    pub kind: ObjectKind,
    /// First slot, zero-based.
    pub start_slot: u32,
    /// Number of contiguous slots covered.
    #[serde(default = "default_slot_span")]
    pub slot_span: u32,
    /// Global room indices to place into. `None` means every room.
    #[serde(default)]
    pub rooms: Option<Vec<usize>>,
}

fn default_slot_span() -> u32 {
    1
}

impl PlacementSpec {
    pub fn applies_to(&self, room_index: usize) -> bool {
        self.rooms
            .as_ref()
            .is_none_or(|rooms| rooms.contains(&room_index))
    }
}

/// Scene output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for scene images, relative to the config file.
    pub directory: PathBuf,
    /// Scene files are named `<prefix>_<n>.png`, with `n` starting at 1.
    pub file_prefix: String,
    /// Write `scenes.json` describing every scene's geometry.
    pub manifest: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("scenes"),
            file_prefix: "scene".to_owned(),
            manifest: true,
        }
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Dedicated worker count. `None` uses the shared pool sized to the
    /// available hardware threads.
    pub workers: Option<usize>,
}

impl BunkerConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ComposeError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ComposeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check value ranges that would otherwise produce degenerate layouts.
    ///
    /// Placements that overflow the slot grid are allowed and only logged.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::Config`] listing every problem found.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        let grid = &self.grid;
        let layout = &self.layout;

        if grid.slot_count == 0 {
            problems.push("grid.slot_count must be at least 1".to_owned());
        }
        if !(0.0..0.5).contains(&grid.position_padding_ratio) {
            problems.push(format!(
                "grid.position_padding_ratio must be in [0, 0.5), got {}",
                grid.position_padding_ratio
            ));
        }
        if !grid.y_offset_factor.is_finite() {
            problems.push("grid.y_offset_factor must be finite".to_owned());
        }
        if !(grid.slot_gap_factor.is_finite() && grid.slot_gap_factor > 0.0) {
            problems.push(format!(
                "grid.slot_gap_factor must be positive, got {}",
                grid.slot_gap_factor
            ));
        }
        if grid.floor_height == Some(0) {
            problems.push("grid.floor_height must be positive when set".to_owned());
        }
        for (kind, tuning) in grid.objects.iter() {
            if !(tuning.scale.is_finite() && tuning.scale > 0.0) {
                problems.push(format!("grid.objects.{kind}.scale must be positive"));
            }
            if !(tuning.x_offset.is_finite() && tuning.y_offset.is_finite()) {
                problems.push(format!("grid.objects.{kind} offsets must be finite"));
            }
        }

        if !(layout.room_width_ratio > 0.0 && layout.room_width_ratio <= 1.0) {
            problems.push(format!(
                "layout.room_width_ratio must be in (0, 1], got {}",
                layout.room_width_ratio
            ));
        }
        if layout.room_count == 0 {
            problems.push("layout.room_count must be at least 1".to_owned());
        }
        if layout.rooms_per_scene == Some(0) {
            problems.push("layout.rooms_per_scene must be at least 1 when set".to_owned());
        }
        if layout.max_scene_height == Some(0) {
            problems.push("layout.max_scene_height must be positive when set".to_owned());
        }

        for (i, placement) in self.placements.iter().enumerate() {
            if placement.slot_span == 0 {
                problems.push(format!("placements[{i}].slot_span must be at least 1"));
            }
            if let Some(rooms) = &placement.rooms
                && let Some(bad) = rooms.iter().find(|&&r| r >= layout.room_count)
            {
                problems.push(format!(
                    "placements[{i}] names room {bad} but only {} rooms exist",
                    layout.room_count
                ));
            }
            let end = u64::from(placement.start_slot) + u64::from(placement.slot_span);
            if end > u64::from(grid.slot_count) {
                warn!(
                    index = i,
                    kind = %placement.kind,
                    start_slot = placement.start_slot,
                    slot_span = placement.slot_span,
                    slot_count = grid.slot_count,
                    "placement overflows the slot grid"
                );
            }
        }

        if self.output.file_prefix.is_empty() {
            problems.push("output.file_prefix must not be empty".to_owned());
        }
        if self.batch.workers == Some(0) {
            problems.push("batch.workers must be at least 1 when set".to_owned());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ComposeError::Config(problems.join("; ")))
        }
    }
}
