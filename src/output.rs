//! Writing scene canvases and the scene manifest to disk.
//!
//! Scenes are written as `<prefix>_<n>.png` with `n` starting at 1. When the
//! run is split, `scenes.json` records where each scene sits in the global
//! bunker so a consumer can stitch them back together.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::compositor::RenderedScene;
use crate::error::Result;
use crate::geometry::Rect;

/// File name of the scene manifest.
pub const MANIFEST_FILE: &str = "scenes.json";

/// File name for the zero-based scene `index`.
pub fn scene_file_name(prefix: &str, index: usize) -> String {
    format!("{prefix}_{}.png", index + 1)
}

/// One manifest row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub index: usize,
    pub file: String,
    pub width: u32,
    pub height: u32,
    /// Offset of the scene's top edge in the global bunker.
    pub origin_y: i32,
    /// Global room indices shown in this scene.
    pub rooms: Vec<usize>,
    /// Room rectangles in scene coordinates.
    pub room_rects: Vec<Rect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrance: Option<Rect>,
}

impl ManifestEntry {
    pub fn from_scene(scene: &RenderedScene, prefix: &str) -> Self {
        let plan = &scene.plan;
        Self {
            index: plan.index,
            file: scene_file_name(prefix, plan.index),
            width: scene.image.width(),
            height: scene.image.height(),
            origin_y: plan.origin_y,
            rooms: plan.room_indices().collect(),
            room_rects: plan.rooms.clone(),
            entrance: plan.entrance,
        }
    }
}

/// Encode `scene` as PNG into `dir`, returning the written path.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or encoding fails.
pub fn write_scene(scene: &RenderedScene, dir: &Path, prefix: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(scene_file_name(prefix, scene.plan.index));
    scene.image.save(&path)?;
    info!(
        scene = scene.plan.index,
        path = %path.display(),
        width = scene.image.width(),
        height = scene.image.height(),
        "scene written"
    );
    Ok(path)
}

/// Write the manifest for `entries`, sorted by scene index.
///
/// # Errors
///
/// Returns an error if serialisation or the write fails.
pub fn write_manifest(dir: &Path, mut entries: Vec<ManifestEntry>) -> Result<PathBuf> {
    entries.sort_by_key(|e| e.index);
    std::fs::create_dir_all(dir)?;
    let path = dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(&entries)?;
    std::fs::write(&path, json)?;
    Ok(path)
}

/// Read a manifest written by [`write_manifest`].
///
/// # Errors
///
/// Returns an error if the file is missing or malformed.
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestEntry>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
