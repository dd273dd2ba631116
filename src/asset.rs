//! Asset kinds and the set of decoded source images a run works from.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::AssetPaths;
use crate::error::{ComposeError, Result};

/// Decorative objects that can be placed on a room's slot grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Hydroponic garden bed.
    Garden,
    /// Water purifier unit.
    WaterPurifier,
    /// Scrap recycling machine.
    ScrapMachine,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 3] = [Self::Garden, Self::WaterPurifier, Self::ScrapMachine];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Garden => "garden",
            Self::WaterPurifier => "water_purifier",
            Self::ScrapMachine => "scrap_machine",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = ComposeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ComposeError::Config(format!("unknown object kind `{s}`")))
    }
}

/// Every image role in a run, used for error and log context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Background,
    Room,
    Entrance,
    Object(ObjectKind),
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Background => f.write_str("background"),
            Self::Room => f.write_str("room"),
            Self::Entrance => f.write_str("entrance"),
            Self::Object(kind) => kind.fmt(f),
        }
    }
}

impl FromStr for AssetKind {
    type Err = ComposeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "background" => Ok(Self::Background),
            "room" => Ok(Self::Room),
            "entrance" => Ok(Self::Entrance),
            other => other
                .parse()
                .map(Self::Object)
                .map_err(|_| ComposeError::Config(format!("unknown asset kind `{other}`"))),
        }
    }
}

/// Decoded source images, before segmentation or scaling.
#[derive(Debug, Clone)]
pub struct AssetSet {
    pub background: RgbaImage,
    pub room: RgbaImage,
    pub entrance: Option<RgbaImage>,
    pub objects: BTreeMap<ObjectKind, RgbaImage>,
}

impl AssetSet {
    pub fn new(background: RgbaImage, room: RgbaImage) -> Self {
        Self {
            background,
            room,
            entrance: None,
            objects: BTreeMap::new(),
        }
    }

    pub fn with_entrance(mut self, entrance: RgbaImage) -> Self {
        self.entrance = Some(entrance);
        self
    }

    pub fn with_object(mut self, kind: ObjectKind, image: RgbaImage) -> Self {
        self.objects.insert(kind, image);
        self
    }

    /// Load every configured asset, resolving relative paths against `base_dir`.
    ///
    /// The background and room template are required. The entrance and object
    /// sprites are optional: an unset path or a file that does not exist is
    /// logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if a required asset is unset or missing, or if any
    /// existing file cannot be decoded.
    pub fn load(paths: &AssetPaths, base_dir: &Path) -> Result<Self> {
        let background = load_required(paths.background.as_deref(), base_dir, AssetKind::Background)?;
        let room = load_required(paths.room.as_deref(), base_dir, AssetKind::Room)?;
        let entrance = load_optional(paths.entrance.as_deref(), base_dir, AssetKind::Entrance)?;

        let mut objects = BTreeMap::new();
        for kind in ObjectKind::ALL {
            let path = paths.objects.get(kind);
            if let Some(image) = load_optional(path, base_dir, AssetKind::Object(kind))? {
                objects.insert(kind, image);
            }
        }

        info!(
            background = ?background.dimensions(),
            room = ?room.dimensions(),
            entrance = entrance.is_some(),
            objects = objects.len(),
            "assets loaded"
        );

        Ok(Self {
            background,
            room,
            entrance,
            objects,
        })
    }
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

fn load_required(path: Option<&Path>, base_dir: &Path, kind: AssetKind) -> Result<RgbaImage> {
    let path = path.ok_or(ComposeError::MissingAsset(kind))?;
    let full = resolve(base_dir, path);
    if !full.exists() {
        error!(%kind, path = %full.display(), "required asset not found");
        return Err(ComposeError::MissingAsset(kind));
    }
    load_image(&full, kind)
}

fn load_optional(path: Option<&Path>, base_dir: &Path, kind: AssetKind) -> Result<Option<RgbaImage>> {
    let Some(path) = path else {
        debug!(%kind, "no path configured, skipping");
        return Ok(None);
    };
    let full = resolve(base_dir, path);
    if !full.exists() {
        warn!(%kind, path = %full.display(), "optional asset not found, skipping");
        return Ok(None);
    }
    load_image(&full, kind).map(Some)
}

/// Decode an image file into RGBA, rejecting zero-size images.
///
/// # Errors
///
/// Returns [`ComposeError::Codec`] if decoding fails and
/// [`ComposeError::InvalidAsset`] for an empty image.
pub fn load_image(path: &Path, kind: AssetKind) -> Result<RgbaImage> {
    let image = image::open(path)?.to_rgba8();
    ensure_non_empty(&image, kind)?;
    debug!(%kind, path = %path.display(), size = ?image.dimensions(), "decoded");
    Ok(image)
}

/// Reject zero-width or zero-height images.
///
/// # Errors
///
/// Returns [`ComposeError::InvalidAsset`] naming `kind`.
pub fn ensure_non_empty(image: &RgbaImage, kind: AssetKind) -> Result<()> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return Err(ComposeError::invalid(kind, format!("image is {w}x{h}")));
    }
    Ok(())
}
