//! Batch pipeline: prepare templates once, then render every scene in
//! parallel.
//!
//! Prepared templates and the config are shared read-only by all workers;
//! each scene task owns its own canvas. A failing scene is recorded in the
//! [`BatchReport`] and never cancels its siblings.

use std::collections::BTreeMap;

use image::RgbaImage;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::asset::{AssetKind, AssetSet, ObjectKind, ensure_non_empty};
use crate::compositor::{self, RenderedScene};
use crate::config::BunkerConfig;
use crate::error::{ComposeError, Result};
use crate::progress::{self, ProgressCallback, ProgressEvent};
use crate::scale;
use crate::scene::{self, LayoutDims, ScenePlan};
use crate::segment::{self, crop_to_content};

/// Segmented and scaled templates, ready for compositing.
#[derive(Debug, Clone)]
pub struct PreparedAssets {
    pub background: RgbaImage,
    /// Room template at its final on-canvas size.
    pub room: RgbaImage,
    /// Entrance at the same scale factor as the room.
    pub entrance: Option<RgbaImage>,
    /// Segmented object sprites at source resolution; the grid resolver
    /// scales them per placement.
    pub objects: BTreeMap<ObjectKind, RgbaImage>,
}

impl PreparedAssets {
    pub fn dims(&self) -> LayoutDims {
        LayoutDims {
            canvas_width: self.background.width(),
            background_height: self.background.height(),
            room: self.room.dimensions(),
            entrance: self.entrance.as_ref().map(RgbaImage::dimensions),
        }
    }
}

/// Scale factor taking the source room template to its on-canvas size.
///
/// `grid.floor_height` wins when set; otherwise the room spans
/// `layout.room_width_ratio` of the background width.
pub fn room_scale_factor(config: &BunkerConfig, background_width: u32, room: (u32, u32)) -> f64 {
    match config.grid.floor_height {
        Some(height) => f64::from(height) / f64::from(room.1),
        None => f64::from(background_width) * config.layout.room_width_ratio / f64::from(room.0),
    }
}

/// Segment and scale every source image according to `config`.
///
/// # Errors
///
/// Returns [`ComposeError::InvalidAsset`] for any empty source image.
pub fn prepare(assets: &AssetSet, config: &BunkerConfig) -> Result<PreparedAssets> {
    let seg = &config.segmentation;

    ensure_non_empty(&assets.background, AssetKind::Background)?;
    ensure_non_empty(&assets.room, AssetKind::Room)?;

    let factor = room_scale_factor(config, assets.background.width(), assets.room.dimensions());
    let room = segment::segment(&assets.room, seg.method(AssetKind::Room));
    let room = scale::scale_by(&room, factor, AssetKind::Room)?;

    let entrance = match &assets.entrance {
        Some(source) => {
            ensure_non_empty(source, AssetKind::Entrance)?;
            let keyed = segment::segment(source, seg.method(AssetKind::Entrance));
            Some(scale::scale_by(&keyed, factor, AssetKind::Entrance)?)
        }
        None => None,
    };

    let mut objects = BTreeMap::new();
    for (&kind, source) in &assets.objects {
        let asset = AssetKind::Object(kind);
        ensure_non_empty(source, asset)?;
        let mut keyed = segment::segment(source, seg.method(asset));
        if config.grid.tuning(kind).crop_to_content {
            keyed = crop_to_content(&keyed);
        }
        objects.insert(kind, keyed);
    }

    info!(
        factor,
        room = ?room.dimensions(),
        entrance = ?entrance.as_ref().map(RgbaImage::dimensions),
        objects = objects.len(),
        "templates prepared"
    );

    Ok(PreparedAssets {
        background: assets.background.clone(),
        room,
        entrance,
        objects,
    })
}

/// Result of one scene task.
#[derive(Debug)]
pub struct SceneOutcome<T> {
    pub index: usize,
    pub result: Result<T>,
}

/// Per-scene results of a batch, in scene order.
#[derive(Debug)]
pub struct BatchReport<T> {
    pub outcomes: Vec<SceneOutcome<T>>,
}

impl<T> BatchReport<T> {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn succeeded(&self) -> impl Iterator<Item = (usize, &T)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|v| (o.index, v)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (usize, &ComposeError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.index, e)))
    }

    /// All successful values, or the first scene error.
    ///
    /// # Errors
    ///
    /// Returns the error of the lowest-indexed failed scene.
    pub fn into_result(self) -> Result<Vec<T>> {
        self.outcomes.into_iter().map(|o| o.result).collect()
    }
}

/// Render every planned scene on the worker pool and pass each canvas to
/// `finish` (typically an encoder that writes it to disk).
///
/// Scenes run independently; a failure in painting or in `finish` is
/// recorded against that scene only.
///
/// # Errors
///
/// Returns [`ComposeError::Batch`] only if a dedicated worker pool cannot be
/// created. Scene failures are reported inside the [`BatchReport`].
pub fn render_all<T, F>(
    plans: &[ScenePlan],
    assets: &PreparedAssets,
    config: &BunkerConfig,
    progress: Option<&ProgressCallback>,
    finish: F,
) -> Result<BatchReport<T>>
where
    T: Send,
    F: Fn(RenderedScene) -> Result<T> + Sync,
{
    let run = || -> Vec<SceneOutcome<T>> {
        plans
            .par_iter()
            .map(|plan| {
                progress::emit(progress, ProgressEvent::SceneStarted { index: plan.index });
                let result = compositor::compose_scene(plan, assets, config)
                    .and_then(|rendered| {
                        let (width, height) = rendered.image.dimensions();
                        let skipped = rendered.skipped.len();
                        let value = finish(rendered)?;
                        progress::emit(
                            progress,
                            ProgressEvent::SceneFinished {
                                index: plan.index,
                                width,
                                height,
                                skipped,
                            },
                        );
                        Ok(value)
                    })
                    .map_err(|e| e.in_scene(plan.index));

                if let Err(e) = &result {
                    warn!(scene = plan.index, error = %e, "scene failed");
                    progress::emit(
                        progress,
                        ProgressEvent::SceneFailed {
                            index: plan.index,
                            message: e.to_string(),
                        },
                    );
                }
                SceneOutcome {
                    index: plan.index,
                    result,
                }
            })
            .collect()
    };

    let outcomes = match config.batch.workers {
        Some(workers) => rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("bunkermap-scene-{i}"))
            .build()
            .map_err(|e| ComposeError::Batch(e.to_string()))?
            .install(run),
        None => run(),
    };

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    info!(scenes = outcomes.len(), failed, "batch finished");
    Ok(BatchReport { outcomes })
}

/// Validate, prepare, plan, and render in one call, keeping the canvases in
/// memory.
///
/// # Errors
///
/// Returns an error if the config is invalid, a template is malformed, or the
/// layout is degenerate. Per-scene failures are inside the report.
pub fn compose(
    assets: &AssetSet,
    config: &BunkerConfig,
    progress: Option<&ProgressCallback>,
) -> Result<BatchReport<RenderedScene>> {
    config.validate()?;
    let prepared = prepare(assets, config)?;
    progress::emit(
        progress,
        ProgressEvent::AssetsPrepared {
            room_width: prepared.room.width(),
            room_height: prepared.room.height(),
            objects: prepared.objects.len(),
        },
    );

    let plans = scene::plan_scenes(config, &prepared.dims())?;
    progress::emit(progress, ProgressEvent::ScenesPlanned { total: plans.len() });

    render_all(&plans, &prepared, config, progress, Ok)
}
