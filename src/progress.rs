//! Progress event types for scene compositing.
//!
//! Provides callback-based progress reporting that decouples the batch
//! pipeline from presentation (CLI progress bar, logs, or a host tool).

/// Progress events emitted while preparing assets and rendering scenes.
///
/// Scene events arrive from worker threads in completion order, not scene
/// order.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Templates were segmented and scaled.
    AssetsPrepared {
        /// Scaled room template size.
        room_width: u32,
        /// Scaled room template height.
        room_height: u32,
        /// Number of object sprites available for placement.
        objects: usize,
    },

    /// The room stack was partitioned into scenes.
    ScenesPlanned {
        /// Number of scenes that will be rendered.
        total: usize,
    },

    /// A worker started painting a scene.
    SceneStarted {
        /// Zero-based scene index.
        index: usize,
    },

    /// A scene was painted and handed to the output step.
    SceneFinished {
        /// Zero-based scene index.
        index: usize,
        /// Canvas width in pixels.
        width: u32,
        /// Canvas height in pixels.
        height: u32,
        /// Placements skipped for lack of a sprite.
        skipped: usize,
    },

    /// A scene failed. Other scenes keep going.
    SceneFailed {
        /// Zero-based scene index.
        index: usize,
        /// Human-readable error description.
        message: String,
    },
}

/// Callback type for receiving progress events.
///
/// Called from rayon worker threads, hence `Send + Sync`.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Deliver `event` to `callback` if one is installed.
pub(crate) fn emit(callback: Option<&ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
