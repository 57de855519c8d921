//! Host-side content contracts: block handles, render options, and measured
//! grid geometry.
//!
//! The engine never touches a real DOM. Everything platform-bound (waiting
//! for fonts, watching `<img>` loads, reading `getBoundingClientRect`) lives
//! behind [`ContentBlock`], implemented by the embedding host (a headless
//! browser driver, a UI runtime, a test fake). What crosses the seam is plain
//! geometry, which keeps the pagination and row-detection math pure and
//! testable with synthetic numbers.

use crate::bitmap::Bitmap;
use crate::error::RenderError;

/// Options passed to the host's render primitive for every capture.
///
/// The set is fixed and documented so two exports of the same content are
/// pixel-identical: density, viewport, and background are never inferred
/// from the live environment.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RenderOptions {
    /// Render density multiplier. 2.0 doubles the device pixels per CSS
    /// pixel, keeping text crisp after the print-space downscale.
    pub pixel_scale: f32,

    /// Fixed logical viewport width in CSS pixels, so responsive breakpoints
    /// resolve the same way on every machine that runs the export.
    pub logical_viewport_width: u32,

    /// Allow loading cross-origin images into the capture.
    pub cross_origin_images: bool,

    /// Upper bound the renderer may spend waiting on an image, so a dead
    /// image URL cannot stall the capture forever.
    pub image_timeout_ms: u64,

    /// Explicit background fill; transparent regions would otherwise come
    /// out black in writers that flatten alpha.
    pub background_color: String,
}

/// A renderable content block, as seen by the engine.
///
/// One value per DOM subtree the host wants exported. The readiness methods
/// encode the capture protocol (see [`crate::pipeline::raster`]); each must
/// resolve eventually. In particular `wait_images_settled` must treat both
/// `load` and `error` as settled and must ignore images whose `src` is empty
/// or the literal string `"undefined"`, so a broken image can never block an
/// export.
#[allow(async_fn_in_trait)]
pub trait ContentBlock {
    /// The block's layout width in CSS pixels. Used to convert inspector
    /// coordinates (CSS px) into captured-bitmap coordinates (device px).
    fn width_px(&self) -> f64;

    /// Resolve on the host's next UI tick, after pending reactive updates
    /// have been flushed into the DOM.
    async fn wait_next_tick(&self);

    /// Resolve once web fonts are loaded (or the host has given up on them).
    async fn wait_fonts_ready(&self);

    /// Resolve once every eligible `<img>` inside the block has loaded or
    /// errored.
    async fn wait_images_settled(&self);

    /// Resolve after `frames` animation-frame ticks.
    async fn wait_animation_frames(&self, frames: u32);

    /// Capture the block into a [`Bitmap`] using the host's render primitive.
    ///
    /// # Errors
    /// Any internal capture failure, verbatim. The engine treats it as fatal
    /// for the current document and never retries.
    async fn capture(&self, options: &RenderOptions) -> Result<Bitmap, RenderError>;

    /// Measured geometry of the block's *closest* (minimal DOM depth) grid
    /// descendant, or `None` when the block contains no grid.
    ///
    /// Row detection works on this measurement of what is actually rendered,
    /// never on markup structure, so the export matches what the user sees.
    fn grid_layout(&self) -> Option<GridLayout>;
}

/// Measured geometry of a grid container, in CSS pixels.
///
/// Produced by the host's layout inspector from live DOM geometry
/// (`offsetTop`, bounding rects, computed style). All child coordinates are
/// relative to the grid box; `top_px` anchors the grid inside the block.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GridLayout {
    /// Grid top relative to the block root (the pre-grid header height).
    pub top_px: f64,

    /// Height of the grid box itself.
    pub height_px: f64,

    /// Computed `row-gap`, when the inspector could resolve it to pixels.
    /// `None` falls back to [`crate::config::Tunables::default_row_gap_px`].
    pub row_gap_px: Option<f64>,

    /// Direct children of the grid, in DOM order.
    pub children: Vec<ChildGeometry>,
}

/// Geometry of one direct grid child, relative to the grid box.
///
/// Two coordinate kinds are carried on purpose: the offset top (margin box)
/// is stable across sub-pixel rendering and drives row *clustering*, while
/// bounding rects capture what is actually painted (shadows, overflowing
/// chart canvases) and drive the row's *extent*.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ChildGeometry {
    /// Margin-box top (offset geometry).
    pub offset_top_px: f64,
    /// Painted bounding-rect top.
    pub rect_top_px: f64,
    /// Painted bounding-rect bottom.
    pub rect_bottom_px: f64,
}
