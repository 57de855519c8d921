//! Configuration types for document assembly.
//!
//! All assembly behaviour is controlled through [`ExportConfig`], built via
//! its [`ExportConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across documents, serialise them for logging,
//! and diff two runs to understand why their outputs differ.
//!
//! # Design choice: named tunables over magic numbers
//! The row detector and slice engine depend on several empirically tuned
//! tolerances (clustering tolerance, bleed allowances, rounding epsilons).
//! They are collected in [`Tunables`] as named, overridable fields with
//! documented defaults rather than buried as literals in the algorithms, so
//! hosts with a different card/chart visual style can retune them without
//! forking the math.

use crate::error::ExportError;
use crate::geometry::PageGeometry;
use crate::progress::AssemblyProgress;
use crate::writer::WriterOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Page format, resolved to millimetres before any math happens.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PageFormat {
    /// US Letter, 215.9 × 279.4 mm (default).
    #[default]
    Letter,
    /// ISO A4, 210 × 297 mm.
    A4,
    /// US Legal, 215.9 × 355.6 mm.
    Legal,
    /// Arbitrary portrait-form dimensions in millimetres.
    Custom { width_mm: f64, height_mm: f64 },
}

impl PageFormat {
    /// Portrait-form `(width_mm, height_mm)` of this format.
    pub fn size_mm(&self) -> (f64, f64) {
        match self {
            PageFormat::Letter => (215.9, 279.4),
            PageFormat::A4 => (210.0, 297.0),
            PageFormat::Legal => (215.9, 355.6),
            PageFormat::Custom { width_mm, height_mm } => (*width_mm, *height_mm),
        }
    }

    /// `(width_mm, height_mm)` after applying the orientation.
    pub fn oriented_size_mm(&self, orientation: Orientation) -> (f64, f64) {
        let (w, h) = self.size_mm();
        match orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }
}

/// Empirically tuned tolerances used by row detection and slicing.
///
/// The defaults were calibrated against responsive card grids with drop
/// shadows and animated chart canvases; they are deliberately conservative
/// (more bleed, earlier page breaks) because clipping a chart is a worse
/// failure than wasting a few millimetres of page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tunables {
    /// Children whose offset tops agree within this many CSS pixels belong
    /// to the same visual row. Absorbs sub-pixel layout jitter across
    /// wrapped rows that are visually aligned. Default: 2.0.
    pub cluster_tolerance_px: f64,

    /// Row bleed used when the grid's computed `row-gap` cannot be resolved.
    /// Default: 8.0.
    pub default_row_gap_px: f64,

    /// Extra bleed added on top of the row gap, covering shadows and chart
    /// overflow that paint outside the layout box. Default: 12.0.
    pub extra_row_bleed_px: f64,

    /// Safety margin subtracted from the remaining page space when slicing,
    /// so floating-point rounding can never push a slice past the bottom
    /// margin. Default: 0.5.
    pub slice_epsilon_mm: f64,

    /// A row is forced onto a fresh page unless it fits with this much room
    /// to spare below it, avoiding a near-full-page break directly above the
    /// next row. Default: 1.0.
    pub row_bottom_padding_mm: f64,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            cluster_tolerance_px: 2.0,
            default_row_gap_px: 8.0,
            extra_row_bleed_px: 12.0,
            slice_epsilon_mm: 0.5,
            row_bottom_padding_mm: 1.0,
        }
    }
}

/// Configuration for assembling one (or many) documents.
///
/// Built via [`ExportConfig::builder()`] or [`ExportConfig::default()`].
///
/// # Example
/// ```rust
/// use rasterdoc::{ExportConfig, Orientation, PageFormat};
///
/// let config = ExportConfig::builder()
///     .orientation(Orientation::Landscape)
///     .page_format(PageFormat::A4)
///     .return_blob(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExportConfig {
    /// Page orientation. Default: portrait.
    pub orientation: Orientation,

    /// Page format. Default: Letter.
    pub page_format: PageFormat,

    /// Uniform page margin in millimetres. Default: 12.7 (half an inch).
    ///
    /// With Letter portrait this yields the 190.5 mm content width that all
    /// block heights are scaled against.
    pub margin_mm: f64,

    /// Render density multiplier passed to the capture primitive. Default: 2.0.
    ///
    /// Capturing at 2× and scaling down to content width keeps text and
    /// hairlines crisp in print. Higher values grow capture memory
    /// quadratically for marginal visible gain.
    pub pixel_scale: f32,

    /// Fixed logical viewport width in CSS pixels. Default: 1440.
    ///
    /// Responsive grids wrap differently per viewport; pinning the width
    /// makes the exported row structure deterministic regardless of the
    /// window the export was triggered from.
    pub viewport_width_px: u32,

    /// Per-image wait budget for the capture primitive, in milliseconds.
    /// Default: 15_000. Generous but bounded: a dead image URL degrades to a
    /// blank box instead of hanging the export.
    pub image_timeout_ms: u64,

    /// Background fill for the capture. Default: `"#ffffff"`.
    pub background_color: String,

    /// Animation-frame ticks to wait before capture. Default: 3.
    ///
    /// Two frames guarantee a committed paint; the third absorbs chart
    /// libraries that schedule their final frame from a frame callback.
    pub settle_frames: u32,

    /// Fixed settle delay after the frame ticks, in milliseconds.
    /// Default: 200. Covers chart transition animations that are time-based
    /// rather than frame-based.
    pub settle_delay_ms: u64,

    /// Forward stream compression to the writer. Default: true.
    pub compression: bool,

    /// Coordinate precision forwarded to the writer, in decimal digits.
    /// Default: 16.
    pub precision: u8,

    /// `true`: finalise to an in-memory blob (bulk packaging);
    /// `false`: the sink saves/downloads. Default: false.
    pub return_blob: bool,

    /// Row-detection and slicing tolerances. Default: [`Tunables::default`].
    pub tunables: Tunables,

    /// Optional per-block progress events. Default: none.
    pub progress: Option<Arc<dyn AssemblyProgress>>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::Portrait,
            page_format: PageFormat::Letter,
            margin_mm: 12.7,
            pixel_scale: 2.0,
            viewport_width_px: 1440,
            image_timeout_ms: 15_000,
            background_color: "#ffffff".to_string(),
            settle_frames: 3,
            settle_delay_ms: 200,
            compression: true,
            precision: 16,
            return_blob: false,
            tunables: Tunables::default(),
            progress: None,
        }
    }
}

impl fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportConfig")
            .field("orientation", &self.orientation)
            .field("page_format", &self.page_format)
            .field("margin_mm", &self.margin_mm)
            .field("pixel_scale", &self.pixel_scale)
            .field("viewport_width_px", &self.viewport_width_px)
            .field("image_timeout_ms", &self.image_timeout_ms)
            .field("background_color", &self.background_color)
            .field("settle_frames", &self.settle_frames)
            .field("settle_delay_ms", &self.settle_delay_ms)
            .field("compression", &self.compression)
            .field("precision", &self.precision)
            .field("return_blob", &self.return_blob)
            .field("tunables", &self.tunables)
            .field("progress", &self.progress.as_ref().map(|_| "<dyn AssemblyProgress>"))
            .finish()
    }
}

impl ExportConfig {
    /// Create a new builder for `ExportConfig`.
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder {
            config: Self::default(),
        }
    }

    /// Validated page geometry for this config.
    pub fn geometry(&self) -> Result<PageGeometry, ExportError> {
        let (w, h) = self.page_format.oriented_size_mm(self.orientation);
        PageGeometry::new(w, h, self.margin_mm)
    }

    /// Options the host needs to construct its [`crate::writer::PageSink`].
    pub fn writer_options(&self) -> WriterOptions {
        WriterOptions {
            orientation: self.orientation,
            page_format: self.page_format,
            compression: self.compression,
            precision: self.precision,
            return_blob: self.return_blob,
        }
    }
}

/// Builder for [`ExportConfig`].
#[derive(Debug)]
pub struct ExportConfigBuilder {
    config: ExportConfig,
}

impl ExportConfigBuilder {
    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.config.orientation = orientation;
        self
    }

    pub fn page_format(mut self, format: PageFormat) -> Self {
        self.config.page_format = format;
        self
    }

    pub fn margin_mm(mut self, mm: f64) -> Self {
        self.config.margin_mm = mm;
        self
    }

    pub fn pixel_scale(mut self, scale: f32) -> Self {
        self.config.pixel_scale = scale;
        self
    }

    pub fn viewport_width_px(mut self, px: u32) -> Self {
        self.config.viewport_width_px = px;
        self
    }

    pub fn image_timeout_ms(mut self, ms: u64) -> Self {
        self.config.image_timeout_ms = ms;
        self
    }

    pub fn background_color(mut self, color: impl Into<String>) -> Self {
        self.config.background_color = color.into();
        self
    }

    pub fn settle_frames(mut self, frames: u32) -> Self {
        self.config.settle_frames = frames;
        self
    }

    pub fn settle_delay_ms(mut self, ms: u64) -> Self {
        self.config.settle_delay_ms = ms;
        self
    }

    pub fn compression(mut self, v: bool) -> Self {
        self.config.compression = v;
        self
    }

    pub fn precision(mut self, digits: u8) -> Self {
        self.config.precision = digits;
        self
    }

    pub fn return_blob(mut self, v: bool) -> Self {
        self.config.return_blob = v;
        self
    }

    pub fn tunables(mut self, tunables: Tunables) -> Self {
        self.config.tunables = tunables;
        self
    }

    pub fn progress(mut self, callback: Arc<dyn AssemblyProgress>) -> Self {
        self.config.progress = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// Geometry invariants (`margin < page_height / 2`, positive content
    /// width) are checked here so every later stage can assume them.
    pub fn build(self) -> Result<ExportConfig, ExportError> {
        let c = &self.config;
        // Runs the PageGeometry invariants against the oriented format.
        c.geometry()?;
        if !(c.pixel_scale.is_finite() && c.pixel_scale > 0.0) {
            return Err(ExportError::InvalidConfig(format!(
                "pixel_scale must be positive and finite, got {}",
                c.pixel_scale
            )));
        }
        if c.viewport_width_px == 0 {
            return Err(ExportError::InvalidConfig(
                "viewport_width_px must be ≥ 1".into(),
            ));
        }
        let t = &c.tunables;
        if t.cluster_tolerance_px < 0.0
            || t.default_row_gap_px < 0.0
            || t.extra_row_bleed_px < 0.0
            || t.slice_epsilon_mm < 0.0
            || t.row_bottom_padding_mm < 0.0
        {
            return Err(ExportError::InvalidConfig(
                "tunables must be non-negative".into(),
            ));
        }
        Ok(self.config)
    }
}
