//! Error types for the rasterdoc library.
//!
//! Two distinct failure modes get two distinct representations:
//!
//! * [`ExportError`], **fatal**: the document cannot be assembled at all
//!   (invalid configuration, the host's capture primitive rejected, the page
//!   sink refused a write). Returned as `Err(ExportError)` from
//!   [`crate::assemble`]. A half-assembled document has no meaningful partial
//!   value, so there is no retry and no resume inside the core.
//!
//! * [`SkipReason`], **non-fatal**: a single block produced geometry the
//!   placement math cannot use (zero-sized bitmap, unusable scale factor).
//!   The block is skipped, the cursor is left untouched, and a
//!   [`crate::output::BlockSkip`] record lands in the assembly output so the
//!   host can inspect what was dropped instead of losing the whole document
//!   to one degenerate block.

use thiserror::Error;

/// All fatal errors returned by the rasterdoc library.
///
/// Per-block degradations use [`SkipReason`] and are stored in
/// [`crate::output::AssemblyOutput::skips`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ExportError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Capture errors ────────────────────────────────────────────────────
    /// The host's render primitive rejected while capturing a block.
    ///
    /// Fatal for the current document: the cursor state after a partially
    /// captured block is meaningless. The host decides whether to record
    /// this as a per-document failure and move on to the next document.
    #[error("Rasterisation failed for block {block}: {detail}")]
    RenderFailed { block: usize, detail: String },

    // ── Encoding errors ───────────────────────────────────────────────────
    /// PNG encoding of a bitmap slice failed.
    #[error("Failed to encode slice [{y_px}, {y_px}+{height_px}) of a {width_px}x{bitmap_height_px} bitmap: {detail}")]
    SliceEncodeFailed {
        y_px: u32,
        height_px: u32,
        width_px: u32,
        bitmap_height_px: u32,
        detail: String,
    },

    // ── Sink errors ───────────────────────────────────────────────────────
    /// The page sink rejected a page, an image placement, or finalisation.
    #[error("Page sink error: {detail}")]
    Sink { detail: String },
}

/// Opaque capture failure reported by a [`crate::dom::ContentBlock`] host.
///
/// The host fills in whatever its render primitive said; the rasterizer maps
/// it to [`ExportError::RenderFailed`] with the offending block index.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct RenderError(pub String);

impl RenderError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }
}

/// Why a block (or row) was skipped instead of placed.
///
/// Recovered locally: no image is placed, the cursor does not advance, and
/// assembly continues with the next block. Never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum SkipReason {
    /// The captured bitmap had a zero width or height.
    #[error("captured bitmap is empty (zero width or height)")]
    EmptyBitmap,

    /// No placement height could be derived at the document's scale: the
    /// mm-per-pixel factor was zero or non-finite, or a full empty page
    /// holds less than one source pixel.
    #[error("scale factor is unusable for placement at this page size")]
    UnusableScale,
}
