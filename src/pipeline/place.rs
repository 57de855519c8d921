//! Page cursor and the three-strategy placement planner.
//!
//! This is the pagination state machine. For every region (a whole block or
//! one detected grid row, the algorithm is the same) it tries, in order:
//!
//! 1. **Whole-page fit**: the region fits the space left on the current
//!    page → place at the cursor and advance.
//! 2. **Fresh-page fit**: it would fit an empty page → break, place at the
//!    top margin.
//! 3. **Slice fallback**: taller than any page → hand off to the slice
//!    engine ([`crate::pipeline::slice`]).
//!
//! The ordering is the load-bearing decision: a logical unit (a chart, a
//! card row) stays on one page whenever that is possible at all, and only
//! content that cannot fit a page by itself ever gets cut.

use crate::bitmap::Bitmap;
use crate::config::Tunables;
use crate::error::{ExportError, SkipReason};
use crate::geometry::PageGeometry;
use crate::pipeline::slice;
use crate::writer::PageSink;
use tracing::debug;

/// Current write position: which page, and how far down it, in millimetres.
///
/// `y_mm` always stays within `[margin, page_height − margin]`. Exactly one
/// cursor exists per document and it only moves forward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    /// 0-indexed page currently being written.
    pub page_index: usize,
    /// Vertical offset from the page top, in millimetres.
    pub y_mm: f64,
}

impl Cursor {
    /// Cursor at the top margin of the first page.
    pub fn top(geom: &PageGeometry) -> Self {
        Self {
            page_index: 0,
            y_mm: geom.margin_mm,
        }
    }

    /// Vertical space left on the current page, never negative.
    pub fn remaining_mm(&self, geom: &PageGeometry) -> f64 {
        (geom.bottom_limit_mm() - self.y_mm).max(0.0)
    }

    fn advanced(self, height_mm: f64) -> Self {
        Self {
            page_index: self.page_index,
            y_mm: self.y_mm + height_mm,
        }
    }
}

/// Append a fresh page to the sink and return the cursor at its top margin.
pub fn start_new_page<W: PageSink>(
    sink: &mut W,
    geom: &PageGeometry,
    cursor: &Cursor,
) -> Result<Cursor, ExportError> {
    sink.add_page(geom.page_width_mm, geom.page_height_mm)?;
    debug!("Started page {}", cursor.page_index + 1);
    Ok(Cursor {
        page_index: cursor.page_index + 1,
        y_mm: geom.margin_mm,
    })
}

/// Which strategy a region ended up using.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Placement {
    /// Placed in the remaining space of the current page.
    Whole,
    /// Placed at the top of a freshly started page.
    FreshPage,
    /// Split across `pages` additional pages by the slice engine.
    Sliced { pages: usize },
    /// Nothing placed; cursor unchanged.
    Skipped(SkipReason),
}

/// Place the vertical bitmap region `[y_px, y_px+height_px)`.
///
/// `bottom_padding_mm` participates only in the current-page fit check: row
/// placement passes [`Tunables::row_bottom_padding_mm`] so a row is forced
/// onto a fresh page instead of landing flush against the bottom margin with
/// the next row starting a new page anyway. Whole-block placement passes 0.
///
/// Returns the advanced cursor and the strategy used. Unusable geometry
/// (zero-width bitmap, non-finite height) is reported as
/// [`Placement::Skipped`] with the cursor untouched, never as an error.
pub fn place_region<W: PageSink>(
    sink: &mut W,
    geom: &PageGeometry,
    tunables: &Tunables,
    bitmap: &Bitmap,
    y_px: u32,
    height_px: u32,
    cursor: Cursor,
    bottom_padding_mm: f64,
) -> Result<(Cursor, Placement), ExportError> {
    let Some(mm_per_px) = geom.mm_per_px(bitmap.width_px()) else {
        return Ok((cursor, Placement::Skipped(SkipReason::UnusableScale)));
    };
    if height_px == 0 {
        return Ok((cursor, Placement::Skipped(SkipReason::EmptyBitmap)));
    }
    let height_mm = height_px as f64 * mm_per_px;
    if !height_mm.is_finite() || height_mm <= 0.0 {
        return Ok((cursor, Placement::Skipped(SkipReason::UnusableScale)));
    }
    let width_mm = geom.content_width_mm();

    // Strategy 1: whole-page fit in the remaining space.
    if height_mm + bottom_padding_mm <= cursor.remaining_mm(geom) {
        let data_url = bitmap.slice_data_url(y_px, height_px)?;
        sink.add_image(&data_url, geom.margin_mm, cursor.y_mm, width_mm, height_mm)?;
        debug!(
            "Placed region ({:.2} mm) on page {} at y={:.2}",
            height_mm, cursor.page_index, cursor.y_mm
        );
        return Ok((cursor.advanced(height_mm), Placement::Whole));
    }

    // Strategy 2: fresh-page fit.
    if height_mm <= geom.content_height_mm() {
        let cursor = start_new_page(sink, geom, &cursor)?;
        let data_url = bitmap.slice_data_url(y_px, height_px)?;
        sink.add_image(&data_url, geom.margin_mm, cursor.y_mm, width_mm, height_mm)?;
        debug!(
            "Placed region ({:.2} mm) on fresh page {}",
            height_mm, cursor.page_index
        );
        return Ok((cursor.advanced(height_mm), Placement::FreshPage));
    }

    // Strategy 3: taller than any page, slice across pages.
    let (cursor, pages, unplaced_px) =
        slice::place_sliced(sink, geom, tunables, bitmap, y_px, height_px, cursor)?;
    if unplaced_px > 0 {
        // The slice engine refused before emitting anything: a full page
        // holds less than one source pixel, so the region is unplaceable at
        // this scale. Report a skip, not a placement.
        return Ok((cursor, Placement::Skipped(SkipReason::UnusableScale)));
    }
    Ok((cursor, Placement::Sliced { pages }))
}
