//! Slice engine: split a region taller than a page across pages.
//!
//! Fallback of last resort. The planner only lands here for content that
//! cannot fit an empty page whole (the fit fast-paths live in
//! [`crate::pipeline::place`]). The loop consumes as much of the remaining
//! page space as fits
//! (minus a small epsilon so floating-point rounding can never overflow the
//! bottom margin), starts a new page, and continues until the source pixel
//! range is exhausted.
//!
//! Source ranges are integer pixels, so "sum of placed slice heights equals
//! the region height" holds exactly, and the loop terminates in
//! `ceil(height_mm / page_content_height_mm)` iterations.

use crate::bitmap::Bitmap;
use crate::config::Tunables;
use crate::error::ExportError;
use crate::geometry::PageGeometry;
use crate::pipeline::place::{start_new_page, Cursor};
use crate::writer::PageSink;
use tracing::{debug, warn};

/// Paginate the bitmap region `[y_px, y_px+height_px)` across pages.
///
/// Returns the cursor after the final residual slice, the number of page
/// breaks emitted, and the count of source pixels left unplaced. The caller
/// has already established that the region is taller than one page; slices
/// are cut to the per-page pixel budget
/// `floor((remaining_mm − epsilon) / mm_per_px)`.
///
/// When a whole empty page holds less than one pixel (the page is far wider
/// than it is tall relative to this bitmap), no finite number of pages can
/// make progress. That is detected before anything is emitted: the cursor
/// comes back untouched and the entire region is reported unplaced, so the
/// caller can record the skip.
pub fn place_sliced<W: PageSink>(
    sink: &mut W,
    geom: &PageGeometry,
    tunables: &Tunables,
    bitmap: &Bitmap,
    y_px: u32,
    height_px: u32,
    mut cursor: Cursor,
) -> Result<(Cursor, usize, u32), ExportError> {
    let src_y_start = y_px.min(bitmap.height_px());
    let region_px = height_px.min(bitmap.height_px() - src_y_start);

    let Some(mm_per_px) = geom.mm_per_px(bitmap.width_px()) else {
        return Ok((cursor, 0, region_px));
    };
    let width_mm = geom.content_width_mm();

    // An empty page must hold at least one pixel, or the loop below could
    // never take anything and would break pages forever.
    let fresh_page_mm = geom.content_height_mm() - tunables.slice_epsilon_mm;
    let fresh_page_budget_px = if fresh_page_mm > 0.0 {
        (fresh_page_mm / mm_per_px).floor() as u32
    } else {
        0
    };
    if fresh_page_budget_px == 0 {
        warn!(
            "Slice refused: a full page holds less than one pixel ({region_px} px unplaceable)"
        );
        return Ok((cursor, 0, region_px));
    }

    let mut src_y = src_y_start;
    let mut remaining_px = region_px;
    let mut pages_added = 0usize;

    while remaining_px > 0 {
        let avail_mm = cursor.remaining_mm(geom) - tunables.slice_epsilon_mm;
        let budget_px = if avail_mm > 0.0 {
            (avail_mm / mm_per_px).floor().min(remaining_px as f64) as u32
        } else {
            0
        };

        if budget_px == 0 {
            // Mid-page with no room left; the fresh page is known to hold
            // at least one pixel, so this cannot recur at the page top.
            cursor = start_new_page(sink, geom, &cursor)?;
            pages_added += 1;
            continue;
        }

        let slice_mm = budget_px as f64 * mm_per_px;
        let data_url = bitmap.slice_data_url(src_y, budget_px)?;
        sink.add_image(&data_url, geom.margin_mm, cursor.y_mm, width_mm, slice_mm)?;
        debug!(
            "Placed slice [{}, {}) px ({:.2} mm) on page {}",
            src_y,
            src_y + budget_px,
            slice_mm,
            cursor.page_index
        );

        cursor = Cursor {
            page_index: cursor.page_index,
            y_mm: cursor.y_mm + slice_mm,
        };
        src_y += budget_px;
        remaining_px -= budget_px;

        if remaining_px > 0 {
            cursor = start_new_page(sink, geom, &cursor)?;
            pages_added += 1;
        }
    }

    Ok((cursor, pages_added, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::DocumentOutput;
    use image::{Rgba, RgbaImage};

    #[derive(Default)]
    struct RecordingSink {
        pages: usize,
        /// (page, y_mm, height_mm)
        images: Vec<(usize, f64, f64)>,
    }

    impl PageSink for RecordingSink {
        fn add_page(&mut self, _w: f64, _h: f64) -> Result<(), ExportError> {
            self.pages += 1;
            Ok(())
        }

        fn add_image(
            &mut self,
            _data_url: &str,
            _x: f64,
            y_mm: f64,
            _w: f64,
            height_mm: f64,
        ) -> Result<(), ExportError> {
            self.images.push((self.pages, y_mm, height_mm));
            Ok(())
        }

        fn finalize(self) -> Result<DocumentOutput, ExportError> {
            Ok(DocumentOutput::Saved)
        }
    }

    fn letter() -> PageGeometry {
        PageGeometry::new(215.9, 279.4, 12.7).unwrap()
    }

    fn bitmap(width: u32, height: u32) -> Bitmap {
        Bitmap::new(RgbaImage::from_pixel(width, height, Rgba([9, 9, 9, 255])))
    }

    fn run(bm: &Bitmap) -> (RecordingSink, Cursor, usize) {
        let geom = letter();
        let mut sink = RecordingSink::default();
        sink.add_page(geom.page_width_mm, geom.page_height_mm).unwrap();
        let (cursor, pages, unplaced) = place_sliced(
            &mut sink,
            &geom,
            &Tunables::default(),
            bm,
            0,
            bm.height_px(),
            Cursor::top(&geom),
        )
        .unwrap();
        assert_eq!(unplaced, 0, "letter geometry must place everything");
        (sink, cursor, pages)
    }

    #[test]
    fn conserves_total_height() {
        let geom = letter();
        let mm_per_px = geom.mm_per_px(200).unwrap();
        let bm = bitmap(200, 2000);
        let (sink, _, _) = run(&bm);

        let placed_mm: f64 = sink.images.iter().map(|(_, _, h)| h).sum();
        let expected_mm = 2000.0 * mm_per_px;
        // Integer-pixel slicing makes the sum exact up to float addition noise.
        assert!(
            (placed_mm - expected_mm).abs() < 1e-6,
            "placed {placed_mm} mm, expected {expected_mm} mm"
        );
    }

    #[test]
    fn page_count_matches_ceiling() {
        let geom = letter();
        let mm_per_px = geom.mm_per_px(200).unwrap(); // 0.9525 mm/px
        let bm = bitmap(200, 2000);
        let (sink, cursor, pages_added) = run(&bm);

        let total_mm = 2000.0 * mm_per_px;
        let per_page_mm = geom.content_height_mm() - Tunables::default().slice_epsilon_mm;
        let expected_pages = (total_mm / per_page_mm).ceil() as usize;
        // ±1 for epsilon trimming on the final page.
        assert!(
            (sink.images.len() as i64 - expected_pages as i64).abs() <= 1,
            "got {} slices, expected about {}",
            sink.images.len(),
            expected_pages
        );
        assert_eq!(pages_added, sink.images.len() - 1, "one break between slices");
        assert_eq!(cursor.page_index, pages_added);
    }

    #[test]
    fn residual_slice_is_shorter_than_a_page() {
        let geom = letter();
        let bm = bitmap(200, 2000);
        let (sink, _, _) = run(&bm);

        let (_, _, last_mm) = *sink.images.last().unwrap();
        assert!(last_mm < geom.content_height_mm());
    }

    #[test]
    fn every_slice_respects_bottom_margin() {
        let geom = letter();
        let bm = bitmap(333, 5000);
        let (sink, _, _) = run(&bm);

        for &(page, y_mm, h_mm) in &sink.images {
            assert!(
                y_mm + h_mm <= geom.bottom_limit_mm() + 1e-9,
                "slice on page {page} overflows: {y_mm} + {h_mm}"
            );
        }
    }

    #[test]
    fn continuation_slices_start_at_top_margin() {
        let geom = letter();
        let bm = bitmap(200, 2000);
        let (sink, _, _) = run(&bm);

        for &(_, y_mm, _) in &sink.images[1..] {
            assert!((y_mm - geom.margin_mm).abs() < 1e-9);
        }
    }

    #[test]
    fn degenerate_budget_refused_with_region_unplaced() {
        // 1 px wide on a page whose content height is smaller than one
        // pixel's worth of millimetres: content width 500, height 20.
        let geom = PageGeometry::new(520.0, 40.0, 10.0).unwrap();
        let mut sink = RecordingSink::default();
        sink.add_page(geom.page_width_mm, geom.page_height_mm).unwrap();
        let bm = bitmap(1, 50);
        let (cursor, pages, unplaced) = place_sliced(
            &mut sink,
            &geom,
            &Tunables::default(),
            &bm,
            0,
            50,
            Cursor::top(&geom),
        )
        .unwrap();
        // Must give up cleanly before emitting anything, reporting the
        // whole region as unplaced so the caller records a skip.
        assert_eq!(unplaced, 50);
        assert_eq!(pages, 0);
        assert_eq!(cursor, Cursor::top(&geom));
        assert!(sink.images.is_empty());
        assert_eq!(sink.pages, 1, "no page break emitted");
    }
}
