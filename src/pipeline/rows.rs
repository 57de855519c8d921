//! Grid row detection: turn measured child geometry into ordered,
//! non-overlapping row bands.
//!
//! Responsive card grids wrap into a different number of rows depending on
//! viewport width, so rows are detected from what was actually rendered
//! (offset geometry and bounding rects supplied by the host's layout
//! inspector), never from markup structure. The output is a top-to-bottom
//! list of bands in block-local CSS pixels: an optional pre-grid header
//! band, one band per visual row, and an optional post-grid footer band.
//! The planner then places each band as an atomic region, which is what
//! keeps a page break from landing mid-card.
//!
//! The math here is pure (no DOM, no sink), so every tolerance and clamp
//! is testable with synthetic numbers.

use crate::config::Tunables;
use crate::dom::GridLayout;
use tracing::warn;

/// What a band represents, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum BandKind {
    /// Block content above the grid (e.g. a section header).
    Header,
    /// One detected visual row of grid children.
    Row,
    /// Block content below the grid (e.g. a footer or legend).
    Footer,
}

/// A vertical band of the block, in block-local CSS pixels.
///
/// Bands are emitted in order and never overlap: each band's `top_px` is at
/// least the previous band's `bottom_px`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct RowBand {
    pub top_px: f64,
    pub bottom_px: f64,
    pub kind: BandKind,
}

impl RowBand {
    pub fn height_px(&self) -> f64 {
        self.bottom_px - self.top_px
    }
}

/// Detect row bands for a measured grid inside a block of
/// `block_height_px` CSS pixels.
///
/// Returns an empty vec when the grid is unmeasurable (no children, or
/// non-finite/degenerate extents); the caller falls back to whole-block
/// placement, which is a safe degraded result: content simply is not split
/// by row.
pub fn detect_row_bands(
    grid: &GridLayout,
    block_height_px: f64,
    tunables: &Tunables,
) -> Vec<RowBand> {
    if !block_height_px.is_finite() || block_height_px <= 0.0 {
        warn!("Grid fallback: block height {block_height_px} is unmeasurable");
        return Vec::new();
    }
    if !grid.top_px.is_finite() || !grid.height_px.is_finite() || grid.height_px <= 0.0 {
        warn!(
            "Grid fallback: grid extents unmeasurable (top={}, height={})",
            grid.top_px, grid.height_px
        );
        return Vec::new();
    }

    // Children with any non-finite coordinate are dropped, not guessed at.
    let mut children: Vec<_> = grid
        .children
        .iter()
        .filter(|c| {
            c.offset_top_px.is_finite()
                && c.rect_top_px.is_finite()
                && c.rect_bottom_px.is_finite()
        })
        .collect();
    if children.is_empty() {
        warn!("Grid fallback: no measurable children");
        return Vec::new();
    }
    children.sort_by(|a, b| a.offset_top_px.total_cmp(&b.offset_top_px));

    let grid_top = grid.top_px.clamp(0.0, block_height_px);
    let bleed_px =
        grid.row_gap_px.unwrap_or(tunables.default_row_gap_px) + tunables.extra_row_bleed_px;

    // Cluster children into visual rows: a child opens a new row when its
    // offset top is more than the tolerance below the row's anchor.
    let mut rows: Vec<(f64, f64)> = Vec::new(); // (rect_top, rect_bottom) union, grid-relative
    let mut anchor_top = children[0].offset_top_px;
    let mut union_top = children[0].rect_top_px;
    let mut union_bottom = children[0].rect_bottom_px;

    for child in &children[1..] {
        if child.offset_top_px - anchor_top > tunables.cluster_tolerance_px {
            rows.push((union_top, union_bottom));
            anchor_top = child.offset_top_px;
            union_top = child.rect_top_px;
            union_bottom = child.rect_bottom_px;
        } else {
            union_top = union_top.min(child.rect_top_px);
            union_bottom = union_bottom.max(child.rect_bottom_px);
        }
    }
    rows.push((union_top, union_bottom));

    // Bleed, convert to block-local, clamp against the previously consumed
    // bottom so no two bands ever claim the same source pixel range.
    let mut bands = Vec::with_capacity(rows.len() + 2);
    if grid_top > 0.0 {
        bands.push(RowBand {
            top_px: 0.0,
            bottom_px: grid_top,
            kind: BandKind::Header,
        });
    }

    let mut consumed = grid_top;
    for (rect_top, rect_bottom) in rows {
        let top = (grid_top + rect_top - bleed_px).max(consumed);
        let bottom = (grid_top + rect_bottom + bleed_px)
            .min(block_height_px)
            .max(top);
        if bottom - top <= 0.0 {
            continue;
        }
        bands.push(RowBand {
            top_px: top,
            bottom_px: bottom,
            kind: BandKind::Row,
        });
        consumed = bottom;
    }

    // Nothing usable survived clamping: let the caller place the block whole.
    if !bands.iter().any(|b| b.kind == BandKind::Row) {
        warn!("Grid fallback: all detected rows degenerate after clamping");
        return Vec::new();
    }

    if block_height_px - consumed > 0.0 {
        bands.push(RowBand {
            top_px: consumed,
            bottom_px: block_height_px,
            kind: BandKind::Footer,
        });
    }

    bands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ChildGeometry;

    fn child(top: f64, bottom: f64) -> ChildGeometry {
        ChildGeometry {
            offset_top_px: top,
            rect_top_px: top,
            rect_bottom_px: bottom,
        }
    }

    fn grid(top_px: f64, height_px: f64, children: Vec<ChildGeometry>) -> GridLayout {
        GridLayout {
            top_px,
            height_px,
            row_gap_px: Some(8.0),
            children,
        }
    }

    fn rows_of(bands: &[RowBand]) -> Vec<&RowBand> {
        bands.iter().filter(|b| b.kind == BandKind::Row).collect()
    }

    #[test]
    fn three_rows_cluster_within_tolerance() {
        // Tops at 0/220/440 with ≤2 px jitter cluster into exactly 3 rows.
        let g = grid(
            0.0,
            660.0,
            vec![
                child(0.0, 200.0),
                child(1.5, 198.0),
                child(0.5, 201.0),
                child(220.0, 420.0),
                child(221.0, 418.0),
                child(440.0, 640.0),
            ],
        );
        let bands = detect_row_bands(&g, 660.0, &Tunables::default());
        assert_eq!(rows_of(&bands).len(), 3);
    }

    #[test]
    fn jitter_beyond_tolerance_opens_new_row() {
        let g = grid(
            0.0,
            500.0,
            vec![child(0.0, 100.0), child(2.5, 100.0)],
        );
        let bands = detect_row_bands(&g, 500.0, &Tunables::default());
        assert_eq!(rows_of(&bands).len(), 2);
    }

    #[test]
    fn rows_are_bled_by_gap_plus_allowance() {
        let g = grid(100.0, 500.0, vec![child(50.0, 250.0)]);
        let bands = detect_row_bands(&g, 700.0, &Tunables::default());
        let rows = rows_of(&bands);
        // bleed = 8 (gap) + 12 (extra) = 20; block-local row at 100+50 = 150.
        assert!((rows[0].top_px - 130.0).abs() < 1e-9);
        assert!((rows[0].bottom_px - 370.0).abs() < 1e-9);
    }

    #[test]
    fn gap_fallback_when_unresolvable() {
        let mut g = grid(0.0, 300.0, vec![child(30.0, 100.0)]);
        g.row_gap_px = None;
        let bands = detect_row_bands(&g, 300.0, &Tunables::default());
        let rows = rows_of(&bands);
        // bleed = 8 (default gap) + 12 = 20 → top 10.
        assert!((rows[0].top_px - 10.0).abs() < 1e-9);
    }

    #[test]
    fn consecutive_bands_never_overlap() {
        // Rows closer together than the bleed force the clamp to engage.
        let g = grid(
            40.0,
            400.0,
            vec![child(0.0, 100.0), child(110.0, 210.0), child(220.0, 320.0)],
        );
        let bands = detect_row_bands(&g, 500.0, &Tunables::default());
        for pair in bands.windows(2) {
            assert!(
                pair[1].top_px >= pair[0].bottom_px - 1e-9,
                "bands overlap: {pair:?}"
            );
        }
    }

    #[test]
    fn first_row_clamped_to_grid_top() {
        // Bleed would push the first row above the grid into the header.
        let g = grid(100.0, 300.0, vec![child(5.0, 80.0)]);
        let bands = detect_row_bands(&g, 400.0, &Tunables::default());
        let rows = rows_of(&bands);
        assert!(rows[0].top_px >= 100.0);
        // Header covers exactly the pre-grid region.
        assert_eq!(bands[0].kind, BandKind::Header);
        assert!((bands[0].bottom_px - 100.0).abs() < 1e-9);
    }

    #[test]
    fn header_and_footer_emitted_around_rows() {
        let g = grid(120.0, 400.0, vec![child(0.0, 350.0)]);
        let bands = detect_row_bands(&g, 700.0, &Tunables::default());
        assert_eq!(bands.first().unwrap().kind, BandKind::Header);
        assert_eq!(bands.last().unwrap().kind, BandKind::Footer);
        assert!((bands.last().unwrap().bottom_px - 700.0).abs() < 1e-9);
    }

    #[test]
    fn no_header_when_grid_starts_at_block_top() {
        let g = grid(0.0, 300.0, vec![child(0.0, 200.0)]);
        let bands = detect_row_bands(&g, 300.0, &Tunables::default());
        assert_eq!(bands.first().unwrap().kind, BandKind::Row);
    }

    #[test]
    fn empty_children_falls_back() {
        let g = grid(0.0, 300.0, vec![]);
        assert!(detect_row_bands(&g, 300.0, &Tunables::default()).is_empty());
    }

    #[test]
    fn non_finite_geometry_falls_back() {
        let g = grid(f64::NAN, 300.0, vec![child(0.0, 100.0)]);
        assert!(detect_row_bands(&g, 300.0, &Tunables::default()).is_empty());

        let g = grid(0.0, 300.0, vec![child(f64::NAN, 100.0)]);
        assert!(detect_row_bands(&g, 300.0, &Tunables::default()).is_empty());
    }

    #[test]
    fn rows_below_block_bottom_are_dropped() {
        // Child extends past the measured block height: clamp, then the
        // second (fully out-of-range) row disappears.
        let g = grid(
            0.0,
            600.0,
            vec![child(0.0, 580.0), child(620.0, 700.0)],
        );
        let bands = detect_row_bands(&g, 600.0, &Tunables::default());
        let rows = rows_of(&bands);
        assert_eq!(rows.len(), 1);
        assert!((rows[0].bottom_px - 600.0).abs() < 1e-9);
    }
}
