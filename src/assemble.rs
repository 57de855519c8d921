//! Document assembly: drive the whole pipeline over an ordered block list.
//!
//! ## Why strictly sequential?
//!
//! Placement is a running fold over the cursor: where block N+1 lands
//! depends on the real measured height of block N, which is only known after
//! N's capture. Rasterising blocks in parallel would buy nothing (the
//! placement decisions would still have to be serialised), so the pipeline
//! processes exactly one block at a time, in emission order. The suspension
//! points are the readiness waits and the capture call itself.
//!
//! One sink per document. The cursor and the sink are owned exclusively by
//! the in-flight call; assembling two documents against the same sink is a
//! host bug the engine cannot detect.

use crate::config::ExportConfig;
use crate::dom::ContentBlock;
use crate::error::{ExportError, SkipReason};
use crate::output::{AssemblyOutput, AssemblyStats, BlockSkip};
use crate::pipeline::place::{self, Cursor, Placement};
use crate::pipeline::raster;
use crate::pipeline::rows::{self, BandKind};
use crate::writer::PageSink;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Assemble one document from an ordered list of content blocks.
///
/// This is the primary entry point for the library. For each block, in
/// order: run the readiness protocol and capture ([`raster`]); if the block
/// contains a measurable grid, place its detected row bands as atomic
/// regions, otherwise place the block whole; finally ask the sink to
/// finalise (save or return a blob, per the sink's construction).
///
/// An empty block list still produces a single blank page: the sink starts
/// with zero pages and the assembler always opens the first one.
///
/// # Errors
/// Returns `Err(ExportError)` only for fatal failures: invalid geometry, a
/// rejected capture, or a sink refusal. Degenerate blocks are skipped and
/// reported in [`AssemblyOutput::skips`], not raised.
pub async fn assemble<B: ContentBlock, W: PageSink>(
    blocks: &[B],
    mut sink: W,
    config: &ExportConfig,
) -> Result<AssemblyOutput, ExportError> {
    let total_start = Instant::now();
    let geom = config.geometry()?;
    let tunables = &config.tunables;

    info!(
        "Starting assembly: {} blocks onto {:.1}x{:.1} mm pages",
        blocks.len(),
        geom.page_width_mm,
        geom.page_height_mm
    );
    if let Some(ref cb) = config.progress {
        cb.on_assembly_start(blocks.len());
    }

    let mut stats = AssemblyStats {
        blocks_total: blocks.len(),
        ..AssemblyStats::default()
    };
    let mut skips: Vec<BlockSkip> = Vec::new();

    // ── Open the first page ──────────────────────────────────────────────
    sink.add_page(geom.page_width_mm, geom.page_height_mm)?;
    let mut cursor = Cursor::top(&geom);

    for (idx, block) in blocks.iter().enumerate() {
        let block_num = idx + 1;
        if let Some(ref cb) = config.progress {
            cb.on_block_start(block_num, blocks.len());
        }

        // ── Capture ──────────────────────────────────────────────────────
        let render_start = Instant::now();
        let bitmap = raster::rasterize_block(block, block_num, config).await?;
        stats.render_ms += render_start.elapsed().as_millis() as u64;

        if bitmap.is_empty() {
            warn!("Skipping block {block_num}: empty capture");
            skips.push(BlockSkip {
                block_index: block_num,
                reason: SkipReason::EmptyBitmap,
            });
            stats.blocks_skipped += 1;
            if let Some(ref cb) = config.progress {
                cb.on_block_skipped(block_num, blocks.len(), SkipReason::EmptyBitmap);
            }
            continue;
        }

        // ── Place: row bands when a grid is measurable, else whole ───────
        let place_start = Instant::now();
        let outcome = match measurable_grid_bands(block, &bitmap, tunables) {
            Some((bands, px_per_css)) => {
                stats.grid_blocks += 1;
                stats.rows_detected += bands.len();
                place_bands(
                    &mut sink, &geom, tunables, &bitmap, &bands, px_per_css, cursor, &mut stats,
                )?
            }
            None => {
                let (next, placement) = place::place_region(
                    &mut sink,
                    &geom,
                    tunables,
                    &bitmap,
                    0,
                    bitmap.height_px(),
                    cursor,
                    0.0,
                )?;
                if let Placement::Sliced { .. } = placement {
                    stats.slices_emitted += 1;
                }
                (next, placement)
            }
        };
        stats.placement_ms += place_start.elapsed().as_millis() as u64;

        let (next_cursor, placement) = outcome;
        cursor = next_cursor;
        match placement {
            Placement::Skipped(reason) => {
                warn!("Skipping block {block_num}: {reason}");
                skips.push(BlockSkip {
                    block_index: block_num,
                    reason,
                });
                stats.blocks_skipped += 1;
                if let Some(ref cb) = config.progress {
                    cb.on_block_skipped(block_num, blocks.len(), reason);
                }
            }
            placed => {
                stats.blocks_placed += 1;
                debug!("Block {block_num} placed via {placed:?}");
                if let Some(ref cb) = config.progress {
                    cb.on_block_placed(block_num, blocks.len(), placed);
                }
            }
        }
    }

    stats.pages_emitted = cursor.page_index + 1;
    if let Some(ref cb) = config.progress {
        cb.on_assembly_complete(stats.blocks_placed, stats.pages_emitted);
    }

    // ── Finalise ─────────────────────────────────────────────────────────
    let document = sink.finalize()?;
    stats.total_ms = total_start.elapsed().as_millis() as u64;
    info!(
        "Assembly complete: {}/{} blocks on {} pages in {} ms",
        stats.blocks_placed, stats.blocks_total, stats.pages_emitted, stats.total_ms
    );

    Ok(AssemblyOutput {
        document,
        stats,
        skips,
    })
}

/// Row bands for the block's grid in *device* pixels, when detectable.
///
/// Returns `None` (meaning "take the whole-block path") when the block has
/// no grid, the CSS→device ratio is unusable, or detection fell back.
fn measurable_grid_bands<B: ContentBlock>(
    block: &B,
    bitmap: &crate::bitmap::Bitmap,
    tunables: &crate::config::Tunables,
) -> Option<(Vec<rows::RowBand>, f64)> {
    let grid = block.grid_layout()?;

    // The bitmap is captured at pixel_scale density; inspector geometry is
    // CSS pixels. One ratio converts between the two spaces.
    let px_per_css = bitmap.width_px() as f64 / block.width_px();
    if !px_per_css.is_finite() || px_per_css <= 0.0 {
        warn!("Grid fallback: unusable device-pixel ratio ({px_per_css})");
        return None;
    }

    let block_height_css = bitmap.height_px() as f64 / px_per_css;
    let bands = rows::detect_row_bands(&grid, block_height_css, tunables);
    if bands.is_empty() {
        return None;
    }
    Some((bands, px_per_css))
}

/// Place detected bands in order, each as an atomic region.
///
/// Band edges round outward to whole device pixels (floor the top, ceil the
/// bottom) and are clamped against the previously consumed device row so the
/// detector's no-overlap guarantee survives rounding.
#[allow(clippy::too_many_arguments)]
fn place_bands<W: PageSink>(
    sink: &mut W,
    geom: &crate::geometry::PageGeometry,
    tunables: &crate::config::Tunables,
    bitmap: &crate::bitmap::Bitmap,
    bands: &[rows::RowBand],
    px_per_css: f64,
    mut cursor: Cursor,
    stats: &mut AssemblyStats,
) -> Result<(Cursor, Placement), ExportError> {
    let mut consumed_px: u32 = 0;
    let mut last_placed: Option<Placement> = None;
    let mut last_skip: Option<SkipReason> = None;

    for band in bands {
        let top_px = ((band.top_px * px_per_css).floor().max(0.0) as u32)
            .max(consumed_px)
            .min(bitmap.height_px());
        let bottom_px = ((band.bottom_px * px_per_css).ceil().max(0.0) as u32)
            .clamp(top_px, bitmap.height_px());
        let height_px = bottom_px - top_px;
        consumed_px = bottom_px;
        if height_px == 0 {
            continue;
        }

        // Rows get the forced-break padding; header/footer are plain regions.
        let padding_mm = if band.kind == BandKind::Row {
            tunables.row_bottom_padding_mm
        } else {
            0.0
        };

        let (next, placement) = place::place_region(
            sink, geom, tunables, bitmap, top_px, height_px, cursor, padding_mm,
        )?;
        cursor = next;
        debug!(
            "Band {:?} [{}, {}) px placed via {:?}",
            band.kind, top_px, bottom_px, placement
        );
        if let Placement::Sliced { .. } = placement {
            stats.slices_emitted += 1;
        }
        match placement {
            Placement::Skipped(reason) => last_skip = Some(reason),
            placed => last_placed = Some(placed),
        }
    }

    // Every band skipped (or rounded away) means the block placed nothing;
    // report the reason the placements actually gave. Bands that rounded to
    // zero device pixels never reached the planner, so an empty bitmap is
    // the honest reason when no placement reported one.
    Ok((
        cursor,
        last_placed.unwrap_or(Placement::Skipped(
            last_skip.unwrap_or(SkipReason::EmptyBitmap),
        )),
    ))
}
