//! Progress-callback trait for per-block assembly events.
//!
//! Inject an [`Arc<dyn AssemblyProgress>`] via
//! [`crate::config::ExportConfigBuilder::progress`] to receive real-time
//! events as the pipeline captures and places each block.
//!
//! # Why callbacks instead of channels?
//!
//! A callback trait keeps the library agnostic about the host's eventing:
//! the same hook drives a progress dialog, feeds a channel, or just logs,
//! and an export UI only implements the methods it renders. `Send + Sync`
//! lets one callback instance serve a bulk exporter whose documents are
//! assembled from different tasks.

use crate::error::SkipReason;
use crate::pipeline::place::Placement;
use std::sync::Arc;

/// Called by the assembly pipeline as it processes each block.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Within one document the calls arrive strictly in
/// block order; the pipeline is sequential by design.
pub trait AssemblyProgress: Send + Sync {
    /// Called once before any block is captured.
    fn on_assembly_start(&self, total_blocks: usize) {
        let _ = total_blocks;
    }

    /// Called just before a block's readiness waits begin.
    ///
    /// # Arguments
    /// * `block_num`: 1-indexed block number
    /// * `total_blocks`: total blocks in the document
    fn on_block_start(&self, block_num: usize, total_blocks: usize) {
        let _ = (block_num, total_blocks);
    }

    /// Called when a block (including all its rows, if any) has been placed.
    ///
    /// `placement` describes the strategy the *last* region of the block
    /// used; useful for spotting content that had to be sliced.
    fn on_block_placed(&self, block_num: usize, total_blocks: usize, placement: Placement) {
        let _ = (block_num, total_blocks, placement);
    }

    /// Called when a block was skipped because its geometry was unusable.
    fn on_block_skipped(&self, block_num: usize, total_blocks: usize, reason: SkipReason) {
        let _ = (block_num, total_blocks, reason);
    }

    /// Called once after the last block, before the sink is finalised.
    fn on_assembly_complete(&self, blocks_placed: usize, pages_emitted: usize) {
        let _ = (blocks_placed, pages_emitted);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgress;

impl AssemblyProgress for NoopProgress {}

/// Convenience alias matching the type stored in [`crate::config::ExportConfig`].
pub type ProgressCallback = Arc<dyn AssemblyProgress>;
