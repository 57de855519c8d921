//! Assembly output: the finalised document plus run statistics.

use crate::error::SkipReason;
use crate::writer::DocumentOutput;
use serde::{Deserialize, Serialize};

/// Result of assembling one document.
#[derive(Debug)]
pub struct AssemblyOutput {
    /// The finalised document, per the sink's `return_blob` handling.
    pub document: DocumentOutput,

    /// Timing and placement statistics for the run.
    pub stats: AssemblyStats,

    /// Blocks that were skipped because their geometry was unusable.
    /// Empty on a fully clean run.
    pub skips: Vec<BlockSkip>,
}

/// Statistics about an assembly run.
///
/// Serialisable so hosts can log a run and diff it against another to
/// explain output differences (page counts, unexpected slicing).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssemblyStats {
    /// Blocks supplied to the assembler.
    pub blocks_total: usize,
    /// Blocks that resulted in at least one placed image.
    pub blocks_placed: usize,
    /// Blocks skipped for unusable geometry.
    pub blocks_skipped: usize,
    /// Blocks that went through the grid-row path.
    pub grid_blocks: usize,
    /// Rows emitted by the detector across all grid blocks
    /// (header/footer bands included).
    pub rows_detected: usize,
    /// Regions that had to fall back to the slice engine.
    pub slices_emitted: usize,
    /// Pages in the finalised document.
    pub pages_emitted: usize,
    /// Time spent in readiness waits and capture calls.
    pub render_ms: u64,
    /// Time spent in placement math and sink calls.
    pub placement_ms: u64,
    /// Wall-clock time for the whole assembly.
    pub total_ms: u64,
}

/// Record of one skipped block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSkip {
    /// 1-indexed position in the block list.
    pub block_index: usize,
    pub reason: SkipReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_serialise_round_trip() {
        let stats = AssemblyStats {
            blocks_total: 4,
            blocks_placed: 3,
            blocks_skipped: 1,
            grid_blocks: 1,
            rows_detected: 5,
            slices_emitted: 2,
            pages_emitted: 7,
            render_ms: 1200,
            placement_ms: 40,
            total_ms: 1260,
        };
        let json = serde_json::to_string(&stats).unwrap();
        let back: AssemblyStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back.pages_emitted, 7);
        assert_eq!(back.blocks_skipped, 1);
    }

    #[test]
    fn skip_record_displays_reason() {
        let skip = BlockSkip {
            block_index: 2,
            reason: SkipReason::UnusableScale,
        };
        assert!(skip.reason.to_string().contains("scale factor"));
    }
}
