//! # rasterdoc
//!
//! Paginate rasterised content blocks into print-accurate documents.
//!
//! ## Why this crate?
//!
//! Exporting an on-screen report to a fixed-size document is not a screenshot
//! problem. A dashboard section can be taller than any page, responsive card
//! grids wrap differently per viewport, and a naive cut at the page boundary
//! slices charts and cards in half. This crate owns the geometric core of
//! that export: it measures what was actually rendered, lays an arbitrarily
//! tall raster out across fixed-size pages, and only ever breaks content
//! where a break cannot be avoided.
//!
//! ## Pipeline Overview
//!
//! ```text
//! blocks (host DOM handles)
//!  │
//!  ├─ 1. Raster   readiness waits (tick, fonts, images, frames, settle),
//!  │              then capture via the host's render primitive
//!  ├─ 2. Rows     detect visual grid rows from measured geometry (optional)
//!  ├─ 3. Place    whole-page fit → fresh-page fit → slice fallback
//!  ├─ 4. Slice    split page-overflowing regions at exact pixel budgets
//!  └─ 5. Output   sink finalises: saved document or in-memory blob
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rasterdoc::{assemble, ExportConfig};
//! # async fn demo<B: rasterdoc::ContentBlock, W: rasterdoc::PageSink>(
//! #     blocks: Vec<B>, sink: W,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExportConfig::builder().return_blob(true).build()?;
//! // `blocks` are host-provided DOM handles; `sink` wraps the host's
//! // document writer, constructed from `config.writer_options()`.
//! let output = assemble(&blocks, sink, &config).await?;
//! eprintln!(
//!     "{} pages, {} blocks placed",
//!     output.stats.pages_emitted, output.stats.blocks_placed
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## What the engine does NOT do
//!
//! Rasterisation itself, document encoding, and bulk ZIP packaging live in
//! the host, behind the [`ContentBlock`] and [`PageSink`] seams. The engine
//! knows nothing about document semantics, only rectangular image regions,
//! detected row boundaries, and page geometry in millimetres.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod assemble;
pub mod bitmap;
pub mod config;
pub mod dom;
pub mod error;
pub mod geometry;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod writer;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use assemble::assemble;
pub use bitmap::Bitmap;
pub use config::{ExportConfig, ExportConfigBuilder, Orientation, PageFormat, Tunables};
pub use dom::{ChildGeometry, ContentBlock, GridLayout, RenderOptions};
pub use error::{ExportError, RenderError, SkipReason};
pub use geometry::PageGeometry;
pub use output::{AssemblyOutput, AssemblyStats, BlockSkip};
pub use pipeline::place::{Cursor, Placement};
pub use pipeline::rows::{detect_row_bands, BandKind, RowBand};
pub use progress::{AssemblyProgress, NoopProgress};
pub use writer::{DocumentOutput, PageSink, WriterOptions};
