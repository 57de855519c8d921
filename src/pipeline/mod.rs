//! Pipeline stages for block-raster document assembly.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable: the placement and row math
//! run against synthetic geometry with no DOM and no writer beyond a test
//! recorder.
//!
//! ## Data Flow
//!
//! ```text
//! blocks ──▶ raster ──▶ [rows] ──▶ place ──▶ slice
//! (host)   (capture)  (grid only) (cursor)  (fallback)
//! ```
//!
//! 1. [`raster`]: run the readiness protocol, then capture the block into a
//!    [`crate::bitmap::Bitmap`] via the host's render primitive
//! 2. [`rows`]: when the block contains a grid, turn measured child
//!    geometry into ordered, non-overlapping row bands
//! 3. [`place`]: the pagination state machine that places each region whole,
//!    moves it to a fresh page, or hands it to the slice engine
//! 4. [`slice`]: fallback of last resort, splitting a region taller than a
//!    page across as many pages as it takes

pub mod place;
pub mod raster;
pub mod rows;
pub mod slice;
