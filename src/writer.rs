//! Page-writer contract: where finished pages go.
//!
//! The engine does not write PDF (or anything else) itself; it emits a
//! strict sequence of `add_page` / `add_image` calls against a host-supplied
//! [`PageSink`] and finally asks the sink to finalise. The sink is typically
//! a thin adapter over a document writer (jsPDF-style APIs, printer spools,
//! test recorders).
//!
//! One sink per document: the engine owns the sink exclusively for the
//! duration of [`crate::assemble`], and sinks are not expected to tolerate
//! interleaved documents.

use crate::config::{Orientation, PageFormat};
use crate::error::ExportError;

/// Options the host needs to construct its writer.
///
/// Produced by [`crate::config::ExportConfig::writer_options`] so the host
/// never re-derives page geometry from the config by hand. The unit is
/// always millimetres.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct WriterOptions {
    pub orientation: Orientation,
    pub page_format: PageFormat,
    /// Enable the writer's stream compression.
    pub compression: bool,
    /// Decimal digits the writer keeps for coordinates.
    pub precision: u8,
    /// `true`: finalise to an in-memory blob; `false`: save/download.
    pub return_blob: bool,
}

/// The finalised document, per the sink's `return_blob` handling.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutput {
    /// The sink persisted the document itself (file write, browser download).
    Saved,
    /// The document as in-memory bytes, for bulk packaging by the host.
    Blob(Vec<u8>),
}

impl DocumentOutput {
    /// The blob bytes, when the sink produced them.
    pub fn blob(&self) -> Option<&[u8]> {
        match self {
            DocumentOutput::Saved => None,
            DocumentOutput::Blob(bytes) => Some(bytes),
        }
    }
}

/// A document writer, driven page by page.
///
/// Contract:
/// * A fresh sink holds **zero** pages; the engine opens every page,
///   including the first.
/// * `add_image` always refers to the most recently added page.
/// * Coordinates and sizes are millimetres from the page's top-left corner.
/// * After `finalize`, the sink is consumed; the engine guarantees no
///   further calls.
pub trait PageSink {
    /// Append a new page of the given size and make it current.
    fn add_page(&mut self, width_mm: f64, height_mm: f64) -> Result<(), ExportError>;

    /// Place an encoded image on the current page.
    fn add_image(
        &mut self,
        data_url: &str,
        x_mm: f64,
        y_mm: f64,
        width_mm: f64,
        height_mm: f64,
    ) -> Result<(), ExportError>;

    /// Finish the document: save it or return it as a blob.
    fn finalize(self) -> Result<DocumentOutput, ExportError>;
}
