//! Page geometry and the pixel → millimetre scale factor.
//!
//! Every height and position the engine computes derives from one number:
//! `mm_per_px = content_width_mm / bitmap_width_px`. Blocks are always
//! stretched to the full content width, so a single factor guarantees a
//! block's width and its proportional height stay visually consistent no
//! matter how many slices it is cut into.
//!
//! The factor is deliberately a *sentinel*, not an error: a zero-width
//! bitmap yields `None`, callers skip that placement, and the document keeps
//! assembling. NaN or infinity must never leak into placement math.

use crate::error::ExportError;

/// Immutable page geometry for one document, all values in millimetres.
///
/// Invariants (enforced by [`PageGeometry::new`]):
/// * `margin_mm < page_height_mm / 2`
/// * `content_width_mm() > 0`
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct PageGeometry {
    pub page_width_mm: f64,
    pub page_height_mm: f64,
    pub margin_mm: f64,
}

impl PageGeometry {
    /// Construct a validated geometry.
    ///
    /// # Errors
    /// [`ExportError::InvalidConfig`] when the margins leave no printable
    /// area, or any dimension is zero/negative/non-finite.
    pub fn new(page_width_mm: f64, page_height_mm: f64, margin_mm: f64) -> Result<Self, ExportError> {
        let all_finite =
            page_width_mm.is_finite() && page_height_mm.is_finite() && margin_mm.is_finite();
        if !all_finite {
            return Err(ExportError::InvalidConfig(
                "page dimensions and margin must be finite".into(),
            ));
        }
        if page_width_mm <= 0.0 || page_height_mm <= 0.0 || margin_mm < 0.0 {
            return Err(ExportError::InvalidConfig(format!(
                "page {page_width_mm}x{page_height_mm} mm with margin {margin_mm} mm is not printable"
            )));
        }
        if margin_mm >= page_height_mm / 2.0 {
            return Err(ExportError::InvalidConfig(format!(
                "margin {margin_mm} mm must be less than half the page height ({page_height_mm} mm)"
            )));
        }
        if page_width_mm - 2.0 * margin_mm <= 0.0 {
            return Err(ExportError::InvalidConfig(format!(
                "margin {margin_mm} mm leaves no horizontal content area on a {page_width_mm} mm page"
            )));
        }
        Ok(Self {
            page_width_mm,
            page_height_mm,
            margin_mm,
        })
    }

    /// Horizontal printable width: `page_width − 2·margin`.
    pub fn content_width_mm(&self) -> f64 {
        self.page_width_mm - 2.0 * self.margin_mm
    }

    /// Vertical printable height: `page_height − 2·margin`.
    pub fn content_height_mm(&self) -> f64 {
        self.page_height_mm - 2.0 * self.margin_mm
    }

    /// The y coordinate past which nothing may be placed.
    pub fn bottom_limit_mm(&self) -> f64 {
        self.page_height_mm - self.margin_mm
    }

    /// Millimetres of page width represented by one bitmap pixel.
    ///
    /// Returns `None` for a zero-width bitmap or a non-finite/non-positive
    /// quotient. Callers treat `None` as "skip this placement" rather than
    /// an error, so one degenerate capture never aborts the document.
    pub fn mm_per_px(&self, bitmap_width_px: u32) -> Option<f64> {
        if bitmap_width_px == 0 {
            return None;
        }
        let factor = self.content_width_mm() / bitmap_width_px as f64;
        (factor.is_finite() && factor > 0.0).then_some(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter() -> PageGeometry {
        // 8.5in x 11in with half-inch margins.
        PageGeometry::new(215.9, 279.4, 12.7).unwrap()
    }

    #[test]
    fn letter_content_area() {
        let g = letter();
        assert!((g.content_width_mm() - 190.5).abs() < 1e-9);
        assert!((g.content_height_mm() - 254.0).abs() < 1e-9);
        assert!((g.bottom_limit_mm() - 266.7).abs() < 1e-9);
    }

    #[test]
    fn scale_factor_is_content_width_over_pixels() {
        let g = letter();
        let f = g.mm_per_px(400).unwrap();
        assert!((f - 190.5 / 400.0).abs() < 1e-12);
    }

    #[test]
    fn zero_width_yields_sentinel_not_nan() {
        let g = letter();
        assert_eq!(g.mm_per_px(0), None);
    }

    #[test]
    fn huge_width_still_finite() {
        let g = letter();
        let f = g.mm_per_px(u32::MAX).unwrap();
        assert!(f.is_finite() && f > 0.0);
    }

    #[test]
    fn margin_over_half_height_rejected() {
        let err = PageGeometry::new(215.9, 279.4, 140.0).unwrap_err();
        assert!(err.to_string().contains("half the page height"));
    }

    #[test]
    fn margin_eating_width_rejected() {
        // Tall narrow custom page: margin fits the height rule but not width.
        assert!(PageGeometry::new(20.0, 300.0, 10.0).is_err());
    }

    #[test]
    fn non_finite_rejected() {
        assert!(PageGeometry::new(f64::NAN, 279.4, 12.7).is_err());
        assert!(PageGeometry::new(215.9, f64::INFINITY, 12.7).is_err());
    }
}
