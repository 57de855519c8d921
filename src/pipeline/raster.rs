//! Block rasterisation: run the readiness protocol, then capture.
//!
//! ## Why so many waits?
//!
//! The capture primitive photographs whatever is on screen *right now*. A
//! report block straight out of a reactive render is not stable yet: fonts
//! may still be swapping, `<img>` tags may be mid-download, and chart
//! libraries animate their series in over a few hundred milliseconds. Each
//! wait below removes one class of half-rendered capture, in the order the
//! artefacts appear. None of the waits can block forever (image settling
//! resolves on `error` as well as `load`, and the host is expected to bound
//! font readiness), so a broken asset degrades the picture instead of
//! hanging the export.
//!
//! A capture failure is fatal for the document and is not retried here: the
//! host decides whether the document as a whole is retried or reported.

use crate::bitmap::Bitmap;
use crate::config::ExportConfig;
use crate::dom::{ContentBlock, RenderOptions};
use crate::error::ExportError;
use std::time::Duration;
use tracing::debug;

/// Capture one block into a [`Bitmap`], guaranteeing visual stability first.
///
/// Wait order: next UI tick (flush reactive updates), web fonts, `<img>`
/// settling, `settle_frames` animation frames, then a fixed
/// `settle_delay_ms` pause for time-based chart transitions.
///
/// # Errors
/// [`ExportError::RenderFailed`] when the host's render primitive rejects.
pub async fn rasterize_block<B: ContentBlock>(
    block: &B,
    block_num: usize,
    config: &ExportConfig,
) -> Result<Bitmap, ExportError> {
    block.wait_next_tick().await;
    block.wait_fonts_ready().await;
    block.wait_images_settled().await;
    block.wait_animation_frames(config.settle_frames).await;
    if config.settle_delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(config.settle_delay_ms)).await;
    }

    let options = RenderOptions {
        pixel_scale: config.pixel_scale,
        logical_viewport_width: config.viewport_width_px,
        cross_origin_images: true,
        image_timeout_ms: config.image_timeout_ms,
        background_color: config.background_color.clone(),
    };

    let bitmap = block
        .capture(&options)
        .await
        .map_err(|e| ExportError::RenderFailed {
            block: block_num,
            detail: e.to_string(),
        })?;

    debug!(
        "Captured block {} → {}x{} px",
        block_num,
        bitmap.width_px(),
        bitmap.height_px()
    );
    Ok(bitmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::GridLayout;
    use crate::error::RenderError;
    use image::{Rgba, RgbaImage};
    use std::sync::Mutex;

    /// Fake block that records the order of readiness calls.
    struct ScriptedBlock {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    impl ScriptedBlock {
        fn new(fail: bool) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail,
            }
        }

        fn log(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }
    }

    impl ContentBlock for ScriptedBlock {
        fn width_px(&self) -> f64 {
            720.0
        }

        async fn wait_next_tick(&self) {
            self.log("tick");
        }

        async fn wait_fonts_ready(&self) {
            self.log("fonts");
        }

        async fn wait_images_settled(&self) {
            self.log("images");
        }

        async fn wait_animation_frames(&self, frames: u32) {
            self.log(&format!("frames:{frames}"));
        }

        async fn capture(&self, options: &RenderOptions) -> Result<Bitmap, RenderError> {
            self.log("capture");
            if self.fail {
                return Err(RenderError::new("simulated capture failure"));
            }
            assert!(options.cross_origin_images);
            let w = (self.width_px() * options.pixel_scale as f64) as u32;
            Ok(Bitmap::new(RgbaImage::from_pixel(
                w,
                100,
                Rgba([255, 255, 255, 255]),
            )))
        }

        fn grid_layout(&self) -> Option<GridLayout> {
            None
        }
    }

    fn test_config() -> ExportConfig {
        // No settle delay: keeps the test instant without faking time.
        ExportConfig::builder().settle_delay_ms(0).build().unwrap()
    }

    #[tokio::test]
    async fn readiness_protocol_runs_in_order() {
        let block = ScriptedBlock::new(false);
        let bitmap = rasterize_block(&block, 1, &test_config()).await.unwrap();

        assert_eq!(
            *block.calls.lock().unwrap(),
            vec!["tick", "fonts", "images", "frames:3", "capture"]
        );
        // pixel_scale 2.0 doubles the 720 CSS px width.
        assert_eq!(bitmap.width_px(), 1440);
    }

    #[tokio::test]
    async fn capture_failure_is_fatal_and_names_the_block() {
        let block = ScriptedBlock::new(true);
        let err = rasterize_block(&block, 4, &test_config()).await.unwrap_err();
        match err {
            ExportError::RenderFailed { block, detail } => {
                assert_eq!(block, 4);
                assert!(detail.contains("simulated"));
            }
            other => panic!("expected RenderFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn settle_delay_is_applied() {
        tokio::time::pause();
        let block = ScriptedBlock::new(false);
        let config = ExportConfig::builder().settle_delay_ms(200).build().unwrap();
        // With paused time, auto-advance resolves the sleep; this just
        // exercises the delay branch.
        let bitmap = rasterize_block(&block, 1, &config).await.unwrap();
        assert!(!bitmap.is_empty());
    }
}
