//! Local single-image OCR via Tesseract.

use async_trait::async_trait;
use tracing::debug;

use crate::error::{OcrError, OcrResult};
use crate::ocr::{DetectionMode, TextAnnotation, TextDetector};

/// Page segmentation mode for fully automatic layout analysis.
const PSM_AUTO: i32 = 3;
/// Page segmentation mode for sparse text in no particular order.
const PSM_SPARSE: i32 = 11;

/// [`TextDetector`] backed by a local Tesseract install.
///
/// Document mode runs full layout analysis and returns one annotation.
/// Text mode runs sparse detection and returns each non-blank line as a
/// fragment.
#[derive(Debug, Clone)]
pub struct TesseractDetector {
    lang: String,
    dpi: Option<i32>,
}

impl TesseractDetector {
    pub fn new() -> Self {
        Self {
            lang: "eng".to_string(),
            dpi: None,
        }
    }

    /// Tesseract language pack(s), e.g. `"eng+deu"`.
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn with_dpi(mut self, dpi: i32) -> Self {
        self.dpi = Some(dpi);
        self
    }

    fn args(&self, mode: DetectionMode) -> rusty_tesseract::Args {
        let psm = match mode {
            DetectionMode::Document => PSM_AUTO,
            DetectionMode::Text => PSM_SPARSE,
        };
        rusty_tesseract::Args {
            lang: self.lang.clone(),
            dpi: self.dpi,
            psm: Some(psm),
            ..Default::default()
        }
    }
}

impl Default for TesseractDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextDetector for TesseractDetector {
    async fn detect(&self, image: &[u8], mode: DetectionMode) -> OcrResult<TextAnnotation> {
        use rusty_tesseract::Image;

        let content = image.to_vec();
        let args = self.args(mode);

        // Tesseract shells out, keep it off the async runtime
        let text = tokio::task::spawn_blocking(move || -> OcrResult<String> {
            let img = image::load_from_memory(&content)
                .map_err(|e| OcrError::Remote(format!("unreadable image: {e}")))?;

            let luma = image::DynamicImage::ImageLuma8(img.to_luma8());
            let tesseract_image = Image::from_dynamic_image(&luma)
                .map_err(|e| OcrError::Remote(e.to_string()))?;

            rusty_tesseract::image_to_string(&tesseract_image, &args)
                .map_err(|e| OcrError::Remote(e.to_string()))
        })
        .await??;

        debug!(chars = text.len(), ?mode, "Tesseract OCR finished");

        Ok(match mode {
            DetectionMode::Document => TextAnnotation::full(text.trim()),
            DetectionMode::Text => TextAnnotation::fragments(
                text.lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(String::from)
                    .collect(),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_selects_segmentation() {
        let detector = TesseractDetector::new().with_lang("eng+deu");
        assert_eq!(detector.args(DetectionMode::Document).psm, Some(PSM_AUTO));
        assert_eq!(detector.args(DetectionMode::Text).psm, Some(PSM_SPARSE));
        assert_eq!(detector.args(DetectionMode::Text).lang, "eng+deu");
    }

    #[tokio::test]
    async fn test_garbage_bytes_are_an_error() {
        let err = TesseractDetector::new()
            .detect(b"definitely not an image", DetectionMode::Document)
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::Remote(_)));
    }
}
