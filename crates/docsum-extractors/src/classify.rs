//! Filename classification.
//!
//! Maps a filename to a normalized extension and the extraction route the
//! orchestrator should take for it.

use serde::{Deserialize, Serialize};

/// Extension marker for filenames without one.
pub const UNSUPPORTED: &str = "unsupported";

/// Extraction route for a file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    /// Plain text, read directly.
    Text,
    /// Word-processor document.
    Docx,
    /// PDF; direct parse first, batch OCR when no digital text exists.
    Pdf,
    /// Raster image; single-image OCR only.
    Image,
    /// No extraction route.
    Unsupported,
}

impl FormatKind {
    /// Map an extension to its route, ignoring case and a leading '.'.
    pub fn from_extension(extension: &str) -> Self {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "txt" => FormatKind::Text,
            "docx" | "doc" => FormatKind::Docx,
            "pdf" => FormatKind::Pdf,
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp" | "tif" | "tiff" => FormatKind::Image,
            _ => FormatKind::Unsupported,
        }
    }

    /// Whether a direct extractor exists for this format.
    pub fn has_direct_extractor(&self) -> bool {
        matches!(self, FormatKind::Text | FormatKind::Docx | FormatKind::Pdf)
    }

    /// Whether uploads of this format are accepted.
    pub fn is_supported(&self) -> bool {
        !matches!(self, FormatKind::Unsupported)
    }
}

/// Classification of a filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatClass {
    /// Lowercased extension, or [`UNSUPPORTED`].
    pub extension: String,
    /// Extraction route.
    pub kind: FormatKind,
}

/// Classify a filename by the substring after its last '.'.
pub fn classify(filename: &str) -> FormatClass {
    let extension = match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_lowercase(),
        _ => UNSUPPORTED.to_string(),
    };
    let kind = FormatKind::from_extension(&extension);

    FormatClass { extension, kind }
}

/// Recover the normalized extension from a stored document locator.
///
/// Uploads are stored as `raw_documents/<nanos>_<hex>_<filename>`; the
/// original filename is everything after the second underscore of the last
/// path segment. Locators that do not follow that scheme are classified by
/// their last path segment as-is.
pub fn extension_for_locator(locator: &str) -> String {
    let segment = locator.rsplit('/').next().unwrap_or(locator);
    let mut parts = segment.splitn(3, '_');
    let filename = match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(_), Some(name)) if !name.is_empty() => name,
        _ => segment,
    };

    classify(filename).extension
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_is_lowercased() {
        assert_eq!(classify("Report.PDF").extension, "pdf");
        assert_eq!(classify("scan.JpEg").kind, FormatKind::Image);
    }

    #[test]
    fn test_last_dot_wins() {
        let class = classify("archive.v2.docx");
        assert_eq!(class.extension, "docx");
        assert_eq!(class.kind, FormatKind::Docx);
    }

    #[test]
    fn test_no_dot_is_unsupported() {
        let class = classify("README");
        assert_eq!(class.extension, UNSUPPORTED);
        assert_eq!(class.kind, FormatKind::Unsupported);
    }

    #[test]
    fn test_trailing_dot_is_unsupported() {
        assert_eq!(classify("notes.").extension, UNSUPPORTED);
    }

    #[test]
    fn test_unknown_extension_keeps_name() {
        let class = classify("movie.mp4");
        assert_eq!(class.extension, "mp4");
        assert_eq!(class.kind, FormatKind::Unsupported);
    }

    #[test]
    fn test_classification_is_stable_across_case() {
        for name in ["a.txt", "a.TXT", "a.Txt"] {
            assert_eq!(classify(name), classify("a.txt"));
        }
    }

    #[test]
    fn test_from_extension_ignores_case() {
        assert_eq!(FormatKind::from_extension("TXT"), FormatKind::Text);
        assert_eq!(FormatKind::from_extension(".Pdf"), FormatKind::Pdf);
        assert_eq!(FormatKind::from_extension("PNG"), FormatKind::Image);
    }

    #[test]
    fn test_direct_extractor_routes() {
        assert!(FormatKind::Pdf.has_direct_extractor());
        assert!(FormatKind::Text.has_direct_extractor());
        assert!(!FormatKind::Image.has_direct_extractor());
        assert!(!FormatKind::Unsupported.is_supported());
    }

    #[test]
    fn test_extension_for_upload_locator() {
        assert_eq!(
            extension_for_locator("raw_documents/1700000000_a1b2c3d4_quarterly_report.PDF"),
            "pdf"
        );
        assert_eq!(extension_for_locator("gs://bucket/scan.png"), "png");
        assert_eq!(extension_for_locator("raw_documents/1_2_noext"), UNSUPPORTED);
    }
}
