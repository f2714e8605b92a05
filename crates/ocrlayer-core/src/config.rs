// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion options.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{OcrLayerError, Result};

/// Default font size of every text run, in points.
pub const DEFAULT_FONT_SIZE: f32 = 12.0;

/// Settings for one hOCR → PDF conversion run.
///
/// Every field has a default, so a JSON config file only needs to name the
/// settings it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Draw the OCR text visibly instead of as an invisible layer.
    pub visible_text: bool,
    /// Draw the page image behind the text layer.
    pub include_images: bool,
    /// Use the full text of every descendant instead of the node's own text.
    pub full_line_text: bool,
    /// Stroke the bounding box of every text node.
    pub bounding_boxes: bool,
    /// Never draw images referenced from the hOCR `title` attributes.
    pub ignore_embedded_images: bool,
    /// Emit one page per OCR page / image instead of only the first.
    pub multi_page: bool,
    /// Load the hOCR-referenced image as the size reference even when a
    /// command-line image is drawn.
    pub embedded_as_reference: bool,
    /// Flip node coordinates from top-left to bottom-left origin.
    pub vertical_inversion: bool,
    /// Font size of every text run in points.
    pub font_size: f32,
    /// Optional TrueType font used instead of the built-in Helvetica.
    pub font_path: Option<PathBuf>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            visible_text: false,
            include_images: false,
            full_line_text: false,
            bounding_boxes: false,
            ignore_embedded_images: false,
            multi_page: false,
            embedded_as_reference: false,
            vertical_inversion: false,
            font_size: DEFAULT_FONT_SIZE,
            font_path: None,
        }
    }
}

impl ConvertOptions {
    /// Load options from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| OcrLayerError::open(path, err))?;
        let options: Self = serde_json::from_str(&raw)?;
        options.validate()?;
        Ok(options)
    }

    /// Reject settings that cannot produce a usable text layer.
    pub fn validate(&self) -> Result<()> {
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(OcrLayerError::Config(format!(
                "font size must be a positive number, got {}",
                self.font_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_plain_invocation() {
        let options = ConvertOptions::default();
        assert!(!options.visible_text);
        assert!(!options.multi_page);
        assert_eq!(options.font_size, 12.0);
        assert!(options.font_path.is_none());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "multi_page": true, "font_size": 9.5 }}"#).unwrap();

        let options = ConvertOptions::from_json_file(file.path()).unwrap();
        assert!(options.multi_page);
        assert_eq!(options.font_size, 9.5);
        assert!(!options.include_images);
    }

    #[test]
    fn zero_font_size_rejected() {
        let options = ConvertOptions {
            font_size: 0.0,
            ..ConvertOptions::default()
        };
        assert!(matches!(options.validate(), Err(OcrLayerError::Config(_))));
    }

    #[test]
    fn missing_config_file_is_resource_error() {
        let err = ConvertOptions::from_json_file("/nonexistent/ocrlayer.json").unwrap_err();
        assert!(matches!(err, OcrLayerError::ResourceOpen { .. }));
    }
}
