// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ocrlayer-document — hOCR to PDF conversion.
//
// Parses hOCR into an annotation tree, reconciles every page's pixel geometry
// with the physical size of its image, and writes a PDF whose text layer is
// positioned and stretched onto the OCR bounding boxes.

pub mod compose;
pub mod font;
pub mod hocr;
pub mod image;
pub mod layout;
pub mod logging;
pub mod pdf;

pub use compose::{ConversionReport, Converter, PageSummary, SkippedPage};
pub use font::LayerFont;
pub use hocr::{AnnotationNode, HocrDocument};
pub use image::ImageSource;
pub use layout::{PageContext, TextLayerRenderer};
pub use logging::{RunLog, Verbosity};
pub use pdf::{PageCanvas, PdfCanvas, RecordingCanvas};
