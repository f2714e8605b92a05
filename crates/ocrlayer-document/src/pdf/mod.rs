// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — page canvas trait, the printpdf-backed writer and a recording
// canvas.

pub mod canvas;
pub mod writer;

pub use canvas::{CanvasOp, PageCanvas, RecordingCanvas, TextRun};
pub use writer::PdfCanvas;
