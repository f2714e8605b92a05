// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page canvas abstraction. All coordinates are in inches with a bottom-left
// origin; implementations convert to their own units.

use ocrlayer_core::error::{OcrLayerError, Result};
use ocrlayer_core::{In, Px, Rect, Rgb, Size};

use crate::image::ImageSource;

/// A positioned text run.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    /// Baseline origin, inches.
    pub x: f64,
    pub y: f64,
    pub font_size: f32,
    /// Horizontal scaling in percent (100 = natural width).
    pub horizontal_scale: f64,
    pub fill: Rgb,
    /// Fill mode when true, invisible render mode otherwise.
    pub visible: bool,
}

/// Sink for the drawing operations of one output document.
///
/// Calls follow `begin_page`, any number of draws, `end_page`, repeated per
/// page. Draws outside a page are an error.
pub trait PageCanvas {
    fn begin_page(&mut self, size: Size<In>) -> Result<()>;

    /// Draw `image` stretched over `placement`.
    fn draw_image(&mut self, image: &ImageSource, placement: Rect<In>) -> Result<()>;

    fn draw_text(&mut self, run: &TextRun) -> Result<()>;

    /// Outline `rect` with a line `width_pt` points wide.
    fn stroke_rect(&mut self, rect: Rect<In>, color: Rgb, width_pt: f64) -> Result<()>;

    fn end_page(&mut self) -> Result<()>;
}

/// A recorded canvas call.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasOp {
    BeginPage(Size<In>),
    Image {
        pixel_size: Size<Px>,
        placement: Rect<In>,
    },
    Text(TextRun),
    Stroke {
        rect: Rect<In>,
        color: Rgb,
        width_pt: f64,
    },
    EndPage,
}

/// Canvas that records every call, for inspecting conversions in tests and
/// dry runs.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    ops: Vec<CanvasOp>,
    page_open: bool,
}

impl RecordingCanvas {
    /// Empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call recorded so far, in order.
    pub fn ops(&self) -> &[CanvasOp] {
        &self.ops
    }

    /// Sizes of all pages begun so far.
    pub fn page_sizes(&self) -> Vec<Size<In>> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                CanvasOp::BeginPage(size) => Some(*size),
                _ => None,
            })
            .collect()
    }

    /// Text runs in emission order.
    pub fn text_runs(&self) -> Vec<&TextRun> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                CanvasOp::Text(run) => Some(run),
                _ => None,
            })
            .collect()
    }

    fn require_page(&self, what: &str) -> Result<()> {
        if self.page_open {
            Ok(())
        } else {
            Err(OcrLayerError::Pdf(format!("{what} outside of a page")))
        }
    }
}

impl PageCanvas for RecordingCanvas {
    fn begin_page(&mut self, size: Size<In>) -> Result<()> {
        if self.page_open {
            return Err(OcrLayerError::Pdf("page already open".into()));
        }
        self.page_open = true;
        self.ops.push(CanvasOp::BeginPage(size));
        Ok(())
    }

    fn draw_image(&mut self, image: &ImageSource, placement: Rect<In>) -> Result<()> {
        self.require_page("image")?;
        self.ops.push(CanvasOp::Image {
            pixel_size: image.pixel_size(),
            placement,
        });
        Ok(())
    }

    fn draw_text(&mut self, run: &TextRun) -> Result<()> {
        self.require_page("text")?;
        self.ops.push(CanvasOp::Text(run.clone()));
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect<In>, color: Rgb, width_pt: f64) -> Result<()> {
        self.require_page("stroke")?;
        self.ops.push(CanvasOp::Stroke {
            rect,
            color,
            width_pt,
        });
        Ok(())
    }

    fn end_page(&mut self) -> Result<()> {
        self.require_page("end_page")?;
        self.page_open = false;
        self.ops.push(CanvasOp::EndPage);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let mut canvas = RecordingCanvas::new();
        canvas.begin_page(Size::new(8.5, 11.0)).unwrap();
        canvas
            .stroke_rect(Rect::new(1.0, 1.0, 2.0, 2.0), Rgb::GREEN, 0.1)
            .unwrap();
        canvas.end_page().unwrap();

        assert_eq!(canvas.ops().len(), 3);
        assert_eq!(canvas.page_sizes(), vec![Size::new(8.5, 11.0)]);
        assert!(matches!(canvas.ops()[2], CanvasOp::EndPage));
    }

    #[test]
    fn draw_outside_page_fails() {
        let mut canvas = RecordingCanvas::new();
        let err = canvas
            .stroke_rect(Rect::zero(), Rgb::BLACK, 0.1)
            .unwrap_err();
        assert!(matches!(err, OcrLayerError::Pdf(_)));
        assert!(canvas.end_page().is_err());
    }

    #[test]
    fn nested_pages_fail() {
        let mut canvas = RecordingCanvas::new();
        canvas.begin_page(Size::new(1.0, 1.0)).unwrap();
        assert!(canvas.begin_page(Size::new(1.0, 1.0)).is_err());
    }
}
