// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text layer renderer: turns line, word, area and paragraph nodes into text
// runs stretched to their OCR bounding boxes.

use ocrlayer_core::error::Result;
use ocrlayer_core::{ConvertOptions, In, NodeClass, NodeStyle, Rect};
use tracing::{instrument, trace};
use unicode_normalization::UnicodeNormalization;

use super::PageContext;
use crate::font::LayerFont;
use crate::hocr::AnnotationNode;
use crate::pdf::{PageCanvas, TextRun};

/// Width of bounding-box outlines, in points.
pub const OUTLINE_WIDTH_PT: f64 = 0.1;

/// A node resolved for drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderableSpan {
    pub class: NodeClass,
    /// Placement on the page, inches.
    pub rect: Rect<In>,
    pub text: String,
    /// Percent; 100 is the font's natural width.
    pub horizontal_scale: f64,
    pub style: NodeStyle,
}

/// Draws the text layer of a page.
#[derive(Debug, Clone, Copy)]
pub struct TextLayerRenderer<'a> {
    font: &'a LayerFont,
    full_line_text: bool,
    visible_text: bool,
    bounding_boxes: bool,
}

impl<'a> TextLayerRenderer<'a> {
    /// Renderer drawing with `font` under `options`.
    pub fn new(font: &'a LayerFont, options: &ConvertOptions) -> Self {
        Self {
            font,
            full_line_text: options.full_line_text,
            visible_text: options.visible_text,
            bounding_boxes: options.bounding_boxes,
        }
    }

    /// Resolve a node for drawing; `None` for classes outside the text layer.
    pub fn span(&self, node: &AnnotationNode, page: &PageContext<'_>) -> Option<RenderableSpan> {
        let style = node.class.style()?;
        let rect = page.place(node.bbox_or_zero());
        let text = node_text(node, self.full_line_text);
        let horizontal_scale = if text.is_empty() {
            100.0
        } else {
            horizontal_scale(rect.width_pt(), self.font.text_width_pt(&text))
        };
        Some(RenderableSpan {
            class: node.class,
            rect,
            text,
            horizontal_scale,
            style,
        })
    }

    /// Draw one node: its text run, then its outline when requested.
    pub fn render_node(
        &self,
        canvas: &mut dyn PageCanvas,
        node: &AnnotationNode,
        page: &PageContext<'_>,
    ) -> Result<bool> {
        let Some(span) = self.span(node, page) else {
            return Ok(false);
        };
        trace!(
            class = %span.class,
            rect = %span.rect,
            scale = span.horizontal_scale,
            text = %span.text,
            "text node"
        );

        if !span.text.is_empty() {
            canvas.draw_text(&TextRun {
                text: span.text,
                x: span.rect.x_min,
                y: span.rect.y_min,
                font_size: self.font.size(),
                horizontal_scale: span.horizontal_scale,
                fill: span.style.fill,
                visible: self.visible_text,
            })?;
        }
        if self.bounding_boxes {
            canvas.stroke_rect(span.rect, span.style.outline, OUTLINE_WIDTH_PT)?;
        }
        Ok(true)
    }

    /// Draw every text node below `page_node` in document order. Returns the
    /// number of nodes drawn.
    #[instrument(skip_all, fields(page = %page.physical_size))]
    pub fn render_page(
        &self,
        canvas: &mut dyn PageCanvas,
        page_node: &AnnotationNode,
        page: &PageContext<'_>,
    ) -> Result<usize> {
        let mut drawn = 0;
        for node in page_node.text_nodes() {
            if self.render_node(canvas, node, page)? {
                drawn += 1;
            }
        }
        trace!(drawn, "text layer done");
        Ok(drawn)
    }
}

/// Text a node contributes to the layer.
///
/// In full-line mode every fragment of the subtree, trimmed and joined by
/// single spaces, NFC-normalised. Otherwise the node's own text, or the text
/// of the only `span` in its subtree. Trailing whitespace is dropped.
pub fn node_text(node: &AnnotationNode, full_line: bool) -> String {
    if full_line {
        let joined = node
            .text_fragments()
            .into_iter()
            .map(str::trim)
            .filter(|fragment| !fragment.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        return joined.nfc().collect();
    }

    if let Some(own) = node.text.as_deref().filter(|text| !text.trim().is_empty()) {
        return own.trim_end().to_owned();
    }

    let mut spans = node.elements_named("span");
    match (spans.next(), spans.next()) {
        (Some(only), None) => only.inner_text().trim_end().to_owned(),
        _ => String::new(),
    }
}

/// Horizontal scaling that stretches a run of natural width `natural_pt` to
/// `width_pt`. Falls back to 100 when either width is zero.
pub fn horizontal_scale(width_pt: f64, natural_pt: f64) -> f64 {
    if width_pt > 0.0 && natural_pt > 0.0 && width_pt.is_finite() && natural_pt.is_finite() {
        width_pt / natural_pt * 100.0
    } else {
        100.0
    }
}
