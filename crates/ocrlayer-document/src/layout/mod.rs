// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout module — page geometry reconciliation and text-layer placement.

pub mod resolution;
pub mod text_layer;

use ocrlayer_core::{In, Px, Rect, Resolution, Size};

use crate::image::ImageSource;

pub use resolution::{
    Background, ImagePolicy, ImageSelection, ReconcileInput, Reconciled, SizeSource, SkipReason,
    reconcile, select_images,
};
pub use text_layer::{RenderableSpan, TextLayerRenderer};

/// Geometry of one output page.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub physical_size: Size<In>,
    pub effective_resolution: Resolution,
    pub background: Option<&'a ImageSource>,
    pub invert_vertical: bool,
}

impl<'a> PageContext<'a> {
    /// Context for a page sized by `reconciled`.
    pub fn new(
        reconciled: &Reconciled,
        background: Option<&'a ImageSource>,
        invert_vertical: bool,
    ) -> Self {
        Self {
            physical_size: reconciled.physical_size,
            effective_resolution: reconciled.effective_resolution,
            background,
            invert_vertical,
        }
    }

    /// The whole page, in inches.
    pub fn page_rect(&self) -> Rect<In> {
        Rect::new(0.0, 0.0, self.physical_size.width, self.physical_size.height)
    }

    /// Map an OCR pixel box onto the page, flipping the vertical axis when
    /// requested.
    pub fn place(&self, bbox: Rect<Px>) -> Rect<In> {
        let rect = bbox.to_inches(self.effective_resolution);
        if self.invert_vertical {
            rect.flip_vertical(self.physical_size.height)
        } else {
            rect
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(invert: bool) -> PageContext<'static> {
        PageContext {
            physical_size: Size::new(1000.0 / 96.0, 1500.0 / 96.0),
            effective_resolution: Resolution::uniform(96.0),
            background: None,
            invert_vertical: invert,
        }
    }

    #[test]
    fn place_without_inversion() {
        let rect = page(false).place(Rect::from_bbox([100, 100, 400, 150]));
        assert!((rect.x_min - 100.0 / 96.0).abs() < 1e-12);
        assert!((rect.y_min - 100.0 / 96.0).abs() < 1e-12);
        assert!((rect.x_max - 400.0 / 96.0).abs() < 1e-12);
        assert!((rect.y_max - 150.0 / 96.0).abs() < 1e-12);
    }

    #[test]
    fn place_with_inversion() {
        let ctx = page(true);
        let height = ctx.physical_size.height;
        let rect = ctx.place(Rect::from_bbox([100, 100, 400, 150]));
        assert!((rect.y_min - (height - 150.0 / 96.0)).abs() < 1e-12);
        assert!((rect.y_max - (height - 100.0 / 96.0)).abs() < 1e-12);
        assert!(rect.y_min <= rect.y_max);
    }

    #[test]
    fn page_rect_covers_page() {
        let rect = page(false).page_rect();
        assert_eq!(rect.size(), page(false).physical_size);
    }
}
