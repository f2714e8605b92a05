// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page geometry reconciliation.
//
// A page's pixel geometry can come from the OCR page box, a reference image or
// the extent of the recognised lines; its physical size from the resolution of
// the background or reference image, or from a fallback density. This module
// picks one consistent answer per page.

use std::fmt;

use ocrlayer_core::{ConvertOptions, In, Px, Rect, Resolution, Size};
use tracing::{debug, trace};

use crate::image::ImageGeometry;

/// Density assumed for an image that carries no resolution metadata.
pub const DEFAULT_IMAGE_DPI: f64 = 300.0;

/// Density assumed when no image is involved at all.
pub const DEFAULT_SCREEN_DPI: f64 = 96.0;

// -- Image selection ----------------------------------------------------------

/// How images referenced from the hOCR are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImagePolicy {
    /// Never draw the hOCR-referenced image.
    pub ignore_embedded: bool,
    /// Use the hOCR-referenced image for page geometry even when it is not
    /// drawn.
    pub embedded_as_reference: bool,
}

impl From<&ConvertOptions> for ImagePolicy {
    fn from(options: &ConvertOptions) -> Self {
        Self {
            ignore_embedded: options.ignore_embedded_images,
            embedded_as_reference: options.embedded_as_reference,
        }
    }
}

/// Which image a page is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    /// The image given on the command line.
    Caller,
    /// The image referenced from the page's `title`.
    Embedded,
    None,
}

/// Outcome of [`select_images`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSelection {
    /// Whether the referenced image has to be opened at all.
    pub load_embedded: bool,
    pub background: Background,
    /// Whether the referenced image, once loaded, is the geometry reference.
    pub embedded_is_reference: bool,
}

/// Decide which images a page uses.
///
/// The caller's image always wins the background. The referenced image is the
/// background only when there is no caller image and it is not ignored; it
/// is loaded, and then serves as the geometry reference, whenever it is the
/// background or `embedded_as_reference` asks for it.
pub fn select_images(
    caller_present: bool,
    embedded_present: bool,
    policy: ImagePolicy,
) -> ImageSelection {
    let embedded_drawn = embedded_present && !caller_present && !policy.ignore_embedded;
    let load_embedded = embedded_drawn || (embedded_present && policy.embedded_as_reference);

    let background = if caller_present {
        Background::Caller
    } else if embedded_drawn {
        Background::Embedded
    } else {
        Background::None
    };

    ImageSelection {
        load_embedded,
        background,
        embedded_is_reference: load_embedded,
    }
}

// -- Reconciliation -----------------------------------------------------------

/// Everything known about a page's geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReconcileInput {
    /// `bbox` of the `ocr_page` node.
    pub page_bbox: Option<Rect<Px>>,
    /// Union of the page's `ocr_line` boxes.
    pub line_extent: Option<Rect<Px>>,
    pub background: Option<ImageGeometry>,
    pub reference: Option<ImageGeometry>,
}

/// Where the physical page size came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeSource {
    BackgroundResolution,
    ReferenceResolution,
    /// OCR extent at [`DEFAULT_IMAGE_DPI`].
    AssumedImageDpi,
    /// OCR extent at [`DEFAULT_SCREEN_DPI`].
    AssumedScreenDpi,
    /// Background pixels at [`DEFAULT_SCREEN_DPI`].
    BackgroundAtScreenDpi,
}

impl SizeSource {
    /// True when the size rests on an assumed density although an image was
    /// involved.
    pub fn is_missing_resolution(&self) -> bool {
        matches!(self, Self::AssumedImageDpi | Self::BackgroundAtScreenDpi)
    }
}

/// A page geometry that can be drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reconciled {
    pub physical_size: Size<In>,
    /// Pixels per inch mapping OCR coordinates onto the page.
    pub effective_resolution: Resolution,
    pub source: SizeSource,
}

/// Why a page produces no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Neither OCR geometry nor an image to size the page from.
    NoExtent,
    /// The page resolved to zero size on some axis.
    Degenerate,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoExtent => f.write_str("no page extent"),
            Self::Degenerate => f.write_str("degenerate page size"),
        }
    }
}

/// Pixel extent of the OCR content, axis by axis.
///
/// Each axis takes the first non-zero of: page box extent, reference image
/// size, far edge of the line extent.
pub fn ocr_extent(input: &ReconcileInput) -> Option<Size<Px>> {
    let page = input.page_bbox.map(|rect| rect.size());
    let reference = input.reference.map(|image| image.pixel_size);
    let lines = input
        .line_extent
        .map(|rect| Size::<Px>::new(rect.x_max, rect.y_max));

    let pick = |axis: fn(&Size<Px>) -> f64| {
        [page, reference, lines]
            .into_iter()
            .flatten()
            .map(|size| axis(&size))
            .find(|value| *value > 0.0)
            .unwrap_or(0.0)
    };
    let extent = Size::new(pick(|s| s.width), pick(|s| s.height));
    (extent.width > 0.0 || extent.height > 0.0).then_some(extent)
}

/// Resolve the physical size and effective resolution of a page.
pub fn reconcile(input: &ReconcileInput) -> Result<Reconciled, SkipReason> {
    let extent = ocr_extent(input);
    let with_resolution =
        |image: Option<ImageGeometry>| image.and_then(|i| i.resolution.map(|r| (i, r)));
    let image_involved = input.background.is_some() || input.reference.is_some();

    let (physical_size, source) = if let Some((image, res)) = with_resolution(input.background) {
        (
            image.pixel_size.at_resolution(res),
            SizeSource::BackgroundResolution,
        )
    } else if let Some((image, res)) = with_resolution(input.reference) {
        (
            image.pixel_size.at_resolution(res),
            SizeSource::ReferenceResolution,
        )
    } else if let Some(extent) = extent.filter(|_| image_involved) {
        (
            extent.at_resolution(Resolution::uniform(DEFAULT_IMAGE_DPI)),
            SizeSource::AssumedImageDpi,
        )
    } else if let Some(extent) = extent {
        (
            extent.at_resolution(Resolution::uniform(DEFAULT_SCREEN_DPI)),
            SizeSource::AssumedScreenDpi,
        )
    } else if let Some(background) = input.background {
        (
            background
                .pixel_size
                .at_resolution(Resolution::uniform(DEFAULT_SCREEN_DPI)),
            SizeSource::BackgroundAtScreenDpi,
        )
    } else {
        trace!("nothing to size the page from");
        return Err(SkipReason::NoExtent);
    };

    if physical_size.is_degenerate() {
        debug!(%physical_size, ?source, "page size is degenerate");
        return Err(SkipReason::Degenerate);
    }

    let pixels = extent
        .or(input.background.map(|image| image.pixel_size))
        .ok_or(SkipReason::NoExtent)?;
    let effective_resolution = Resolution::new(
        pixels.width / physical_size.width,
        pixels.height / physical_size.height,
    );
    if !effective_resolution.is_usable() {
        debug!(%pixels, %physical_size, "no usable effective resolution");
        return Err(SkipReason::Degenerate);
    }

    debug!(%physical_size, %effective_resolution, ?source, "page geometry reconciled");
    Ok(Reconciled {
        physical_size,
        effective_resolution,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(width: f64, height: f64, dpi: Option<f64>) -> ImageGeometry {
        ImageGeometry {
            pixel_size: Size::new(width, height),
            resolution: dpi.map(Resolution::uniform),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    // -- select_images: all eight flag combinations --

    fn policy(ignore_embedded: bool, embedded_as_reference: bool) -> ImagePolicy {
        ImagePolicy {
            ignore_embedded,
            embedded_as_reference,
        }
    }

    #[test]
    fn caller_only() {
        for p in [policy(false, false), policy(true, false), policy(false, true), policy(true, true)] {
            let sel = select_images(true, false, p);
            assert_eq!(sel.background, Background::Caller);
            assert!(!sel.load_embedded);
            assert!(!sel.embedded_is_reference);
        }
    }

    #[test]
    fn caller_and_embedded_default() {
        let sel = select_images(true, true, policy(false, false));
        assert_eq!(sel.background, Background::Caller);
        assert!(!sel.load_embedded);
    }

    #[test]
    fn caller_and_embedded_ignored() {
        let sel = select_images(true, true, policy(true, false));
        assert_eq!(sel.background, Background::Caller);
        assert!(!sel.load_embedded);
    }

    #[test]
    fn caller_and_embedded_as_reference() {
        for ignore in [false, true] {
            let sel = select_images(true, true, policy(ignore, true));
            assert_eq!(sel.background, Background::Caller);
            assert!(sel.load_embedded);
            assert!(sel.embedded_is_reference);
        }
    }

    #[test]
    fn embedded_only_default() {
        let sel = select_images(false, true, policy(false, false));
        assert_eq!(sel.background, Background::Embedded);
        assert!(sel.load_embedded);
        assert!(sel.embedded_is_reference);
    }

    #[test]
    fn embedded_only_ignored() {
        let sel = select_images(false, true, policy(true, false));
        assert_eq!(sel.background, Background::None);
        assert!(!sel.load_embedded);
    }

    #[test]
    fn embedded_only_ignored_but_reference() {
        let sel = select_images(false, true, policy(true, true));
        assert_eq!(sel.background, Background::None);
        assert!(sel.load_embedded);
        assert!(sel.embedded_is_reference);
    }

    #[test]
    fn embedded_only_reference_and_drawn() {
        let sel = select_images(false, true, policy(false, true));
        assert_eq!(sel.background, Background::Embedded);
        assert!(sel.load_embedded);
    }

    #[test]
    fn nothing_present() {
        for p in [policy(false, false), policy(true, true)] {
            let sel = select_images(false, false, p);
            assert_eq!(sel.background, Background::None);
            assert!(!sel.load_embedded);
        }
    }

    // -- reconcile --

    #[test]
    fn ocr_only_uses_screen_dpi() {
        let input = ReconcileInput {
            page_bbox: Some(Rect::from_bbox([0, 0, 1000, 1500])),
            ..ReconcileInput::default()
        };
        let page = reconcile(&input).unwrap();
        assert_eq!(page.source, SizeSource::AssumedScreenDpi);
        assert!(close(page.physical_size.width, 1000.0 / 96.0));
        assert!(close(page.physical_size.height, 1500.0 / 96.0));
        assert!(close(page.effective_resolution.x, 96.0));
        assert!(close(page.effective_resolution.y, 96.0));
    }

    #[test]
    fn background_resolution_wins() {
        let input = ReconcileInput {
            page_bbox: Some(Rect::from_bbox([0, 0, 2480, 3508])),
            background: Some(image(2480.0, 3508.0, Some(300.0))),
            reference: Some(image(1240.0, 1754.0, Some(150.0))),
            ..ReconcileInput::default()
        };
        let page = reconcile(&input).unwrap();
        assert_eq!(page.source, SizeSource::BackgroundResolution);
        assert!(close(page.physical_size.width, 2480.0 / 300.0));
        assert!(close(page.effective_resolution.x, 300.0));
        assert!(!page.source.is_missing_resolution());
    }

    #[test]
    fn reference_resolution_when_background_has_none() {
        let input = ReconcileInput {
            page_bbox: Some(Rect::from_bbox([0, 0, 2000, 3000])),
            background: Some(image(500.0, 750.0, None)),
            reference: Some(image(1000.0, 1500.0, Some(100.0))),
            ..ReconcileInput::default()
        };
        let page = reconcile(&input).unwrap();
        assert_eq!(page.source, SizeSource::ReferenceResolution);
        assert!(close(page.physical_size.width, 10.0));
        assert!(close(page.physical_size.height, 15.0));
        // OCR ran on a 2x larger raster than the reference.
        assert!(close(page.effective_resolution.x, 200.0));
    }

    #[test]
    fn image_without_resolution_assumes_300() {
        let input = ReconcileInput {
            page_bbox: Some(Rect::from_bbox([0, 0, 600, 900])),
            background: Some(image(600.0, 900.0, None)),
            ..ReconcileInput::default()
        };
        let page = reconcile(&input).unwrap();
        assert_eq!(page.source, SizeSource::AssumedImageDpi);
        assert!(page.source.is_missing_resolution());
        assert!(close(page.physical_size.width, 2.0));
        assert!(close(page.physical_size.height, 3.0));
    }

    #[test]
    fn image_only_without_resolution_uses_96() {
        let input = ReconcileInput {
            background: Some(image(960.0, 480.0, None)),
            ..ReconcileInput::default()
        };
        let page = reconcile(&input).unwrap();
        assert_eq!(page.source, SizeSource::BackgroundAtScreenDpi);
        assert!(close(page.physical_size.width, 10.0));
        assert!(close(page.physical_size.height, 5.0));
        assert!(close(page.effective_resolution.x, 96.0));
    }

    #[test]
    fn image_only_with_resolution() {
        let input = ReconcileInput {
            background: Some(image(600.0, 300.0, Some(150.0))),
            ..ReconcileInput::default()
        };
        let page = reconcile(&input).unwrap();
        assert!(close(page.physical_size.width, 4.0));
        assert!(close(page.effective_resolution.y, 150.0));
    }

    #[test]
    fn extent_falls_back_per_axis() {
        let input = ReconcileInput {
            page_bbox: Some(Rect::new(0.0, 0.0, 800.0, 0.0)),
            reference: Some(image(0.0, 0.0, None)),
            line_extent: Some(Rect::from_bbox([10, 20, 300, 900])),
            ..ReconcileInput::default()
        };
        assert_eq!(ocr_extent(&input), Some(Size::new(800.0, 900.0)));
    }

    #[test]
    fn line_extent_only() {
        let input = ReconcileInput {
            line_extent: Some(Rect::from_bbox([50, 60, 480, 960])),
            ..ReconcileInput::default()
        };
        let page = reconcile(&input).unwrap();
        assert!(close(page.physical_size.width, 480.0 / 96.0));
        assert!(close(page.physical_size.height, 10.0));
    }

    #[test]
    fn nothing_known_is_skipped() {
        assert_eq!(
            reconcile(&ReconcileInput::default()),
            Err(SkipReason::NoExtent)
        );
    }

    #[test]
    fn zero_axis_is_degenerate() {
        let input = ReconcileInput {
            page_bbox: Some(Rect::new(0.0, 0.0, 1000.0, 0.0)),
            ..ReconcileInput::default()
        };
        assert_eq!(reconcile(&input), Err(SkipReason::Degenerate));

        let input = ReconcileInput {
            background: Some(image(0.0, 100.0, Some(300.0))),
            ..ReconcileInput::default()
        };
        assert_eq!(reconcile(&input), Err(SkipReason::Degenerate));
    }

    #[test]
    fn pixel_rect_round_trips() {
        let input = ReconcileInput {
            page_bbox: Some(Rect::from_bbox([0, 0, 2550, 3300])),
            background: Some(image(1275.0, 1650.0, Some(150.0))),
            ..ReconcileInput::default()
        };
        let page = reconcile(&input).unwrap();
        let res = page.effective_resolution;
        for bbox in [[0, 0, 2550, 3300], [100, 200, 300, 400], [7, 13, 2549, 3299]] {
            let px = Rect::from_bbox(bbox);
            let back = px.to_inches(res).to_pixels(res);
            assert!(close(back.x_min, px.x_min) && close(back.y_min, px.y_min));
            assert!(close(back.x_max, px.x_max) && close(back.y_max, px.y_max));
        }
    }

    #[test]
    fn policy_from_options() {
        let options = ConvertOptions {
            ignore_embedded_images: true,
            embedded_as_reference: true,
            ..ConvertOptions::default()
        };
        assert_eq!(ImagePolicy::from(&options), policy(true, true));
    }
}
