// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: unit-tagged geometry, hOCR node classes and their
// drawing styles.

use std::fmt;
use std::marker::PhantomData;

/// PDF points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

// -- Units --------------------------------------------------------------------

/// Marker for a coordinate space.
pub trait Unit: Copy + Default + fmt::Debug + PartialEq {
    /// Short suffix used when printing values.
    const SUFFIX: &'static str;
}

/// Image / OCR pixel space, origin top-left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Px;

/// Physical page space in inches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct In;

impl Unit for Px {
    const SUFFIX: &'static str = "px";
}

impl Unit for In {
    const SUFFIX: &'static str = "in";
}

/// Pixels per inch, independently per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub x: f64,
    pub y: f64,
}

impl Resolution {
    /// Resolution of `x` and `y` pixels per inch.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Same resolution on both axes.
    pub const fn uniform(dpi: f64) -> Self {
        Self { x: dpi, y: dpi }
    }

    /// Both axes finite and strictly positive.
    pub fn is_usable(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.x > 0.0 && self.y > 0.0
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}x{:.2} dpi", self.x, self.y)
    }
}

// -- Size ---------------------------------------------------------------------

/// Width and height in unit `U`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size<U: Unit> {
    pub width: f64,
    pub height: f64,
    unit: PhantomData<U>,
}

impl<U: Unit> Size<U> {
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            unit: PhantomData,
        }
    }

    /// True when either axis is zero (or not a usable number).
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }
}

impl Size<Px> {
    /// Physical size of this many pixels at `resolution`.
    pub fn at_resolution(&self, resolution: Resolution) -> Size<In> {
        Size::new(self.width / resolution.x, self.height / resolution.y)
    }
}

impl Size<In> {
    /// Width in PDF points.
    pub fn width_pt(&self) -> f64 {
        self.width * POINTS_PER_INCH
    }

    /// Height in PDF points.
    pub fn height_pt(&self) -> f64 {
        self.height * POINTS_PER_INCH
    }
}

impl<U: Unit> fmt::Display for Size<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}x{:.3}{}", self.width, self.height, U::SUFFIX)
    }
}

// -- Rect ---------------------------------------------------------------------

/// Axis-aligned rectangle `(x_min, y_min, x_max, y_max)` in unit `U`.
///
/// Always satisfies `x_max >= x_min` and `y_max >= y_min`. A zero-width or
/// zero-height rect is valid and means "no content".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect<U: Unit> {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    unit: PhantomData<U>,
}

impl<U: Unit> Rect<U> {
    /// Build a rect from two corners, swapping coordinates as needed.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x_min: x0.min(x1),
            y_min: y0.min(y1),
            x_max: x0.max(x1),
            y_max: y0.max(y1),
            unit: PhantomData,
        }
    }

    /// The `(0,0,0,0)` rect used when a node carries no bounding box.
    pub const fn zero() -> Self {
        Self {
            x_min: 0.0,
            y_min: 0.0,
            x_max: 0.0,
            y_max: 0.0,
            unit: PhantomData,
        }
    }

    /// Horizontal extent, `x_max - x_min`.
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Vertical extent, `y_max - y_min`.
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Width and height as a [`Size`].
    pub fn size(&self) -> Size<U> {
        Size::new(self.width(), self.height())
    }

    /// Zero (or negative) width or height.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Smallest rect enclosing both.
    pub fn union(&self, other: &Self) -> Self {
        Self::new(
            self.x_min.min(other.x_min),
            self.y_min.min(other.y_min),
            self.x_max.max(other.x_max),
            self.y_max.max(other.y_max),
        )
    }
}

impl<U: Unit> Default for Rect<U> {
    fn default() -> Self {
        Self::zero()
    }
}

impl Rect<Px> {
    /// Build a pixel rect from the four integers of an hOCR `bbox`.
    pub fn from_bbox(bbox: [u32; 4]) -> Self {
        Self::new(
            f64::from(bbox[0]),
            f64::from(bbox[1]),
            f64::from(bbox[2]),
            f64::from(bbox[3]),
        )
    }

    /// Map into inches by dividing each axis by its resolution.
    pub fn to_inches(&self, resolution: Resolution) -> Rect<In> {
        Rect::new(
            self.x_min / resolution.x,
            self.y_min / resolution.y,
            self.x_max / resolution.x,
            self.y_max / resolution.y,
        )
    }
}

impl Rect<In> {
    /// Inverse of [`Rect::<Px>::to_inches`].
    pub fn to_pixels(&self, resolution: Resolution) -> Rect<Px> {
        Rect::new(
            self.x_min * resolution.x,
            self.y_min * resolution.y,
            self.x_max * resolution.x,
            self.y_max * resolution.y,
        )
    }

    /// Flip between top-left and bottom-left origin on a page of
    /// `page_height` inches: `y' = page_height - y` on both edges.
    pub fn flip_vertical(&self, page_height: f64) -> Self {
        Self::new(
            self.x_min,
            page_height - self.y_max,
            self.x_max,
            page_height - self.y_min,
        )
    }

    /// Width in PDF points.
    pub fn width_pt(&self) -> f64 {
        self.width() * POINTS_PER_INCH
    }

    /// Height in PDF points.
    pub fn height_pt(&self) -> f64 {
        self.height() * POINTS_PER_INCH
    }
}

impl<U: Unit> fmt::Display for Rect<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.3},{:.3})-({:.3},{:.3}){}",
            self.x_min,
            self.y_min,
            self.x_max,
            self.y_max,
            U::SUFFIX
        )
    }
}

// -- Colour -------------------------------------------------------------------

/// RGB colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const RED: Rgb = Rgb::new(1.0, 0.0, 0.0);
    pub const GREEN: Rgb = Rgb::new(0.0, 1.0, 0.0);
    pub const CYAN: Rgb = Rgb::new(0.0, 1.0, 1.0);
    pub const YELLOW: Rgb = Rgb::new(1.0, 1.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

// -- hOCR node classes --------------------------------------------------------

/// Class of an hOCR element, taken from its `class` attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NodeClass {
    /// `ocr_page`
    Page,
    /// `ocr_carea`
    Area,
    /// `ocr_par`
    Paragraph,
    /// `ocr_line`
    Line,
    /// `ocrx_word`
    Word,
    /// Anything else (structural HTML, unknown hOCR classes).
    #[default]
    Other,
}

/// Fill and outline colour of a text-layer node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeStyle {
    /// Colour of the text run.
    pub fill: Rgb,
    /// Colour of the bounding-box outline.
    pub outline: Rgb,
}

impl NodeClass {
    /// Classify a `class` attribute. Multi-valued attributes resolve to the
    /// first recognised token.
    pub fn from_class_attr(value: &str) -> Self {
        value
            .split_whitespace()
            .map(Self::from_token)
            .find(|class| *class != Self::Other)
            .unwrap_or(Self::Other)
    }

    fn from_token(token: &str) -> Self {
        match token {
            "ocr_page" => Self::Page,
            "ocr_carea" => Self::Area,
            "ocr_par" => Self::Paragraph,
            "ocr_line" => Self::Line,
            "ocrx_word" => Self::Word,
            _ => Self::Other,
        }
    }

    /// The hOCR class name, if this is an hOCR class.
    pub fn hocr_name(&self) -> Option<&'static str> {
        match self {
            Self::Page => Some("ocr_page"),
            Self::Area => Some("ocr_carea"),
            Self::Paragraph => Some("ocr_par"),
            Self::Line => Some("ocr_line"),
            Self::Word => Some("ocrx_word"),
            Self::Other => None,
        }
    }

    /// Drawing style for classes that take part in the text layer.
    pub fn style(&self) -> Option<NodeStyle> {
        match self {
            Self::Line => Some(NodeStyle {
                fill: Rgb::BLACK,
                outline: Rgb::GREEN,
            }),
            Self::Word => Some(NodeStyle {
                fill: Rgb::BLACK,
                outline: Rgb::CYAN,
            }),
            Self::Area => Some(NodeStyle {
                fill: Rgb::RED,
                outline: Rgb::YELLOW,
            }),
            Self::Paragraph => Some(NodeStyle {
                fill: Rgb::RED,
                outline: Rgb::RED,
            }),
            Self::Page | Self::Other => None,
        }
    }

    /// Line, word, area and paragraph nodes carry the text layer.
    pub fn is_text_layer(&self) -> bool {
        self.style().is_some()
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hocr_name().unwrap_or("other"))
    }
}
