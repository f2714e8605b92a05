// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF canvas — builds the output document with `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: each page is a `PdfPage` holding a
// `Vec<Op>`; the document is serialised once via `PdfDocument::save()`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ocrlayer_core::error::{OcrLayerError, Result};
use ocrlayer_core::{In, POINTS_PER_INCH, Rect, Rgb, Size};
use printpdf::{
    BuiltinFont, Color, FontId, Line, LinePoint, Mm, Op, ParsedFont, PdfDocument, PdfPage,
    PdfSaveOptions, PdfWarnMsg, Point, Pt, RawImage, RawImageData, RawImageFormat, TextItem,
    TextRenderingMode, XObjectId, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use super::canvas::{PageCanvas, TextRun};
use crate::font::LayerFont;
use crate::image::ImageSource;

const MM_PER_INCH: f32 = 25.4;

/// Font as registered in the document.
enum PdfFont {
    Helvetica,
    Embedded(FontId),
}

struct OpenPage {
    size: Size<In>,
    ops: Vec<Op>,
}

/// [`PageCanvas`] writing a PDF document.
pub struct PdfCanvas {
    doc: PdfDocument,
    font: PdfFont,
    pages: Vec<PdfPage>,
    current: Option<OpenPage>,
    /// Image XObjects already embedded, by source file.
    images: HashMap<PathBuf, XObjectId>,
}

impl PdfCanvas {
    /// Create an empty document whose text runs use `font`.
    #[instrument(skip(font), fields(font = font.name()))]
    pub fn new(title: &str, font: &LayerFont) -> Result<Self> {
        let mut doc = PdfDocument::new(title);
        let font = match font.program() {
            None => PdfFont::Helvetica,
            Some(program) => {
                let mut warnings: Vec<PdfWarnMsg> = Vec::new();
                let parsed = ParsedFont::from_bytes(program, 0, &mut warnings).ok_or_else(|| {
                    OcrLayerError::Font("font program rejected by the PDF writer".into())
                })?;
                debug!(warnings = warnings.len(), "Custom font registered");
                PdfFont::Embedded(doc.add_font(&parsed))
            }
        };
        Ok(Self {
            doc,
            font,
            pages: Vec::new(),
            current: None,
            images: HashMap::new(),
        })
    }

    /// Serialise the document.
    #[instrument(skip(self), fields(pages = self.pages.len()))]
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.current.is_some() {
            return Err(OcrLayerError::Pdf("document finished with an open page".into()));
        }
        self.doc.with_pages(self.pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = self.doc.save(&PdfSaveOptions::default(), &mut warnings);
        for warning in &warnings {
            debug!(?warning, "PDF writer warning");
        }
        info!(bytes = output.len(), "PDF serialised");
        Ok(output)
    }

    fn ops(&mut self, what: &str) -> Result<&mut OpenPage> {
        self.current
            .as_mut()
            .ok_or_else(|| OcrLayerError::Pdf(format!("{what} outside of a page")))
    }

    fn image_id(&mut self, image: &ImageSource) -> XObjectId {
        if let Some(id) = image.path().and_then(|path| self.images.get(path)) {
            return id.clone();
        }

        let rgb = image.as_dynamic().to_rgb8();
        let raw = RawImage {
            width: rgb.width() as usize,
            height: rgb.height() as usize,
            pixels: RawImageData::U8(rgb.into_raw()),
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let id = self.doc.add_image(&raw);
        if let Some(path) = image.path() {
            self.images.insert(path.to_path_buf(), id.clone());
        }
        debug!(path = ?image.path().map(Path::display), "Image embedded");
        id
    }

    fn font_ops(&self, size: f32, items: Vec<TextItem>) -> [Op; 2] {
        let size = Pt(size);
        match &self.font {
            PdfFont::Helvetica => [
                Op::SetFontSizeBuiltinFont {
                    size,
                    font: BuiltinFont::Helvetica,
                },
                Op::WriteTextBuiltinFont {
                    items,
                    font: BuiltinFont::Helvetica,
                },
            ],
            PdfFont::Embedded(font) => [
                Op::SetFontSize {
                    size,
                    font: font.clone(),
                },
                Op::WriteText {
                    items,
                    font: font.clone(),
                },
            ],
        }
    }
}

impl PageCanvas for PdfCanvas {
    fn begin_page(&mut self, size: Size<In>) -> Result<()> {
        if self.current.is_some() {
            return Err(OcrLayerError::Pdf("page already open".into()));
        }
        debug!(page = self.pages.len() + 1, %size, "Begin page");
        self.current = Some(OpenPage {
            size,
            ops: Vec::new(),
        });
        Ok(())
    }

    fn draw_image(&mut self, image: &ImageSource, placement: Rect<In>) -> Result<()> {
        self.ops("image")?;
        let pixels = image.pixel_size();
        if pixels.is_degenerate() {
            warn!("Skipping empty image");
            return Ok(());
        }
        let id = self.image_id(image);

        // At 72 dpi one image pixel is one point.
        let op = Op::UseXobject {
            id,
            transform: XObjectTransform {
                translate_x: Some(Pt(to_pt(placement.x_min))),
                translate_y: Some(Pt(to_pt(placement.y_min))),
                scale_x: Some((placement.width_pt() / pixels.width) as f32),
                scale_y: Some((placement.height_pt() / pixels.height) as f32),
                dpi: Some(POINTS_PER_INCH as f32),
                rotate: None,
            },
        };
        self.ops("image")?.ops.push(op);
        Ok(())
    }

    fn draw_text(&mut self, run: &TextRun) -> Result<()> {
        self.ops("text")?;
        let mode = if run.visible {
            TextRenderingMode::Fill
        } else {
            TextRenderingMode::Invisible
        };
        let [set_font, write] = self.font_ops(run.font_size, vec![TextItem::Text(run.text.clone())]);

        let page = self.ops("text")?;
        page.ops.extend([
            Op::SaveGraphicsState,
            Op::StartTextSection,
            Op::SetFillColor {
                col: pdf_color(run.fill),
            },
            Op::SetTextRenderingMode { mode },
            Op::SetHorizontalScaling {
                percent: run.horizontal_scale as f32,
            },
            set_font,
            Op::SetTextCursor {
                pos: Point {
                    x: Pt(to_pt(run.x)),
                    y: Pt(to_pt(run.y)),
                },
            },
            write,
            Op::EndTextSection,
            Op::RestoreGraphicsState,
        ]);
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect<In>, color: Rgb, width_pt: f64) -> Result<()> {
        let corner = |x: f64, y: f64| LinePoint {
            p: Point {
                x: Pt(to_pt(x)),
                y: Pt(to_pt(y)),
            },
            bezier: false,
        };
        let outline = Line {
            points: vec![
                corner(rect.x_min, rect.y_min),
                corner(rect.x_max, rect.y_min),
                corner(rect.x_max, rect.y_max),
                corner(rect.x_min, rect.y_max),
            ],
            is_closed: true,
        };

        self.ops("stroke")?.ops.extend([
            Op::SaveGraphicsState,
            Op::SetOutlineColor {
                col: pdf_color(color),
            },
            Op::SetOutlineThickness {
                pt: Pt(width_pt as f32),
            },
            Op::DrawLine { line: outline },
            Op::RestoreGraphicsState,
        ]);
        Ok(())
    }

    fn end_page(&mut self) -> Result<()> {
        let page = self
            .current
            .take()
            .ok_or_else(|| OcrLayerError::Pdf("end_page without begin_page".into()))?;
        let width = Mm(page.size.width as f32 * MM_PER_INCH);
        let height = Mm(page.size.height as f32 * MM_PER_INCH);
        debug!(ops = page.ops.len(), "End page");
        self.pages.push(PdfPage::new(width, height, page.ops));
        Ok(())
    }
}

fn to_pt(inches: f64) -> f32 {
    (inches * POINTS_PER_INCH) as f32
}

fn pdf_color(color: Rgb) -> Color {
    Color::Rgb(printpdf::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
        icc_profile: None,
    })
}
