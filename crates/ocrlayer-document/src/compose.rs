// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page compositor: walks OCR pages and caller images in step, reconciles each
// page's geometry and draws background and text layer onto a canvas.
//
// Step k pairs OCR page k with caller image k. When the caller supplied fewer
// images than there are OCR pages, the last image is repeated; the walk stops
// once both streams are exhausted, or after the first step unless multi-page
// output is enabled.

use std::path::{Path, PathBuf};

use ocrlayer_core::error::{OcrLayerError, Result};
use ocrlayer_core::{ConvertOptions, In, Resolution, Size};
use tracing::{Level, debug, info, instrument, warn};

use crate::font::LayerFont;
use crate::hocr::{AnnotationNode, HocrDocument};
use crate::image::ImageSource;
use crate::layout::{
    Background, ImagePolicy, PageContext, ReconcileInput, SizeSource, SkipReason,
    TextLayerRenderer, reconcile, select_images,
};
use crate::logging::RunLog;
use crate::pdf::{PageCanvas, PdfCanvas};

/// Title written into the PDF metadata.
const DOCUMENT_TITLE: &str = "OCR text layer";

/// One step of the page walk.
#[derive(Debug, Clone, Copy)]
pub struct Step<'a> {
    /// 1-based step number.
    pub index: usize,
    pub page: Option<&'a AnnotationNode>,
    pub image: Option<&'a Path>,
    /// The caller image is a repeat of the last one supplied.
    pub repeated: bool,
}

/// An emitted page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSummary {
    pub step: usize,
    pub physical_size: Size<In>,
    pub effective_resolution: Resolution,
    pub size_source: SizeSource,
    /// File the background was drawn from.
    pub background: Option<PathBuf>,
    pub text_nodes: usize,
}

/// A step that produced no page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedPage {
    pub step: usize,
    pub reason: SkipReason,
}

/// Outcome of a conversion run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionReport {
    pub pages: Vec<PageSummary>,
    pub skipped: Vec<SkippedPage>,
    /// Pages sized from an assumed density although an image was involved.
    pub missing_resolution: usize,
    /// hOCR-referenced images that could not be opened.
    pub unreadable_embedded: Vec<PathBuf>,
}

impl ConversionReport {
    /// Number of pages emitted.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Physical size of every emitted page, in order.
    pub fn page_sizes(&self) -> Vec<Size<In>> {
        self.pages.iter().map(|page| page.physical_size).collect()
    }
}

/// Converts an hOCR document and/or page images into a PDF.
pub struct Converter {
    document: Option<HocrDocument>,
    images: Vec<PathBuf>,
    options: ConvertOptions,
    font: LayerFont,
}

impl Converter {
    /// A converter with Helvetica at the configured size.
    pub fn new(options: ConvertOptions) -> Self {
        let font = LayerFont::helvetica(options.font_size);
        Self {
            document: None,
            images: Vec::new(),
            options,
            font,
        }
    }

    /// A converter whose font is loaded from `options.font_path`.
    pub fn from_options(options: ConvertOptions) -> Result<Self> {
        options.validate()?;
        let font = LayerFont::load(options.font_path.as_deref(), options.font_size)?;
        Ok(Self::new(options).with_font(font))
    }

    /// Convert the pages of `document`.
    pub fn with_document(mut self, document: HocrDocument) -> Self {
        self.document = Some(document);
        self
    }

    /// Caller-supplied page images, one per step; the last one repeats.
    pub fn with_images<P: Into<PathBuf>>(mut self, images: impl IntoIterator<Item = P>) -> Self {
        self.images = images.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the text-layer font.
    pub fn with_font(mut self, font: LayerFont) -> Self {
        self.font = font;
        self
    }

    /// OCR pages in document order; empty without a document.
    pub fn pages(&self) -> Vec<&AnnotationNode> {
        self.document
            .as_ref()
            .map(HocrDocument::pages)
            .unwrap_or_default()
    }

    /// The pairing for step `index` (1-based), or `None` once the walk stops.
    pub fn plan_step<'a>(&'a self, pages: &[&'a AnnotationNode], index: usize) -> Option<Step<'a>> {
        if index == 0 || (index > 1 && !self.options.multi_page) {
            return None;
        }
        let page = pages.get(index - 1).copied();
        let repeated = index > self.images.len() && !self.images.is_empty();
        let image = self
            .images
            .get(index - 1)
            .or_else(|| self.images.last())
            .map(PathBuf::as_path);

        if page.is_none() && (image.is_none() || repeated) {
            return None;
        }
        Some(Step {
            index,
            page,
            image,
            repeated,
        })
    }

    /// Every step of the walk, in order.
    pub fn plan(&self) -> Vec<Step<'_>> {
        let pages = self.pages();
        (1..)
            .map_while(|index| self.plan_step(&pages, index))
            .collect()
    }

    /// Draw all pages onto `canvas`.
    #[instrument(skip_all, fields(images = self.images.len(), multi_page = self.options.multi_page))]
    pub fn run(&self, canvas: &mut dyn PageCanvas) -> Result<ConversionReport> {
        if self.document.is_none() {
            warn!("No hOCR document given; the PDF will be image-only");
        }

        let mut log = RunLog::new();
        let mut report = ConversionReport::default();
        let mut caller_cache: Option<(PathBuf, ImageSource)> = None;
        let renderer = TextLayerRenderer::new(&self.font, &self.options);

        for step in self.plan() {
            log.log_partial(Level::INFO, format!("page {}:", step.index));
            if step.repeated {
                log.log_partial(Level::DEBUG, "(repeating last image)");
            }

            if let Some(path) = step.image {
                let cached = caller_cache.as_ref().is_some_and(|(p, _)| p == path);
                if !cached {
                    caller_cache = Some((path.to_path_buf(), ImageSource::open(path)?));
                }
            }
            let caller = caller_cache
                .as_ref()
                .filter(|_| step.image.is_some())
                .map(|(_, image)| image);

            match self.process_step(&step, caller, canvas, &renderer, &mut report)? {
                Ok(summary) => {
                    log.log(
                        Level::INFO,
                        format!(
                            "{} ({} text nodes)",
                            summary.physical_size, summary.text_nodes
                        ),
                    );
                    report.pages.push(summary);
                }
                Err(reason) => {
                    log.log(Level::WARN, format!("skipped, {reason}"));
                    report.skipped.push(SkippedPage {
                        step: step.index,
                        reason,
                    });
                }
            }
        }

        info!(
            pages = report.page_count(),
            skipped = report.skipped.len(),
            "Conversion finished"
        );
        Ok(report)
    }

    /// Reconcile and draw one step. The inner `Err` is a skipped page.
    fn process_step(
        &self,
        step: &Step<'_>,
        caller: Option<&ImageSource>,
        canvas: &mut dyn PageCanvas,
        renderer: &TextLayerRenderer<'_>,
        report: &mut ConversionReport,
    ) -> Result<std::result::Result<PageSummary, SkipReason>> {
        let embedded_ref = step.page.and_then(|page| page.file_ref.as_deref());
        let selection = select_images(
            caller.is_some(),
            embedded_ref.is_some(),
            ImagePolicy::from(&self.options),
        );
        debug!(step = step.index, ?selection, "images selected");

        let embedded = match embedded_ref.filter(|_| selection.load_embedded) {
            Some(reference) => self.open_embedded(reference, report),
            None => None,
        };

        let background = match selection.background {
            Background::Caller => caller,
            Background::Embedded => embedded.as_ref(),
            Background::None => None,
        };
        let reference = embedded.as_ref().filter(|_| selection.embedded_is_reference);

        let input = ReconcileInput {
            page_bbox: step.page.and_then(|page| page.bounding_box),
            line_extent: step.page.and_then(AnnotationNode::line_extent),
            background: background.map(ImageSource::geometry),
            reference: reference.map(ImageSource::geometry),
        };
        let reconciled = match reconcile(&input) {
            Ok(reconciled) => reconciled,
            Err(reason) => {
                debug!(step = step.index, %reason, "Skipping page");
                return Ok(Err(reason));
            }
        };
        if reconciled.source.is_missing_resolution() {
            report.missing_resolution += 1;
            warn!(
                step = step.index,
                source = ?reconciled.source,
                size = %reconciled.physical_size,
                "No resolution metadata; page size uses an assumed density"
            );
        }

        let page = PageContext::new(&reconciled, background, self.options.vertical_inversion);
        canvas.begin_page(page.physical_size)?;
        if self.options.include_images {
            if let Some(image) = page.background {
                canvas.draw_image(image, page.page_rect())?;
            }
        }
        let text_nodes = match step.page {
            Some(node) => renderer.render_page(canvas, node, &page)?,
            None => 0,
        };
        canvas.end_page()?;

        Ok(Ok(PageSummary {
            step: step.index,
            physical_size: reconciled.physical_size,
            effective_resolution: reconciled.effective_resolution,
            size_source: reconciled.source,
            background: background.and_then(ImageSource::path).map(Path::to_path_buf),
            text_nodes,
        }))
    }

    /// Open an hOCR-referenced image; failures are reported, not fatal.
    fn open_embedded(&self, reference: &Path, report: &mut ConversionReport) -> Option<ImageSource> {
        let path = self.resolve_embedded(reference);
        match ImageSource::open(&path) {
            Ok(image) => Some(image),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Cannot open referenced image; ignoring it");
                report.unreadable_embedded.push(path);
                None
            }
        }
    }

    /// Relative references are looked up in the working directory first,
    /// then next to the hOCR file.
    fn resolve_embedded(&self, reference: &Path) -> PathBuf {
        if reference.is_absolute() || reference.exists() {
            return reference.to_path_buf();
        }
        self.document
            .as_ref()
            .and_then(HocrDocument::source_dir)
            .map(|dir| dir.join(reference))
            .filter(|candidate| candidate.exists())
            .unwrap_or_else(|| reference.to_path_buf())
    }

    /// Convert into PDF bytes.
    pub fn convert_to_bytes(&self) -> Result<(Vec<u8>, ConversionReport)> {
        let mut canvas = PdfCanvas::new(DOCUMENT_TITLE, &self.font)?;
        let report = self.run(&mut canvas)?;
        let bytes = canvas.finish()?;
        Ok((bytes, report))
    }

    /// Convert and write the PDF to `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn convert_to_file(&self, path: impl AsRef<Path>) -> Result<ConversionReport> {
        let path = path.as_ref();
        let (bytes, report) = self.convert_to_bytes()?;
        std::fs::write(path, &bytes).map_err(|err| OcrLayerError::open(path, err))?;
        info!(bytes = bytes.len(), pages = report.page_count(), "PDF written");
        Ok(report)
    }
}
