// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ocrlayer — hOCR to PDF converter
//
// Entry point. Parses the command line, initialises logging, merges the
// optional JSON config with the flags and runs one conversion.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use ocrlayer_core::error::{OcrLayerError, Result};
use ocrlayer_core::ConvertOptions;
use ocrlayer_document::{ConversionReport, Converter, HocrDocument, Verbosity};

#[derive(Debug, Parser)]
#[command(name = "ocrlayer")]
#[command(
    about = "Create a PDF with a positioned text layer from hOCR and page images",
    long_about = None
)]
struct Cli {
    /// hOCR input file
    #[arg(short = 'i', long = "hocr", value_name = "FILE")]
    hocr: Option<PathBuf>,

    /// PDF output file
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// TrueType font for the text layer
    #[arg(short, long, value_name = "FILE")]
    font: Option<PathBuf>,

    /// Draw the OCR text visibly
    #[arg(short = 't', long)]
    visible_text: bool,

    /// Draw the page images
    #[arg(short = 'I', long)]
    include_images: bool,

    /// Use the full text of every line instead of per-word text
    #[arg(short = 'c', long)]
    full_line_text: bool,

    /// Stroke the bounding box of every text node
    #[arg(short = 'b', long)]
    bounding_boxes: bool,

    /// Ignore images referenced in the hOCR
    #[arg(short = 'n', long = "no-hocr-images")]
    no_hocr_images: bool,

    /// Emit one page per hOCR page or image
    #[arg(short = 'm', long)]
    multi_page: bool,

    /// Size pages from the hOCR-referenced image even when it is not drawn
    #[arg(short = 'r', long = "hocr-image-reference")]
    hocr_image_reference: bool,

    /// Flip coordinates from top-left to bottom-left origin
    #[arg(short = 'V', long)]
    vertical_inversion: bool,

    /// Only show warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// JSON file with conversion options; flags override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also write the plain body text of the hOCR document
    #[arg(short = 'T', long, value_name = "FILE", requires = "hocr")]
    text_output: Option<PathBuf>,

    /// Page images, used in order
    #[arg(value_name = "IMAGE")]
    images: Vec<PathBuf>,
}

impl Cli {
    /// Config file settings with every set flag applied on top.
    fn options(&self) -> Result<ConvertOptions> {
        let mut options = match &self.config {
            Some(path) => ConvertOptions::from_json_file(path)?,
            None => ConvertOptions::default(),
        };

        options.visible_text |= self.visible_text;
        options.include_images |= self.include_images;
        options.full_line_text |= self.full_line_text;
        options.bounding_boxes |= self.bounding_boxes;
        options.ignore_embedded_images |= self.no_hocr_images;
        options.multi_page |= self.multi_page;
        options.embedded_as_reference |= self.hocr_image_reference;
        options.vertical_inversion |= self.vertical_inversion;
        if let Some(font) = &self.font {
            options.font_path = Some(font.clone());
        }
        Ok(options)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(verbosity.filter_directive())),
        )
        .init();

    match run(&cli) {
        Ok(report) => {
            summarize(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "conversion failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ConversionReport> {
    let options = cli.options()?;
    let mut converter = Converter::from_options(options)?.with_images(cli.images.iter().cloned());

    if let Some(path) = &cli.hocr {
        let document = HocrDocument::open(path)?;
        if let Some(text_path) = &cli.text_output {
            std::fs::write(text_path, document.body_text())
                .map_err(|err| OcrLayerError::open(text_path, err))?;
            tracing::info!(path = %text_path.display(), "body text written");
        }
        converter = converter.with_document(document);
    }

    converter.convert_to_file(&cli.output)
}

fn summarize(report: &ConversionReport) {
    for page in &report.pages {
        tracing::debug!(
            step = page.step,
            size = %page.physical_size,
            resolution = %page.effective_resolution,
            source = ?page.size_source,
            text_nodes = page.text_nodes,
            "page"
        );
    }
    for skipped in &report.skipped {
        tracing::debug!(step = skipped.step, reason = %skipped.reason, "page skipped");
    }
    tracing::info!(
        pages = report.page_count(),
        skipped = report.skipped.len(),
        assumed_resolution = report.missing_resolution,
        "conversion complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn output_is_required() {
        assert!(Cli::try_parse_from(["ocrlayer", "-i", "page.hocr"]).is_err());
    }

    #[test]
    fn short_flags_map_to_options() {
        let cli = Cli::try_parse_from([
            "ocrlayer", "-i", "page.hocr", "-o", "out.pdf", "-t", "-I", "-c", "-b", "-n", "-m",
            "-r", "-V", "-f", "font.ttf", "scan1.png", "scan2.png",
        ])
        .unwrap();
        let options = cli.options().unwrap();
        assert!(options.visible_text);
        assert!(options.include_images);
        assert!(options.full_line_text);
        assert!(options.bounding_boxes);
        assert!(options.ignore_embedded_images);
        assert!(options.multi_page);
        assert!(options.embedded_as_reference);
        assert!(options.vertical_inversion);
        assert_eq!(options.font_path, Some(PathBuf::from("font.ttf")));
        assert_eq!(cli.images.len(), 2);
    }

    #[test]
    fn plain_invocation_uses_defaults() {
        let cli = Cli::try_parse_from(["ocrlayer", "-o", "out.pdf", "scan.png"]).unwrap();
        assert_eq!(cli.options().unwrap(), ConvertOptions::default());
        assert_eq!(Verbosity::from_flags(cli.quiet, cli.verbose), Verbosity::Normal);
    }

    #[test]
    fn verbosity_flags() {
        let cli = Cli::try_parse_from(["ocrlayer", "-o", "out.pdf", "-vv"]).unwrap();
        assert_eq!(Verbosity::from_flags(cli.quiet, cli.verbose), Verbosity::VeryVerbose);
        assert!(Cli::try_parse_from(["ocrlayer", "-o", "out.pdf", "-q", "-v"]).is_err());
    }

    #[test]
    fn text_output_needs_hocr() {
        assert!(Cli::try_parse_from(["ocrlayer", "-o", "out.pdf", "-T", "body.txt"]).is_err());
    }

    #[test]
    fn config_file_is_overridden_by_flags() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("options.json");
        std::fs::write(&config, r#"{ "font_size": 9.5, "bounding_boxes": true }"#).unwrap();

        let config = config.to_str().unwrap();
        let cli = Cli::try_parse_from(["ocrlayer", "-o", "out.pdf", "-t", "--config", config])
            .unwrap();
        let options = cli.options().unwrap();
        assert_eq!(options.font_size, 9.5);
        assert!(options.bounding_boxes);
        assert!(options.visible_text);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("options.json");
        std::fs::write(&config, r#"{ "font_size": 0.0 }"#).unwrap();

        let config = config.to_str().unwrap();
        let cli = Cli::try_parse_from(["ocrlayer", "-o", "out.pdf", "--config", config]).unwrap();
        assert!(matches!(cli.options(), Err(OcrLayerError::Config(_))));
    }
}
