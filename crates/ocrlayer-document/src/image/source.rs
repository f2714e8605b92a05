// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image source: a decoded raster plus the resolution stored in its file.
// Used both as a page background and as the geometric reference of a page.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use ocrlayer_core::error::{OcrLayerError, Result};
use ocrlayer_core::{Px, Resolution, Size};
use tracing::{debug, info, instrument};

use super::metadata::detect_resolution;

/// Pixel size and optional resolution of an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageGeometry {
    pub pixel_size: Size<Px>,
    /// `None` when the file carries no usable resolution metadata.
    pub resolution: Option<Resolution>,
}

/// A page image held in memory.
pub struct ImageSource {
    image: DynamicImage,
    resolution: Option<Resolution>,
    /// File the image was read from, if any.
    path: Option<PathBuf>,
}

impl ImageSource {
    // -- Construction ---------------------------------------------------------

    /// Load and decode an image file, reading its resolution metadata.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|err| OcrLayerError::open(path, err))?;
        let mut source = Self::from_bytes(&bytes).map_err(|err| match err {
            OcrLayerError::Image(reason) => OcrLayerError::open(path, reason),
            other => other,
        })?;
        source.path = Some(path.to_path_buf());
        info!(
            width = source.image.width(),
            height = source.image.height(),
            resolution = ?source.resolution,
            "Image loaded"
        );
        Ok(source)
    }

    /// Decode an encoded image (PNG, JPEG, TIFF, ...) held in memory.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(data)
            .map_err(|err| OcrLayerError::Image(format!("failed to decode image: {err}")))?;
        let resolution = detect_resolution(data);
        debug!(
            width = image.width(),
            height = image.height(),
            resolution = ?resolution,
            "Image decoded from bytes"
        );
        Ok(Self {
            image,
            resolution,
            path: None,
        })
    }

    /// Wrap an already-decoded image with a known (or unknown) resolution.
    pub fn from_dynamic(image: DynamicImage, resolution: Option<Resolution>) -> Self {
        Self {
            image,
            resolution: resolution.filter(Resolution::is_usable),
            path: None,
        }
    }

    // -- Accessors ------------------------------------------------------------

    /// File the image was read from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Width and height in pixels.
    pub fn pixel_size(&self) -> Size<Px> {
        Size::new(f64::from(self.image.width()), f64::from(self.image.height()))
    }

    /// Resolution from the file's metadata.
    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    /// Pixel size and resolution together.
    pub fn geometry(&self) -> ImageGeometry {
        ImageGeometry {
            pixel_size: self.pixel_size(),
            resolution: self.resolution,
        }
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }
}

impl std::fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageSource")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .field("resolution", &self.resolution)
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn encode_png(width: u32, height: u32, dpi: Option<u32>) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, width, height);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_pixel_dims(dpi.map(|dpi| png::PixelDimensions {
                xppu: (f64::from(dpi) / 0.0254).round() as u32,
                yppu: (f64::from(dpi) / 0.0254).round() as u32,
                unit: png::Unit::Meter,
            }));
            let mut writer = encoder.write_header().unwrap();
            writer
                .write_image_data(&vec![200u8; (width * height * 3) as usize])
                .unwrap();
        }
        out
    }

    #[test]
    fn decodes_png_with_resolution() {
        let source = ImageSource::from_bytes(&encode_png(30, 20, Some(200))).unwrap();
        assert_eq!(source.pixel_size(), Size::new(30.0, 20.0));
        let res = source.resolution().unwrap();
        assert!((res.x - 200.0).abs() < 0.01);
        assert!((res.y - 200.0).abs() < 0.01);
    }

    #[test]
    fn png_without_resolution() {
        let source = ImageSource::from_bytes(&encode_png(4, 4, None)).unwrap();
        assert_eq!(source.resolution(), None);
        assert_eq!(source.geometry().pixel_size, Size::new(4.0, 4.0));
    }

    #[test]
    fn open_reads_file_and_keeps_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        std::fs::write(&path, encode_png(8, 6, Some(300))).unwrap();
        let source = ImageSource::open(&path).unwrap();
        assert_eq!(source.path(), Some(path.as_path()));
        assert_eq!(source.pixel_size(), Size::new(8.0, 6.0));
    }

    #[test]
    fn missing_file_is_resource_error() {
        let err = ImageSource::open("/nonexistent/page.png").unwrap_err();
        assert!(matches!(err, OcrLayerError::ResourceOpen { .. }));
    }

    #[test]
    fn undecodable_file_is_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let err = ImageSource::open(&path).unwrap_err();
        assert!(matches!(err, OcrLayerError::ResourceOpen { .. }));
    }

    #[test]
    fn from_dynamic_drops_unusable_resolution() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        let source = ImageSource::from_dynamic(image, Some(Resolution::uniform(0.0)));
        assert_eq!(source.resolution(), None);
    }
}
