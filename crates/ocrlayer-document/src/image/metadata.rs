// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Physical resolution metadata of raster files.
//
// The `image` crate decodes pixels but drops resolution information, so it is
// read from the encoded bytes: PNG `pHYs` (via `png`), the JFIF APP0 density
// of JPEG files, and EXIF `XResolution`/`YResolution` (via `kamadak-exif`) for
// TIFF and EXIF-tagged JPEG.

use std::io::Cursor;

use ocrlayer_core::Resolution;
use tracing::trace;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const CM_PER_INCH: f64 = 2.54;
const METERS_PER_INCH: f64 = 0.0254;

/// Resolution embedded in an encoded image, if any.
pub fn detect_resolution(bytes: &[u8]) -> Option<Resolution> {
    let found = if bytes.starts_with(PNG_SIGNATURE) {
        png_resolution(bytes)
    } else if bytes.starts_with(&[0xFF, 0xD8]) {
        jfif_resolution(bytes).or_else(|| exif_resolution(bytes))
    } else {
        exif_resolution(bytes)
    };
    found.filter(Resolution::is_usable)
}

fn png_resolution(bytes: &[u8]) -> Option<Resolution> {
    let decoder = png::Decoder::new(Cursor::new(bytes));
    let reader = decoder.read_info().ok()?;
    let dims = reader.info().pixel_dims?;
    match dims.unit {
        png::Unit::Meter => Some(Resolution::new(
            f64::from(dims.xppu) * METERS_PER_INCH,
            f64::from(dims.yppu) * METERS_PER_INCH,
        )),
        png::Unit::Unspecified => {
            trace!(xppu = dims.xppu, yppu = dims.yppu, "pHYs without unit");
            None
        }
    }
}

/// Density from a JFIF APP0 segment directly after SOI.
fn jfif_resolution(bytes: &[u8]) -> Option<Resolution> {
    let segment = bytes.get(2..18)?;
    if segment[0..2] != [0xFF, 0xE0] || &segment[4..9] != b"JFIF\0" {
        return None;
    }
    let units = segment[11];
    let x = f64::from(u16::from_be_bytes([segment[12], segment[13]]));
    let y = f64::from(u16::from_be_bytes([segment[14], segment[15]]));
    match units {
        1 => Some(Resolution::new(x, y)),
        2 => Some(Resolution::new(x * CM_PER_INCH, y * CM_PER_INCH)),
        // 0: aspect ratio only
        _ => None,
    }
}

fn exif_resolution(bytes: &[u8]) -> Option<Resolution> {
    let exif = exif::Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()?;

    let rational = |tag| {
        let field = exif.get_field(tag, exif::In::PRIMARY)?;
        match &field.value {
            exif::Value::Rational(values) => values.first().map(|r| r.to_f64()),
            _ => None,
        }
    };
    let x = rational(exif::Tag::XResolution)?;
    let y = rational(exif::Tag::YResolution).unwrap_or(x);

    let unit = exif
        .get_field(exif::Tag::ResolutionUnit, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .unwrap_or(2);
    match unit {
        2 => Some(Resolution::new(x, y)),
        3 => Some(Resolution::new(x * CM_PER_INCH, y * CM_PER_INCH)),
        _ => None,
    }
}
