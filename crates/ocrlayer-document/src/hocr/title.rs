// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// hOCR `title` attribute parser.
//
// The attribute is a free-form list of properties, e.g.
// `bbox 10 20 300 400; image 'scan001.png'; ppageno 0`. Two properties are
// read: the bounding box and the image file reference. Parsing never fails;
// anything that does not match simply leaves the field empty.

use std::path::PathBuf;
use std::sync::LazyLock;

use ocrlayer_core::{Px, Rect};
use regex::Regex;

static BBOX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"bbox((?:\s+\d+){4})").expect("bbox pattern is valid"));

static FILE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:file|image)\s(["'][^'"]+['"]|[^\s'"]+)"#).expect("file pattern is valid")
});

/// Properties extracted from a `title` attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitleAttributes {
    /// `bbox x0 y0 x1 y1` in pixels.
    pub bbox: Option<Rect<Px>>,
    /// `file …` or `image …` reference, quotes stripped.
    pub file: Option<PathBuf>,
}

/// Parse both properties from a raw `title` attribute.
pub fn parse_title(title: &str) -> TitleAttributes {
    TitleAttributes {
        bbox: parse_bbox(title),
        file: parse_file(title),
    }
}

/// First `bbox` followed by four unsigned integers.
pub fn parse_bbox(title: &str) -> Option<Rect<Px>> {
    let captures = BBOX_PATTERN.captures(title)?;
    let mut coords = [0u32; 4];
    for (slot, token) in coords.iter_mut().zip(captures[1].split_whitespace()) {
        *slot = token.parse().ok()?;
    }
    Some(Rect::from_bbox(coords))
}

/// First `file` / `image` reference.
pub fn parse_file(title: &str) -> Option<PathBuf> {
    let captures = FILE_PATTERN.captures(title)?;
    let raw = captures[1].trim_end_matches(';');
    let path = raw.trim_matches(|c| c == '"' || c == '\'');
    if path.is_empty() {
        return None;
    }
    Some(PathBuf::from(path))
}
