// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text-layer font: the built-in Helvetica or a user-supplied TrueType/OpenType
// program, with the advance widths needed to stretch runs onto their boxes.

use std::collections::HashMap;
use std::path::Path;

use ocrlayer_core::config::DEFAULT_FONT_SIZE;
use ocrlayer_core::error::{OcrLayerError, Result};
use tracing::{debug, info, instrument};
use ttf_parser::Face;

/// Logical name every custom font is registered under.
pub const CUSTOM_FONT_NAME: &str = "Custom";

const BUILTIN_FONT_NAME: &str = "Helvetica";

/// Helvetica advance widths (1/1000 em) for U+0020..=U+007E, from the
/// Adobe core-14 AFM.
const HELVETICA_ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

/// Width used for characters outside the table.
const HELVETICA_DEFAULT_WIDTH: u16 = 556;

/// Font used for every text run of a conversion.
#[derive(Debug, Clone)]
pub struct LayerFont {
    size: f32,
    kind: FontKind,
}

#[derive(Debug, Clone)]
enum FontKind {
    Helvetica,
    Custom(CustomFont),
}

#[derive(Debug, Clone)]
struct CustomFont {
    data: Vec<u8>,
    units_per_em: u16,
    /// Horizontal advance of every character mapped by a Unicode cmap.
    advances: HashMap<char, u16>,
    /// Advance used for characters the font has no glyph for.
    fallback_advance: u16,
}

impl LayerFont {
    /// Built-in Helvetica at `size` points.
    pub fn helvetica(size: f32) -> Self {
        Self {
            size,
            kind: FontKind::Helvetica,
        }
    }

    /// Custom font when `path` is given, Helvetica otherwise.
    #[instrument(skip_all, fields(path = ?path, size = size))]
    pub fn load(path: Option<&Path>, size: f32) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::helvetica(size));
        };
        let data = std::fs::read(path).map_err(|err| OcrLayerError::open(path, err))?;
        let font = Self::from_bytes(data, size)?;
        info!(path = %path.display(), "Custom font loaded");
        Ok(font)
    }

    /// Custom font from an in-memory TTF/OTF program.
    pub fn from_bytes(data: Vec<u8>, size: f32) -> Result<Self> {
        let face = Face::parse(&data, 0)
            .map_err(|err| OcrLayerError::Font(format!("cannot parse font program: {err}")))?;
        let units_per_em = face.units_per_em().max(1);
        let fallback_advance = face
            .glyph_index(' ')
            .and_then(|id| face.glyph_hor_advance(id))
            .unwrap_or(units_per_em / 2);
        let advances = glyph_advances(&face);
        debug!(
            units_per_em,
            fallback_advance,
            mapped = advances.len(),
            glyphs = face.number_of_glyphs(),
            "Font parsed"
        );

        Ok(Self {
            size,
            kind: FontKind::Custom(CustomFont {
                data,
                units_per_em,
                advances,
                fallback_advance,
            }),
        })
    }

    /// Logical font name used in the output.
    pub fn name(&self) -> &'static str {
        match self.kind {
            FontKind::Helvetica => BUILTIN_FONT_NAME,
            FontKind::Custom(_) => CUSTOM_FONT_NAME,
        }
    }

    /// Font size in points.
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Built-in Helvetica rather than an embedded program.
    pub fn is_builtin(&self) -> bool {
        matches!(self.kind, FontKind::Helvetica)
    }

    /// Raw font program of a custom font.
    pub fn program(&self) -> Option<&[u8]> {
        match &self.kind {
            FontKind::Helvetica => None,
            FontKind::Custom(custom) => Some(&custom.data),
        }
    }

    /// Natural width of `text` in points at this font's size, without
    /// kerning or shaping.
    pub fn text_width_pt(&self, text: &str) -> f64 {
        let em = match &self.kind {
            FontKind::Helvetica => {
                let units: u32 = text.chars().map(|c| u32::from(helvetica_width(c))).sum();
                f64::from(units) / 1000.0
            }
            FontKind::Custom(custom) => custom.width_em(text),
        };
        em * f64::from(self.size)
    }
}

impl Default for LayerFont {
    fn default() -> Self {
        Self::helvetica(DEFAULT_FONT_SIZE)
    }
}

impl CustomFont {
    fn width_em(&self, text: &str) -> f64 {
        let units: u32 = text
            .chars()
            .map(|ch| self.advances.get(&ch).copied().unwrap_or(self.fallback_advance))
            .map(u32::from)
            .sum();
        f64::from(units) / f64::from(self.units_per_em)
    }
}

/// Advances of every code point in the Unicode cmap subtables. The first
/// subtable mapping a code point wins, as in `Face::glyph_index`.
fn glyph_advances(face: &Face<'_>) -> HashMap<char, u16> {
    let mut advances = HashMap::new();
    let Some(cmap) = face.tables().cmap else {
        return advances;
    };
    for subtable in cmap.subtables {
        if !subtable.is_unicode() {
            continue;
        }
        subtable.codepoints(|code_point| {
            let Some(ch) = char::from_u32(code_point) else {
                return;
            };
            if advances.contains_key(&ch) {
                return;
            }
            if let Some(advance) = subtable
                .glyph_index(code_point)
                .and_then(|glyph| face.glyph_hor_advance(glyph))
            {
                advances.insert(ch, advance);
            }
        });
    }
    advances
}

fn helvetica_width(ch: char) -> u16 {
    match ch {
        ' '..='~' => HELVETICA_ASCII_WIDTHS[ch as usize - 0x20],
        '\u{a0}' => 278,
        _ => HELVETICA_DEFAULT_WIDTH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TUFFY: &[u8] = include_bytes!("../tests/fixtures/Tuffy.ttf");

    fn hmtx_width_pt(text: &str, size: f64) -> f64 {
        let face = Face::parse(TUFFY, 0).unwrap();
        let units: u32 = text
            .chars()
            .map(|ch| {
                let glyph = face.glyph_index(ch).unwrap();
                u32::from(face.glyph_hor_advance(glyph).unwrap())
            })
            .sum();
        f64::from(units) / f64::from(face.units_per_em()) * size
    }

    #[test]
    fn custom_font_from_bytes() {
        let font = LayerFont::from_bytes(TUFFY.to_vec(), 10.0).unwrap();
        assert_eq!(font.name(), CUSTOM_FONT_NAME);
        assert!(!font.is_builtin());
        assert_eq!(font.program(), Some(TUFFY));
        assert_eq!(font.size(), 10.0);
    }

    #[test]
    fn custom_font_widths_follow_hmtx() {
        let font = LayerFont::from_bytes(TUFFY.to_vec(), 10.0).unwrap();
        let expected = hmtx_width_pt("Hello world", 10.0);
        assert!(expected > 0.0);
        assert!((font.text_width_pt("Hello world") - expected).abs() < 1e-9);
        assert!((font.text_width_pt("Hello") - hmtx_width_pt("Hello", 10.0)).abs() < 1e-9);
        assert_eq!(font.text_width_pt(""), 0.0);
    }

    #[test]
    fn unmapped_characters_use_the_space_advance() {
        let font = LayerFont::from_bytes(TUFFY.to_vec(), 12.0).unwrap();
        // Private-use code point, not in the font.
        assert!(
            (font.text_width_pt("\u{e000}") - font.text_width_pt(" ")).abs() < 1e-9
        );
    }

    #[test]
    fn custom_font_loaded_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tuffy.ttf");
        std::fs::write(&path, TUFFY).unwrap();
        let font = LayerFont::load(Some(&path), 8.0).unwrap();
        assert_eq!(font.name(), "Custom");
        assert_eq!(font.size(), 8.0);
    }

    #[test]
    fn helvetica_widths() {
        let font = LayerFont::helvetica(10.0);
        // H 722 + e 556 + l 222 + l 222 + o 556 = 2278
        assert!((font.text_width_pt("Hello") - 22.78).abs() < 1e-9);
        assert_eq!(font.text_width_pt(""), 0.0);
        assert!((font.text_width_pt(" ") - 2.78).abs() < 1e-9);
    }

    #[test]
    fn width_scales_with_size() {
        let small = LayerFont::helvetica(6.0).text_width_pt("Wide");
        let large = LayerFont::helvetica(12.0).text_width_pt("Wide");
        assert!((large - 2.0 * small).abs() < 1e-9);
    }

    #[test]
    fn table_endpoints() {
        assert_eq!(helvetica_width(' '), 278);
        assert_eq!(helvetica_width('@'), 1015);
        assert_eq!(helvetica_width('~'), 584);
        assert_eq!(helvetica_width('é'), HELVETICA_DEFAULT_WIDTH);
    }

    #[test]
    fn default_is_helvetica_12() {
        let font = LayerFont::default();
        assert!(font.is_builtin());
        assert_eq!(font.name(), "Helvetica");
        assert_eq!(font.size(), 12.0);
        assert!(font.program().is_none());
    }

    #[test]
    fn load_without_path() {
        let font = LayerFont::load(None, 9.0).unwrap();
        assert!(font.is_builtin());
        assert_eq!(font.size(), 9.0);
    }

    #[test]
    fn missing_font_file() {
        let err = LayerFont::load(Some(Path::new("/nonexistent/font.ttf")), 12.0).unwrap_err();
        assert!(matches!(err, OcrLayerError::ResourceOpen { .. }));
    }

    #[test]
    fn unparsable_font_program() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        let err = LayerFont::load(Some(&path), 12.0).unwrap_err();
        assert!(matches!(err, OcrLayerError::Font(_)));
    }
}
