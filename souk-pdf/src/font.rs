//! Font registration and width measurement
//!
//! A [`FontBook`] holds one font per script role (default/Hebrew/Arabic).
//! External TTFs are registered with the document; if registration fails the
//! role degrades to the builtin Helvetica - shaping quality drops but
//! generation never fails on fonts. Width measurement reads glyph advances
//! from the embedded TTF; builtin fonts fall back to an approximate
//! per-character table so wrapping still stays inside the box.

use std::fs;
use std::path::PathBuf;

use printpdf::{BuiltinFont, IndirectFontRef, PdfDocumentReference};

use crate::bidi::Class;
use crate::error::{RenderError, RenderResult};

/// Paths to the TTF files backing each script role
#[derive(Debug, Clone, Default)]
pub struct FontConfig {
    pub default_path: Option<PathBuf>,
    pub hebrew_path: Option<PathBuf>,
    pub arabic_path: Option<PathBuf>,
}

/// A registered font plus its raw table data for measurement.
/// `data` is None for builtin fonts.
struct LoadedFont {
    font: IndirectFontRef,
    data: Option<Vec<u8>>,
}

/// Per-script font set for one document
pub struct FontBook {
    default_font: LoadedFont,
    hebrew: Option<LoadedFont>,
    arabic: Option<LoadedFont>,
}

impl FontBook {
    /// Register fonts with the document.
    ///
    /// Missing or unreadable font files degrade to the builtin default with
    /// a warning; only a builtin registration failure is fatal.
    pub fn load(doc: &PdfDocumentReference, config: &FontConfig) -> RenderResult<Self> {
        let default_font = match Self::load_external(doc, config.default_path.as_ref()) {
            Some(f) => f,
            None => LoadedFont {
                font: doc
                    .add_builtin_font(BuiltinFont::Helvetica)
                    .map_err(|e| RenderError::Font(format!("builtin font: {e}")))?,
                data: None,
            },
        };

        Ok(Self {
            default_font,
            hebrew: Self::load_external(doc, config.hebrew_path.as_ref()),
            arabic: Self::load_external(doc, config.arabic_path.as_ref()),
        })
    }

    fn load_external(
        doc: &PdfDocumentReference,
        path: Option<&PathBuf>,
    ) -> Option<LoadedFont> {
        let path = path?;
        let data = match fs::read(path) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Font file unreadable, degrading to default font");
                return None;
            }
        };
        match doc.add_external_font(&data[..]) {
            Ok(font) => Some(LoadedFont {
                font,
                data: Some(data),
            }),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Font registration failed, degrading to default font");
                None
            }
        }
    }

    fn for_class(&self, class: Class) -> &LoadedFont {
        match class {
            Class::Hebrew => self.hebrew.as_ref().unwrap_or(&self.default_font),
            Class::Arabic => self.arabic.as_ref().unwrap_or(&self.default_font),
            _ => &self.default_font,
        }
    }

    /// PDF font reference for a script class
    pub fn font_ref(&self, class: Class) -> &IndirectFontRef {
        &self.for_class(class).font
    }

    /// Measured width of `text` in points at `size_pt`, in the same font
    /// that [`font_ref`](Self::font_ref) returns for `class`.
    pub fn width_pt(&self, text: &str, class: Class, size_pt: f32) -> f32 {
        let loaded = self.for_class(class);
        match &loaded.data {
            Some(data) => measure_ttf(data, text, size_pt),
            None => measure_approx(text, size_pt),
        }
    }
}

/// Sum glyph advances from the TTF horizontal metrics
fn measure_ttf(data: &[u8], text: &str, size_pt: f32) -> f32 {
    let face = match ttf_parser::Face::parse(data, 0) {
        Ok(f) => f,
        Err(_) => return measure_approx(text, size_pt),
    };
    let upem = face.units_per_em() as f32;
    if upem <= 0.0 {
        return measure_approx(text, size_pt);
    }

    text.chars()
        .map(|c| {
            face.glyph_index(c)
                .and_then(|gid| face.glyph_hor_advance(gid))
                .map(|adv| adv as f32 / upem * size_pt)
                .unwrap_or_else(|| approx_char_width(c) * size_pt)
        })
        .sum()
}

/// Approximate widths for builtin (non-embedded) fonts
fn measure_approx(text: &str, size_pt: f32) -> f32 {
    text.chars().map(|c| approx_char_width(c) * size_pt).sum()
}

fn approx_char_width(c: char) -> f32 {
    if c == ' ' {
        0.28
    } else if c.is_ascii() {
        0.55
    } else {
        0.62
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_measure_monotonic() {
        assert!(measure_approx("ab", 12.0) > measure_approx("a", 12.0));
        assert!(measure_approx("", 12.0) == 0.0);
    }

    #[test]
    fn test_space_narrower_than_letter() {
        assert!(approx_char_width(' ') < approx_char_width('a'));
    }
}
