//! Paginated PDF document builder
//!
//! Wraps the underlying PDF primitive, which draws left-to-right text runs
//! at absolute coordinates, into a cursor-based page builder that knows how
//! to place bidi-prepared lines. RTL lines are laid out token by token from
//! the right edge of the box leftward, switching the active font per run;
//! LTR lines render left-to-right. Page overflow moves the builder through
//! `Building -> Paginating -> Building`; `finalize` moves it to `Finalized`
//! and writes the file.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::{
    Color, Image, ImageTransform, Line as PdfLine, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rgb,
};

use crate::bidi::{prepare_line, tokenize, Class, Dir};
use crate::error::{RenderError, RenderResult};
use crate::font::{FontBook, FontConfig};
use crate::layout::{wrap_tokens, Line};

const MM_PER_PT: f32 = 25.4 / 72.0;
/// Line advance as a multiple of the font size
const LINE_FACTOR: f32 = 1.4;
/// Baseline offset from the top of a line, as a multiple of the font size
const ASCENT_FACTOR: f32 = 0.8;

/// Document configuration (page geometry in millimetres)
#[derive(Debug, Clone)]
pub struct DocConfig {
    pub title: String,
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub fonts: FontConfig,
}

impl DocConfig {
    /// A4 portrait with a 15mm margin
    pub fn a4(title: impl Into<String>, fonts: FontConfig) -> Self {
        Self {
            title: title.into(),
            page_width: 210.0,
            page_height: 297.0,
            margin: 15.0,
            fonts,
        }
    }
}

/// Builder lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocState {
    Building,
    Paginating,
    Finalized,
}

/// A paginated receipt document
pub struct ReceiptDoc {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    fonts: FontBook,
    config: DocConfig,
    state: DocState,
    /// Vertical cursor, millimetres from the top of the current page
    cursor: f32,
    pages: usize,
}

impl ReceiptDoc {
    pub fn new(config: DocConfig) -> RenderResult<Self> {
        if config.page_width <= 2.0 * config.margin || config.page_height <= 2.0 * config.margin {
            return Err(RenderError::InvalidConfig(
                "page smaller than margins".into(),
            ));
        }

        let (doc, page, layer) = PdfDocument::new(
            &config.title,
            Mm(config.page_width),
            Mm(config.page_height),
            "content",
        );
        let layer = doc.get_page(page).get_layer(layer);
        let fonts = FontBook::load(&doc, &config.fonts)?;

        Ok(Self {
            doc,
            layer,
            fonts,
            cursor: config.margin,
            config,
            state: DocState::Building,
            pages: 1,
        })
    }

    // === Geometry ===

    pub fn x_left(&self) -> f32 {
        self.config.margin
    }

    pub fn x_right(&self) -> f32 {
        self.config.page_width - self.config.margin
    }

    pub fn content_width_mm(&self) -> f32 {
        self.config.page_width - 2.0 * self.config.margin
    }

    pub fn cursor_mm(&self) -> f32 {
        self.cursor
    }

    pub fn state(&self) -> DocState {
        self.state
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    pub fn line_height_mm(&self, size_pt: f32) -> f32 {
        size_pt * LINE_FACTOR * MM_PER_PT
    }

    fn remaining_mm(&self) -> f32 {
        self.config.page_height - self.config.margin - self.cursor
    }

    /// Move the cursor down without drawing
    pub fn advance(&mut self, mm: f32) {
        self.cursor += mm;
    }

    /// Start a new page if fewer than `needed_mm` remain. Returns true when
    /// a page break happened (the caller may want to re-draw table headers).
    pub fn ensure_space(&mut self, needed_mm: f32) -> bool {
        if self.remaining_mm() >= needed_mm {
            return false;
        }
        self.new_page();
        true
    }

    fn new_page(&mut self) {
        self.state = DocState::Paginating;
        let (page, layer) = self.doc.add_page(
            Mm(self.config.page_width),
            Mm(self.config.page_height),
            "content",
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor = self.config.margin;
        self.pages += 1;
        self.state = DocState::Building;
    }

    // === Measurement ===

    /// Width of a single-line text in millimetres, measured per token in
    /// the font that would draw it (Arabic measured shaped).
    pub fn measure_text_mm(&self, text: &str, size_pt: f32) -> f32 {
        tokenize(text)
            .iter()
            .map(|t| self.token_width_pt(&t.text, t.class, size_pt))
            .sum::<f32>()
            * MM_PER_PT
    }

    /// Height the paragraph will occupy when wrapped into `width_mm`
    pub fn measure_paragraph_mm(&self, text: &str, size_pt: f32, width_mm: f32) -> f32 {
        let lines = self.wrap(text, size_pt, width_mm);
        lines.len() as f32 * self.line_height_mm(size_pt)
    }

    fn token_width_pt(&self, text: &str, class: Class, size_pt: f32) -> f32 {
        // Measure the glyphs that will actually be drawn: Arabic is shaped
        // first and must never be measured in another font's metrics.
        if class == Class::Arabic {
            let shaped = crate::shaping::shape_arabic(text);
            self.fonts.width_pt(&shaped, class, size_pt)
        } else {
            self.fonts.width_pt(text, class, size_pt)
        }
    }

    fn wrap(&self, text: &str, size_pt: f32, width_mm: f32) -> Vec<Line> {
        let tokens = tokenize(text);
        let max_pt = width_mm / MM_PER_PT;
        wrap_tokens(&tokens, max_pt, |t, class| {
            self.token_width_pt(t, class, size_pt)
        })
    }

    // === Drawing ===

    /// Draw a wrapped, bidi-resolved paragraph into a box starting at the
    /// current cursor. Advances the cursor and returns the height used.
    pub fn draw_paragraph(&mut self, text: &str, size_pt: f32, x_mm: f32, width_mm: f32) -> f32 {
        let used = self.draw_paragraph_at(text, size_pt, x_mm, self.cursor, width_mm);
        self.cursor += used;
        used
    }

    /// Draw a wrapped paragraph at an absolute top coordinate (used for
    /// table cells). Does not move the cursor; returns the height used.
    pub fn draw_paragraph_at(
        &mut self,
        text: &str,
        size_pt: f32,
        x_mm: f32,
        y_top_mm: f32,
        width_mm: f32,
    ) -> f32 {
        let lines = self.wrap(text, size_pt, width_mm);
        let line_height = self.line_height_mm(size_pt);
        for (i, line) in lines.iter().enumerate() {
            let y = y_top_mm + i as f32 * line_height;
            self.draw_line_tokens(line, size_pt, x_mm, y, width_mm);
        }
        lines.len() as f32 * line_height
    }

    /// Draw a single already-wrapped line
    fn draw_line_tokens(&self, line: &Line, size_pt: f32, x_mm: f32, y_top_mm: f32, width_mm: f32) {
        let prepared = prepare_line(&line.tokens);
        let baseline = self.config.page_height - (y_top_mm + size_pt * ASCENT_FACTOR * MM_PER_PT);

        match prepared.dir {
            Dir::Ltr => {
                let mut x = x_mm;
                for run in &prepared.runs {
                    let w = self.fonts.width_pt(&run.text, run.class, size_pt) * MM_PER_PT;
                    self.layer.use_text(
                        run.text.clone(),
                        size_pt,
                        Mm(x),
                        Mm(baseline),
                        self.fonts.font_ref(run.class),
                    );
                    x += w;
                }
            }
            Dir::Rtl => {
                // Logical token order, cursor walking leftward from the
                // right edge of the box. Each run's glyphs are already in
                // the order the LTR primitive expects.
                let mut x = x_mm + width_mm;
                for run in &prepared.runs {
                    let w = self.fonts.width_pt(&run.text, run.class, size_pt) * MM_PER_PT;
                    x -= w;
                    self.layer.use_text(
                        run.text.clone(),
                        size_pt,
                        Mm(x),
                        Mm(baseline),
                        self.fonts.font_ref(run.class),
                    );
                }
            }
        }
    }

    /// Horizontal rule at the current cursor
    pub fn draw_rule(&mut self, x1_mm: f32, x2_mm: f32) {
        let y = self.config.page_height - self.cursor;
        self.stroke_line(
            vec![
                Point::new(Mm(x1_mm), Mm(y)),
                Point::new(Mm(x2_mm), Mm(y)),
            ],
            false,
            0.4,
        );
    }

    /// Embed a JPEG from a local file into a box (top-left anchored),
    /// preserving aspect ratio. Any decode failure degrades to an empty
    /// placeholder frame; the document is never failed over an image.
    pub fn draw_image_file(
        &mut self,
        path: &Path,
        x_mm: f32,
        y_top_mm: f32,
        box_w_mm: f32,
        box_h_mm: f32,
    ) {
        match self.load_jpeg(path) {
            Some(image) => {
                let dpi = 300.0_f32;
                let native_w_mm = image.image.width.0 as f32 * 25.4 / dpi;
                let native_h_mm = image.image.height.0 as f32 * 25.4 / dpi;
                if native_w_mm <= 0.0 || native_h_mm <= 0.0 {
                    self.draw_placeholder(x_mm, y_top_mm, box_w_mm, box_h_mm);
                    return;
                }
                let scale = (box_w_mm / native_w_mm).min(box_h_mm / native_h_mm);
                let h_mm = native_h_mm * scale;
                let y = self.config.page_height - (y_top_mm + h_mm);
                image.add_to_layer(
                    self.layer.clone(),
                    ImageTransform {
                        translate_x: Some(Mm(x_mm)),
                        translate_y: Some(Mm(y)),
                        scale_x: Some(scale),
                        scale_y: Some(scale),
                        dpi: Some(dpi),
                        ..Default::default()
                    },
                );
            }
            None => self.draw_placeholder(x_mm, y_top_mm, box_w_mm, box_h_mm),
        }
    }

    fn load_jpeg(&self, path: &Path) -> Option<Image> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Image file unreadable, drawing placeholder");
                return None;
            }
        };
        let mut reader = std::io::BufReader::new(file);
        let decoder = match printpdf::image_crate::codecs::jpeg::JpegDecoder::new(&mut reader) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Not a decodable JPEG, drawing placeholder");
                return None;
            }
        };
        match Image::try_from(decoder) {
            Ok(img) => Some(img),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Image embed failed, drawing placeholder");
                None
            }
        }
    }

    /// Empty frame drawn where an image could not be embedded
    fn draw_placeholder(&self, x_mm: f32, y_top_mm: f32, w_mm: f32, h_mm: f32) {
        let top = self.config.page_height - y_top_mm;
        let bottom = top - h_mm;
        self.stroke_line(
            vec![
                Point::new(Mm(x_mm), Mm(top)),
                Point::new(Mm(x_mm + w_mm), Mm(top)),
                Point::new(Mm(x_mm + w_mm), Mm(bottom)),
                Point::new(Mm(x_mm), Mm(bottom)),
            ],
            true,
            0.3,
        );
    }

    fn stroke_line(&self, points: Vec<Point>, closed: bool, thickness: f32) {
        self.layer
            .set_outline_color(Color::Rgb(Rgb::new(0.4, 0.4, 0.4, None)));
        self.layer.set_outline_thickness(thickness);
        self.layer.add_line(PdfLine {
            points: points.into_iter().map(|p| (p, false)).collect(),
            is_closed: closed,
        });
    }

    // === Finalize ===

    /// Write the document to `path` and release it. Stream-write failures
    /// surface as [`RenderError`]; the builder is consumed either way, so
    /// temp resources held by the caller can always be dropped afterwards.
    pub fn finalize(mut self, path: &Path) -> RenderResult<()> {
        self.state = DocState::Finalized;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.doc
            .save(&mut writer)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        tracing::debug!(path = %path.display(), pages = self.pages, "Receipt document finalized");
        Ok(())
    }
}
