//! # souk-pdf
//!
//! Bidirectional-text PDF layout library - low-level rendering capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to draw mixed Hebrew/Arabic/Latin text on a PDF
//! canvas whose text primitive only draws left-to-right character runs at
//! absolute coordinates:
//!
//! - Arabic contextual shaping (presentation forms, lam-alef ligatures)
//! - Token classification and bidi direction resolution
//! - Paired-bracket mirroring when visual direction flips
//! - Width measurement from embedded font metrics
//! - Greedy line wrapping with character-split fallback
//! - Paginated document building with per-script font switching
//!
//! Business logic (WHAT to render) stays in application code:
//! - Order receipt layout → souk-server
//!
//! ## Example
//!
//! ```ignore
//! use souk_pdf::{DocConfig, FontConfig, ReceiptDoc};
//!
//! let mut doc = ReceiptDoc::new(DocConfig::a4("Receipt", FontConfig::default()))?;
//! doc.draw_paragraph("הזמנה 1234 (ABC)", 12.0, doc.x_left(), doc.content_width_mm());
//! doc.finalize(&path)?;
//! ```

mod bidi;
mod document;
mod error;
mod font;
mod layout;
mod shaping;

// Re-exports
pub use bidi::{line_direction, mirror_char, prepare_line, tokenize, Class, Dir, PreparedLine, Run, Token};
pub use document::{DocConfig, DocState, ReceiptDoc};
pub use error::{RenderError, RenderResult};
pub use font::{FontBook, FontConfig};
pub use layout::{wrap_tokens, Line};
pub use shaping::shape_arabic;
