//! Line wrapping under a box-width constraint
//!
//! Greedy token packing: tokens flow into lines until the next token would
//! exceed the box width. A single token wider than the whole box falls back
//! to character-level splitting, so no emitted line can ever exceed the box.
//! Whitespace tokens at line edges are dropped and never contribute width.

use crate::bidi::{Class, Token};

/// One wrapped line of logical-order tokens
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub tokens: Vec<Token>,
}

impl Line {
    fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn trim_trailing_space(&mut self) {
        while self
            .tokens
            .last()
            .map(|t| t.class == Class::Space)
            .unwrap_or(false)
        {
            self.tokens.pop();
        }
    }
}

/// Wrap tokens into lines no wider than `max_width`.
///
/// `measure` must report the width of a token's text in the same font the
/// token will later be drawn with; the wrapper never re-measures in another
/// font. Width units are whatever the measurer returns (points here).
pub fn wrap_tokens<F>(tokens: &[Token], max_width: f32, measure: F) -> Vec<Line>
where
    F: Fn(&str, Class) -> f32,
{
    let mut lines: Vec<Line> = Vec::new();
    let mut current = Line::new();
    let mut used = 0.0_f32;

    let flush = |current: &mut Line, used: &mut f32, lines: &mut Vec<Line>| {
        current.trim_trailing_space();
        if !current.is_empty() {
            lines.push(std::mem::replace(current, Line::new()));
        } else {
            *current = Line::new();
        }
        *used = 0.0;
    };

    for token in tokens {
        // Leading whitespace never opens a line
        if token.class == Class::Space && current.is_empty() {
            continue;
        }

        let width = measure(&token.text, token.class);

        if used + width <= max_width {
            used += width;
            current.tokens.push(token.clone());
            continue;
        }

        if token.class == Class::Space {
            // Break at whitespace; the space itself is trimmed
            flush(&mut current, &mut used, &mut lines);
            continue;
        }

        if width <= max_width {
            // Fits on a fresh line
            flush(&mut current, &mut used, &mut lines);
            used = width;
            current.tokens.push(token.clone());
            continue;
        }

        // Oversized token: character-level split across as many lines as
        // needed, continuing from whatever room the current line has left.
        let mut piece = String::new();
        let mut piece_width = 0.0_f32;
        for c in token.text.chars() {
            let char_width = measure(&c.to_string(), token.class);
            if used + piece_width + char_width > max_width && !(piece.is_empty() && current.is_empty()) {
                if !piece.is_empty() {
                    current
                        .tokens
                        .push(Token::new(std::mem::take(&mut piece), token.class));
                }
                flush(&mut current, &mut used, &mut lines);
                piece_width = 0.0;
            }
            piece.push(c);
            piece_width += char_width;
        }
        if !piece.is_empty() {
            current.tokens.push(Token::new(piece, token.class));
            used += piece_width;
        }
    }

    flush(&mut current, &mut used, &mut lines);
    lines
}
