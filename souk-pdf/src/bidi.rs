//! Bidirectional text resolution
//!
//! Splits a paragraph into script runs and prepares each line for a
//! rendering primitive that can only draw left-to-right character runs at
//! absolute coordinates.
//!
//! The model is run-based: Latin/digit "word" tokens are atomic LTR units
//! (order IDs, currency amounts), Hebrew and Arabic runs are RTL, and
//! whitespace/punctuation is neutral and inherits direction from its strong
//! neighbours. For an RTL line the caller advances a cursor from the right
//! edge leftward, drawing tokens in logical order; each RTL token's glyphs
//! are reversed here so the LTR primitive paints them correctly, while
//! embedded LTR tokens keep their internal order. Paired punctuation is
//! mirrored when its resolved direction flips against the canvas.

use crate::shaping::shape_arabic;

/// Script class of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    /// Whitespace
    Space,
    /// Latin letters and digits - atomic LTR unit
    Word,
    /// Contiguous Hebrew letters
    Hebrew,
    /// Contiguous Arabic letters
    Arabic,
    /// Punctuation and anything else - direction-neutral
    Other,
}

/// Resolved direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    Ltr,
    Rtl,
}

/// A logical-order token
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    pub class: Class,
}

impl Token {
    pub fn new(text: impl Into<String>, class: Class) -> Self {
        Self {
            text: text.into(),
            class,
        }
    }
}

/// A visual run ready to draw with the LTR primitive
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    /// Glyphs in the order the primitive should paint them
    pub text: String,
    /// Script class, used for per-run font selection
    pub class: Class,
}

/// A line prepared for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedLine {
    pub dir: Dir,
    /// Runs in logical order; for RTL lines the caller places them
    /// right-to-left, for LTR lines left-to-right
    pub runs: Vec<Run>,
}

fn is_hebrew(c: char) -> bool {
    matches!(c, '\u{0590}'..='\u{05FF}' | '\u{FB1D}'..='\u{FB4F}')
}

fn is_arabic(c: char) -> bool {
    matches!(
        c,
        '\u{0600}'..='\u{06FF}'
            | '\u{0750}'..='\u{077F}'
            | '\u{FB50}'..='\u{FDFF}'
            | '\u{FE70}'..='\u{FEFF}'
    )
}

fn classify(c: char) -> Class {
    if c.is_whitespace() {
        Class::Space
    } else if is_hebrew(c) {
        Class::Hebrew
    } else if is_arabic(c) {
        Class::Arabic
    } else if c.is_alphanumeric() {
        Class::Word
    } else {
        Class::Other
    }
}

/// Mirror a paired punctuation character, or return it unchanged
pub fn mirror_char(c: char) -> char {
    match c {
        '(' => ')',
        ')' => '(',
        '[' => ']',
        ']' => '[',
        '{' => '}',
        '}' => '{',
        '<' => '>',
        '>' => '<',
        '«' => '»',
        '»' => '«',
        _ => c,
    }
}

/// Split a paragraph into tokens of uniform script class.
///
/// A single separator (`.`, `,`, `:`, `-`, `/`, `#`) sandwiched between two
/// Word tokens is merged into one Word token so amounts like `3.50` and
/// identifiers like `ORD-17` stay atomic.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();

    for c in text.chars() {
        let class = classify(c);
        match tokens.last_mut() {
            Some(last) if last.class == class => last.text.push(c),
            _ => tokens.push(Token::new(c.to_string(), class)),
        }
    }

    // Merge Word-sep-Word into a single Word token
    let mut merged: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter().peekable();
    while let Some(tok) = iter.next() {
        let is_sep = tok.class == Class::Other
            && tok.text.chars().count() == 1
            && matches!(tok.text.chars().next(), Some('.' | ',' | ':' | '-' | '/' | '#'));
        if is_sep
            && merged.last().map(|t: &Token| t.class) == Some(Class::Word)
            && iter.peek().map(|t| t.class) == Some(Class::Word)
        {
            let next = iter.next().expect("peeked");
            let last = merged.last_mut().expect("checked");
            last.text.push_str(&tok.text);
            last.text.push_str(&next.text);
        } else {
            merged.push(tok);
        }
    }

    merged
}

/// Direction of a whole line: RTL as soon as it carries any Hebrew or
/// Arabic token, LTR otherwise. The canvas base stays LTR either way.
pub fn line_direction(tokens: &[Token]) -> Dir {
    if tokens
        .iter()
        .any(|t| matches!(t.class, Class::Hebrew | Class::Arabic))
    {
        Dir::Rtl
    } else {
        Dir::Ltr
    }
}

/// Resolve the direction of every token on a line.
///
/// Strong tokens carry their own direction; neutrals take the direction of
/// their strong neighbours when both sides agree, and the line direction
/// otherwise.
fn resolve_dirs(tokens: &[Token], line_dir: Dir) -> Vec<Dir> {
    let strong = |t: &Token| match t.class {
        Class::Word => Some(Dir::Ltr),
        Class::Hebrew | Class::Arabic => Some(Dir::Rtl),
        _ => None,
    };

    tokens
        .iter()
        .enumerate()
        .map(|(i, tok)| {
            if let Some(d) = strong(tok) {
                return d;
            }
            let prev = tokens[..i].iter().rev().find_map(&strong);
            let next = tokens[i + 1..].iter().find_map(&strong);
            match (prev, next) {
                (Some(a), Some(b)) if a == b => a,
                _ => line_dir,
            }
        })
        .collect()
}

/// Prepare one logical line of tokens for drawing.
///
/// Arabic runs are contextually shaped first, then every RTL-resolved run
/// has its glyph order reversed for the LTR primitive. Neutral runs that
/// resolve RTL also get paired punctuation mirrored. Pure-LTR lines pass
/// through untouched.
pub fn prepare_line(tokens: &[Token]) -> PreparedLine {
    let dir = line_direction(tokens);
    let dirs = resolve_dirs(tokens, dir);

    let runs = tokens
        .iter()
        .zip(dirs.iter())
        .map(|(tok, d)| {
            let text = match (tok.class, d) {
                (Class::Arabic, _) => shape_arabic(&tok.text).chars().rev().collect(),
                (Class::Hebrew, _) => tok.text.chars().rev().collect(),
                (Class::Other, Dir::Rtl) => {
                    tok.text.chars().rev().map(mirror_char).collect()
                }
                _ => tok.text.clone(),
            };
            Run {
                text,
                class: tok.class,
            }
        })
        .collect();

    PreparedLine { dir, runs }
}
