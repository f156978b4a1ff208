//! Arabic contextual shaping
//!
//! Maps base Arabic letters (U+0621..U+064A) to their presentation-form
//! glyphs (U+FE70..U+FEFF) based on the joining behaviour of their
//! neighbours. Shaping must run BEFORE any directional reordering: the
//! reorderer works on already-shaped glyphs.
//!
//! This is a pure text transform with no rendering side effects, so it can
//! be tested in isolation.

/// Joining class of a character with respect to Arabic cursive joining
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Joining {
    /// Joins on both sides (most letters)
    Dual,
    /// Joins only to the preceding letter (alef, dal, reh, waw groups)
    Right,
    /// Never joins (hamza)
    Isolated,
    /// Invisible for joining purposes (harakat), copied through unchanged
    Transparent,
    /// Not an Arabic letter
    None,
}

/// Presentation forms for one letter: [isolated, final, initial, medial]
///
/// Right-joining letters only have isolated and final forms; their initial
/// and medial slots repeat the isolated and final glyphs so the selector
/// can index uniformly.
fn forms(c: char) -> Option<[char; 4]> {
    let f = match c {
        '\u{0621}' => ['\u{FE80}', '\u{FE80}', '\u{FE80}', '\u{FE80}'], // hamza
        '\u{0622}' => ['\u{FE81}', '\u{FE82}', '\u{FE81}', '\u{FE82}'], // alef madda
        '\u{0623}' => ['\u{FE83}', '\u{FE84}', '\u{FE83}', '\u{FE84}'], // alef hamza above
        '\u{0624}' => ['\u{FE85}', '\u{FE86}', '\u{FE85}', '\u{FE86}'], // waw hamza
        '\u{0625}' => ['\u{FE87}', '\u{FE88}', '\u{FE87}', '\u{FE88}'], // alef hamza below
        '\u{0626}' => ['\u{FE89}', '\u{FE8A}', '\u{FE8B}', '\u{FE8C}'], // yeh hamza
        '\u{0627}' => ['\u{FE8D}', '\u{FE8E}', '\u{FE8D}', '\u{FE8E}'], // alef
        '\u{0628}' => ['\u{FE8F}', '\u{FE90}', '\u{FE91}', '\u{FE92}'], // beh
        '\u{0629}' => ['\u{FE93}', '\u{FE94}', '\u{FE93}', '\u{FE94}'], // teh marbuta
        '\u{062A}' => ['\u{FE95}', '\u{FE96}', '\u{FE97}', '\u{FE98}'], // teh
        '\u{062B}' => ['\u{FE99}', '\u{FE9A}', '\u{FE9B}', '\u{FE9C}'], // theh
        '\u{062C}' => ['\u{FE9D}', '\u{FE9E}', '\u{FE9F}', '\u{FEA0}'], // jeem
        '\u{062D}' => ['\u{FEA1}', '\u{FEA2}', '\u{FEA3}', '\u{FEA4}'], // hah
        '\u{062E}' => ['\u{FEA5}', '\u{FEA6}', '\u{FEA7}', '\u{FEA8}'], // khah
        '\u{062F}' => ['\u{FEA9}', '\u{FEAA}', '\u{FEA9}', '\u{FEAA}'], // dal
        '\u{0630}' => ['\u{FEAB}', '\u{FEAC}', '\u{FEAB}', '\u{FEAC}'], // thal
        '\u{0631}' => ['\u{FEAD}', '\u{FEAE}', '\u{FEAD}', '\u{FEAE}'], // reh
        '\u{0632}' => ['\u{FEAF}', '\u{FEB0}', '\u{FEAF}', '\u{FEB0}'], // zain
        '\u{0633}' => ['\u{FEB1}', '\u{FEB2}', '\u{FEB3}', '\u{FEB4}'], // seen
        '\u{0634}' => ['\u{FEB5}', '\u{FEB6}', '\u{FEB7}', '\u{FEB8}'], // sheen
        '\u{0635}' => ['\u{FEB9}', '\u{FEBA}', '\u{FEBB}', '\u{FEBC}'], // sad
        '\u{0636}' => ['\u{FEBD}', '\u{FEBE}', '\u{FEBF}', '\u{FEC0}'], // dad
        '\u{0637}' => ['\u{FEC1}', '\u{FEC2}', '\u{FEC3}', '\u{FEC4}'], // tah
        '\u{0638}' => ['\u{FEC5}', '\u{FEC6}', '\u{FEC7}', '\u{FEC8}'], // zah
        '\u{0639}' => ['\u{FEC9}', '\u{FECA}', '\u{FECB}', '\u{FECC}'], // ain
        '\u{063A}' => ['\u{FECD}', '\u{FECE}', '\u{FECF}', '\u{FED0}'], // ghain
        '\u{0641}' => ['\u{FED1}', '\u{FED2}', '\u{FED3}', '\u{FED4}'], // feh
        '\u{0642}' => ['\u{FED5}', '\u{FED6}', '\u{FED7}', '\u{FED8}'], // qaf
        '\u{0643}' => ['\u{FED9}', '\u{FEDA}', '\u{FEDB}', '\u{FEDC}'], // kaf
        '\u{0644}' => ['\u{FEDD}', '\u{FEDE}', '\u{FEDF}', '\u{FEE0}'], // lam
        '\u{0645}' => ['\u{FEE1}', '\u{FEE2}', '\u{FEE3}', '\u{FEE4}'], // meem
        '\u{0646}' => ['\u{FEE5}', '\u{FEE6}', '\u{FEE7}', '\u{FEE8}'], // noon
        '\u{0647}' => ['\u{FEE9}', '\u{FEEA}', '\u{FEEB}', '\u{FEEC}'], // heh
        '\u{0648}' => ['\u{FEED}', '\u{FEEE}', '\u{FEED}', '\u{FEEE}'], // waw
        '\u{0649}' => ['\u{FEEF}', '\u{FEF0}', '\u{FEEF}', '\u{FEF0}'], // alef maksura
        '\u{064A}' => ['\u{FEF1}', '\u{FEF2}', '\u{FEF3}', '\u{FEF4}'], // yeh
        _ => return None,
    };
    Some(f)
}

fn joining(c: char) -> Joining {
    match c {
        '\u{0621}' => Joining::Isolated,
        '\u{0622}' | '\u{0623}' | '\u{0624}' | '\u{0625}' | '\u{0627}' | '\u{0629}'
        | '\u{062F}' | '\u{0630}' | '\u{0631}' | '\u{0632}' | '\u{0648}' | '\u{0649}' => {
            Joining::Right
        }
        '\u{0626}' | '\u{0628}' | '\u{062A}'..='\u{062E}' | '\u{0633}'..='\u{063A}'
        | '\u{0640}' | '\u{0641}'..='\u{0647}' | '\u{064A}' => Joining::Dual,
        // Harakat and other combining marks: invisible for joining
        '\u{064B}'..='\u{065F}' | '\u{0670}' => Joining::Transparent,
        _ => Joining::None,
    }
}

/// Lam-alef ligature forms: (alef variant, [isolated, final])
fn lam_alef(alef: char) -> Option<[char; 2]> {
    match alef {
        '\u{0622}' => Some(['\u{FEF5}', '\u{FEF6}']),
        '\u{0623}' => Some(['\u{FEF7}', '\u{FEF8}']),
        '\u{0625}' => Some(['\u{FEF9}', '\u{FEFA}']),
        '\u{0627}' => Some(['\u{FEFB}', '\u{FEFC}']),
        _ => None,
    }
}

const LAM: char = '\u{0644}';

/// Whether the letter at `idx` connects to the letter before it.
///
/// Transparent marks between the two are skipped.
fn joins_previous(chars: &[char], idx: usize) -> bool {
    let mut i = idx;
    while i > 0 {
        i -= 1;
        match joining(chars[i]) {
            Joining::Transparent => continue,
            // Dual-joining letters connect forward into us
            Joining::Dual => return true,
            _ => return false,
        }
    }
    false
}

/// Whether the letter at `idx` connects to the letter after it.
fn joins_next(chars: &[char], idx: usize) -> bool {
    if joining(chars[idx]) != Joining::Dual {
        return false;
    }
    let mut i = idx + 1;
    while i < chars.len() {
        match joining(chars[i]) {
            Joining::Transparent => {
                i += 1;
                continue;
            }
            Joining::Dual | Joining::Right => return true,
            _ => return false,
        }
    }
    false
}

/// Shape a run of Arabic text into presentation-form glyphs.
///
/// Non-Arabic characters and combining marks pass through unchanged, so the
/// function is safe to call on mixed content. The output is still in logical
/// order; directional reordering happens after shaping.
pub fn shape_arabic(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        // Lam-alef ligature: lam immediately followed by an alef variant
        // (transparent marks in between are allowed and re-emitted after).
        if c == LAM {
            let mut j = i + 1;
            while j < chars.len() && joining(chars[j]) == Joining::Transparent {
                j += 1;
            }
            if j < chars.len() {
                if let Some(lig) = lam_alef(chars[j]) {
                    let connected = joins_previous(&chars, i);
                    out.push(if connected { lig[1] } else { lig[0] });
                    for mark in &chars[i + 1..j] {
                        out.push(*mark);
                    }
                    i = j + 1;
                    continue;
                }
            }
        }

        match forms(c) {
            Some(f) => {
                let prev = joins_previous(&chars, i);
                let next = joins_next(&chars, i);
                let glyph = match (prev, next) {
                    (true, true) => f[3],  // medial
                    (true, false) => f[1], // final
                    (false, true) => f[2], // initial
                    (false, false) => f[0], // isolated
                };
                out.push(glyph);
            }
            None => out.push(c),
        }
        i += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolated_letter() {
        // Lone beh stays isolated
        assert_eq!(shape_arabic("\u{0628}"), "\u{FE8F}");
    }

    #[test]
    fn test_word_muhammad() {
        // محمد: meem initial, hah medial, meem medial, dal final
        let shaped = shape_arabic("\u{0645}\u{062D}\u{0645}\u{062F}");
        assert_eq!(shaped, "\u{FEE3}\u{FEA4}\u{FEE4}\u{FEAA}");
    }

    #[test]
    fn test_right_joining_breaks_connection() {
        // دار: dal is right-joining, so the alef after it cannot connect;
        // all three letters stay isolated.
        let shaped = shape_arabic("\u{062F}\u{0627}\u{0631}");
        assert_eq!(shaped, "\u{FEA9}\u{FE8D}\u{FEAD}");
    }

    #[test]
    fn test_lam_alef_ligature() {
        // لا at word start: isolated ligature
        assert_eq!(shape_arabic("\u{0644}\u{0627}"), "\u{FEFB}");
        // بلا: beh initial, then connected lam-alef (final ligature)
        assert_eq!(
            shape_arabic("\u{0628}\u{0644}\u{0627}"),
            "\u{FE91}\u{FEFC}"
        );
    }

    #[test]
    fn test_non_arabic_passthrough() {
        assert_eq!(shape_arabic("abc 123"), "abc 123");
    }

    #[test]
    fn test_mixed_passthrough_keeps_arabic_shaped() {
        let shaped = shape_arabic("x\u{0645}\u{062D}y");
        // Letters separated from x/y: meem initial + hah final
        assert_eq!(shaped, "x\u{FEE3}\u{FEA2}y");
    }

    #[test]
    fn test_harakat_transparent() {
        // Fatha between meem and dal must not break the join
        let shaped = shape_arabic("\u{0645}\u{064E}\u{062F}");
        assert_eq!(shaped, "\u{FEE3}\u{064E}\u{FEAA}");
    }
}
