use crate::colors::Color;
use crate::controls::row_start_pad;
use crate::lights::{LedInstruction, LedMode};

type Glyph = [&'static [u8; 3]; 5];

const DIGITS: [Glyph; 10] = [
    // 0
    [b" x ", b"x x", b"x x", b"x x", b" x "],
    // 1
    [b" x ", b"xx ", b" x ", b" x ", b"xxx"],
    // 2
    [b" x ", b"x x", b"  x", b" x ", b"xxx"],
    // 3
    [b"xxx", b"  x", b" x ", b"  x", b"xx "],
    // 4
    [b"x  ", b"x x", b"xxx", b"  x", b"  x"],
    // 5
    [b"xxx", b"x  ", b"xxx", b"  x", b"xxx"],
    // 6
    [b" x ", b"x  ", b"xxx", b"x x", b"xxx"],
    // 7
    [b"xxx", b"  x", b" x ", b" x ", b"x  "],
    // 8
    [b"xxx", b"x x", b"xxx", b"x x", b"xxx"],
    // 9
    [b" x ", b"x x", b"xxx", b"  x", b"xxx"],
];

const LETTER_I: Glyph = [b"xxx", b" x ", b" x ", b" x ", b"xxx"];
const LETTER_J: Glyph = [b"xxx", b"  x", b"  x", b"x x", b" x "];
const LETTER_M: Glyph = [b"x x", b"xxx", b"x x", b"x x", b"x x"];
const DASH: Glyph = [b"   ", b"   ", b"xxx", b"   ", b"   "];
const BLANK: Glyph = [b"   ", b"   ", b"   ", b"   ", b"   "];

/// How lit and unlit dots of a glyph are drawn.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GlyphStyle {
    pub lit: (LedMode, Color),
    pub dim: (LedMode, Color),
}

impl Default for GlyphStyle {
    fn default() -> Self {
        Self {
            lit: (LedMode::Bright100, Color::White),
            dim: (LedMode::Bright10, Color::DarkGrey),
        }
    }
}

/// 5x3 dot-matrix font drawn over the pad grid.
pub struct Font {}

impl Font {
    fn write_glyph(out: &mut Vec<LedInstruction>, col: usize, glyph: &Glyph, style: GlyphStyle) {
        for (row, line) in glyph.iter().enumerate() {
            let start = row_start_pad(row) + col as u8;
            for (i, dot) in line.iter().enumerate() {
                let (mode, color) = if *dot != b' ' { style.lit } else { style.dim };
                out.push(LedInstruction::pad(mode, start + i as u8, color));
            }
        }
    }

    pub fn write_digit(out: &mut Vec<LedInstruction>, col: usize, num: usize, style: GlyphStyle) {
        Self::write_glyph(out, col, &DIGITS[num % 10], style);
    }

    /// Returns false and draws nothing for characters without a glyph.
    pub fn write_char(out: &mut Vec<LedInstruction>, col: usize, ch: char, style: GlyphStyle) -> bool {
        let glyph = match ch {
            '0'..='9' => &DIGITS[(ch as usize) - ('0' as usize)],
            'I' | 'i' => &LETTER_I,
            'J' | 'j' => &LETTER_J,
            'M' | 'm' => &LETTER_M,
            '-' => &DASH,
            ' ' => &BLANK,
            _ => return false,
        };
        Self::write_glyph(out, col, glyph, style);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_fifteen_dots_at_column_offset() {
        let mut out = Vec::new();
        Font::write_digit(&mut out, 5, 1, GlyphStyle::default());
        assert_eq!(out.len(), 15);
        // top row of "1" is " x " starting at pad 37
        assert_eq!(out[0], LedInstruction::pad(LedMode::Bright10, 37, Color::DarkGrey));
        assert_eq!(out[1], LedInstruction::pad(LedMode::Bright100, 38, Color::White));
        // bottom row is fully lit
        assert!(out[12..].iter().all(|l| l.mode == LedMode::Bright100));
        assert_eq!(out[14].index, 7);
    }

    #[test]
    fn unsupported_characters_draw_nothing() {
        let mut out = Vec::new();
        assert!(!Font::write_char(&mut out, 0, 'Q', GlyphStyle::default()));
        assert!(out.is_empty());
        assert!(Font::write_char(&mut out, 1, 'J', GlyphStyle::default()));
        assert_eq!(out.len(), 15);
    }
}
