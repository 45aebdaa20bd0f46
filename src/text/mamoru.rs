//! Mamoru-kun script text.
//!
//! Shift_JIS plus three kinds of engine codes:
//!
//! ```text
//! 1B 43 XX   colour change           <CXX>
//! 00..1F     any other control byte  <$XX>   (0D / 0A are \r / \n)
//! 81E1 ...   named glyphs            <[> <I> <icon:chest> ...
//! ```
//!
//! Hex values in tags are written in uppercase (`<C1A>`, `<$1B>`); either
//! case is accepted when encoding.

use super::sjis::{char_end, encode_char, is_single_byte, push_char};
use super::{Syntax, Token, Transcoder, hex_byte, tokens, window};
use crate::{Error, Result};

const ESC: u8 = 0x1B;
const COLOUR: u8 = 0x43;

/// Double-byte codes drawn as special glyphs, with their mnemonics.
const GLYPHS: &[(u16, &str)] = &[
    (0x81E1, "["),
    (0x81E2, "]"),
    (0x8754, "I"),
    (0x8755, "II"),
    (0x8756, "III"),
    (0x8785, "icon:consumable"),
    (0x8786, "icon:ingredient"),
    (0x8787, "icon:keyitem"),
    (0x8788, "icon:sword1"),
    (0x8789, "icon:sword2"),
    (0x878A, "icon:sword3"),
    (0x878B, "icon:sword4"),
    (0x878C, "icon:circle"),
    (0x878D, "icon:chest"),
];

fn glyph_name(code: u16) -> Option<&'static str> {
    GLYPHS.iter().find(|(c, _)| *c == code).map(|(_, n)| *n)
}

fn glyph_code(name: &str) -> Option<u16> {
    GLYPHS.iter().find(|(_, n)| *n == name).map(|(c, _)| *c)
}

/// Transcoder for Mamoru-kun wa Norowarete Shimatta! data files.
#[derive(Debug, Clone, Copy, Default)]
pub struct MamoruText;

impl Transcoder for MamoruText {
    fn decode(&self, data: &[u8], offset: usize, length: Option<usize>) -> Result<String> {
        let bytes = window(data, offset, length)?;
        let mut out = String::new();
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            match b {
                0x00 if length.is_none() => break,
                0x0D => {
                    out.push_str("\\r");
                    i += 1;
                }
                0x0A => {
                    out.push_str("\\n");
                    i += 1;
                }
                ESC if bytes.get(i + 1) == Some(&COLOUR) && i + 2 < bytes.len() => {
                    out.push_str(&format!("<C{:02X}>", bytes[i + 2]));
                    i += 3;
                }
                0x00..=0x1F => {
                    out.push_str(&format!("<${b:02X}>"));
                    i += 1;
                }
                _ => {
                    if !is_single_byte(b)
                        && let Some(&trail) = bytes.get(i + 1)
                        && let Some(name) = glyph_name(u16::from_be_bytes([b, trail]))
                    {
                        out.push('<');
                        out.push_str(name);
                        out.push('>');
                        i += 2;
                        continue;
                    }
                    let end = char_end(bytes, i);
                    push_char(&mut out, &bytes[i..end])?;
                    i = end;
                }
            }
        }
        Ok(out)
    }

    fn encode(&self, text: &str) -> Result<Vec<u8>> {
        let syntax = Syntax {
            escapes: true,
            tags: true,
        };
        let mut out = Vec::with_capacity(text.len() * 2);
        for token in tokens(text, syntax) {
            match token? {
                Token::CarriageReturn => out.push(0x0D),
                Token::LineFeed => out.push(0x0A),
                Token::Char(c) => encode_char(c, &mut out)?,
                Token::Tag(tag) => {
                    if let Some(code) = glyph_code(tag) {
                        out.extend_from_slice(&code.to_be_bytes());
                    } else if let Some(b) = tag.strip_prefix('$').and_then(hex_byte) {
                        out.push(b);
                    } else if let Some(b) = tag.strip_prefix('C').and_then(hex_byte) {
                        out.extend_from_slice(&[ESC, COLOUR, b]);
                    } else {
                        return Err(Error::UnknownTag(tag.to_string()));
                    }
                }
            }
        }
        Ok(out)
    }
}
