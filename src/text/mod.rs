//! Game-specific text transcoders.
//!
//! Every game stores its script in a legacy byte encoding mixed with
//! engine control codes. A transcoder turns those bytes into *escaped*
//! Unicode text that fits on one line of a text file, and back:
//!
//! * line breaks become the two-character escapes `\r` and `\n`;
//! * control codes become bracketed tags carrying their value (`<$1B>`,
//!   `<C05>`);
//! * special glyphs become bracketed mnemonics (`<I>`, `<br>`, `<happy>`);
//! * everything else goes through the game's code page.
//!
//! `encode(decode(bytes)) == bytes` holds for every sequence `decode`
//! accepts, except where a variant documents a normalisation.
//!
//! | Variant | Type | Bytes |
//! |---------|------|-------|
//! | [`TextVariant::ShiftJis`] | [`SjisText`]   | Shift_JIS with escaped line breaks |
//! | [`TextVariant::Mamoru`]   | [`MamoruText`] | Shift_JIS, `ESC C` colour codes, icon glyphs |
//! | [`TextVariant::Summon`]   | [`SummonText`] | Shift_JIS, `FF xx` codes, ASCII drawn as wide glyphs |
//! | [`TextVariant::Tingle`]   | [`TingleText`] | 16-bit custom code table |
//! | [`TextVariant::Maple`]    | [`MapleText`]  | UTF-16LE |

mod maple;
mod mamoru;
mod sjis;
mod summon;
mod tingle;

pub use maple::MapleText;
pub use mamoru::MamoruText;
pub use sjis::SjisText;
pub use summon::SummonText;
pub use tingle::TingleText;

use crate::{Error, Result};

/// Byte encoding ⇄ escaped text conversion for one game.
pub trait Transcoder {
    /// Decode the string starting at `offset`.
    ///
    /// With `length`, exactly that many bytes are decoded. Without it,
    /// decoding stops at the variant's terminator or at the end of `data`.
    fn decode(&self, data: &[u8], offset: usize, length: Option<usize>) -> Result<String>;

    /// Encode escaped text back into game bytes (no terminator unless the
    /// variant always stores one).
    fn encode(&self, text: &str) -> Result<Vec<u8>>;
}

/// The transcoders known to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextVariant {
    ShiftJis,
    Mamoru,
    Summon,
    Tingle,
    Maple,
}

impl TextVariant {
    /// The transcoder implementing this variant.
    pub fn transcoder(self) -> &'static dyn Transcoder {
        match self {
            TextVariant::ShiftJis => &SjisText,
            TextVariant::Mamoru => &MamoruText,
            TextVariant::Summon => &SummonText,
            TextVariant::Tingle => &TingleText,
            TextVariant::Maple => &MapleText,
        }
    }
}

impl Transcoder for TextVariant {
    fn decode(&self, data: &[u8], offset: usize, length: Option<usize>) -> Result<String> {
        self.transcoder().decode(data, offset, length)
    }

    fn encode(&self, text: &str) -> Result<Vec<u8>> {
        self.transcoder().encode(text)
    }
}

/// Bytes `offset..end` that a decode call may look at.
pub(crate) fn window(data: &[u8], offset: usize, length: Option<usize>) -> Result<&[u8]> {
    match length {
        Some(len) => crate::utils::slice(data, offset, len),
        None => data.get(offset..).ok_or(Error::OutOfRange {
            offset,
            width: 0,
            len: data.len(),
        }),
    }
}

/// One unit of escaped text as seen by an encoder.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    /// `\r`
    CarriageReturn,
    /// `\n`
    LineFeed,
    /// Contents of a `<...>` tag.
    Tag(&'a str),
    Char(char),
}

/// Which escape forms a variant understands.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Syntax {
    /// `\r` and `\n` stand for line breaks.
    pub escapes: bool,
    /// `<` opens a tag.
    pub tags: bool,
}

/// Split escaped text into tokens.
pub(crate) fn tokens(text: &str, syntax: Syntax) -> impl Iterator<Item = Result<Token<'_>>> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let c = rest.chars().next()?;
        if syntax.escapes {
            if let Some(tail) = rest.strip_prefix("\\r") {
                rest = tail;
                return Some(Ok(Token::CarriageReturn));
            }
            if let Some(tail) = rest.strip_prefix("\\n") {
                rest = tail;
                return Some(Ok(Token::LineFeed));
            }
        }
        if syntax.tags && c == '<' {
            return match rest[1..].find('>') {
                Some(end) => {
                    let tag = &rest[1..1 + end];
                    rest = &rest[end + 2..];
                    Some(Ok(Token::Tag(tag)))
                }
                None => {
                    let err = Error::UnterminatedTag(rest.to_string());
                    rest = "";
                    Some(Err(err))
                }
            };
        }
        rest = &rest[c.len_utf8()..];
        Some(Ok(Token::Char(c)))
    })
}

/// Parse exactly two hex digits (either case).
pub(crate) fn hex_byte(s: &str) -> Option<u8> {
    if s.len() != 2 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(s, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FULL: Syntax = Syntax {
        escapes: true,
        tags: true,
    };

    #[test]
    fn tokenizer_recognises_escapes_and_tags() {
        let toks: Vec<_> = tokens("a\\n<C05>b\\r", FULL)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(
            toks,
            vec![
                Token::Char('a'),
                Token::LineFeed,
                Token::Tag("C05"),
                Token::Char('b'),
                Token::CarriageReturn,
            ]
        );
    }

    #[test]
    fn tokenizer_rejects_open_tag() {
        let res: Result<Vec<_>> = tokens("ab<C05", FULL).collect();
        assert!(matches!(res, Err(Error::UnterminatedTag(s)) if s == "<C05"));
    }

    #[test]
    fn tags_and_escapes_can_be_disabled() {
        let plain = Syntax {
            escapes: false,
            tags: false,
        };
        let toks: Vec<_> = tokens("<\\n", plain).collect::<Result<_>>().unwrap();
        assert_eq!(
            toks,
            vec![Token::Char('<'), Token::Char('\\'), Token::Char('n')]
        );
    }

    #[test]
    fn variants_dispatch_to_their_transcoder() {
        let bytes = TextVariant::Maple.encode("hi").unwrap();
        assert_eq!(bytes, b"h\0i\0");
        assert_eq!(
            TextVariant::ShiftJis.decode(b"hi\0", 0, None).unwrap(),
            "hi"
        );
    }
}
