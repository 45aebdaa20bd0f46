//! Summon Night script text.
//!
//! Shift_JIS with `FF xx` engine codes. The game's font has no single-byte
//! glyphs, so printable ASCII is stored as a run of otherwise unused Greek
//! and Cyrillic double-byte characters. Decoding maps those back to ASCII;
//! encoding maps ASCII forward again. A raw single-byte ASCII character
//! therefore comes back double-byte after a round trip. The glyphs drawn
//! as `<` and `\` decode to themselves (`ε`, `Л`) so they cannot open a
//! tag or an escape.

use std::collections::HashMap;
use std::sync::LazyLock;

use super::sjis::{char_end, encode_char, push_char};
use super::{Syntax, Token, Transcoder, tokens, window};
use crate::{Error, Result};

const CONTROL: u8 = 0xFF;
const LINE_FEED: u8 = 0x21;

/// `FF xx` codes other than the line feed.
const CODES: &[(u8, &str)] = &[
    (0x20, "br"),
    (0x60, "neutral"),
    (0x61, "happy"),
    (0x62, "stern"),
    (0x63, "surprised"),
    (0x64, "upset"),
    (0x65, "sad"),
    (0x66, "tender"),
    (0x67, "cheerful"),
    (0x6B, "angry"),
    (0xFB, "gold"),
    (0xFC, "chars"),
    (0xFE, "votes"),
];

const ASCII: &str = " !\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_`abcdefghijklmnopqrstuvwxyz{|}~";
const WIDE: &str = "ΑΒΓΔΕΖΗΘΙΚΛΜΝΞΟΠΡΣΤΥΦΧΨΩαβγδεζηθικλμνξοπρστυφχψωАБВГДЕЁЖЗИЙКЛМНОПРСТУФХЦЧШЩЪЫЬЭЮЯабвгдеёжзийклм";

struct Remap {
    to_ascii: HashMap<char, char>,
    to_wide: HashMap<char, char>,
}

static REMAP: LazyLock<Remap> = LazyLock::new(|| {
    let pairs: Vec<(char, char)> = ASCII.chars().zip(WIDE.chars()).collect();
    Remap {
        to_ascii: pairs
            .iter()
            .filter(|(a, _)| !matches!(a, '<' | '\\'))
            .map(|&(a, w)| (w, a))
            .collect(),
        to_wide: pairs.into_iter().collect(),
    }
});

/// Transcoder for Summon Night data files.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummonText;

impl Transcoder for SummonText {
    fn decode(&self, data: &[u8], offset: usize, length: Option<usize>) -> Result<String> {
        let bytes = window(data, offset, length)?;
        let mut out = String::new();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                0x00 if length.is_none() => break,
                0x0D => {
                    out.push_str("\\r");
                    i += 1;
                }
                CONTROL => {
                    let Some(&arg) = bytes.get(i + 1) else {
                        return Err(Error::UnknownControlCode {
                            code: u16::from(CONTROL) << 8,
                            decoded: out,
                        });
                    };
                    if arg == LINE_FEED {
                        out.push_str("\\n");
                    } else if let Some((_, name)) = CODES.iter().find(|(c, _)| *c == arg) {
                        out.push('<');
                        out.push_str(name);
                        out.push('>');
                    } else {
                        return Err(Error::UnknownControlCode {
                            code: u16::from_be_bytes([CONTROL, arg]),
                            decoded: out,
                        });
                    }
                    i += 2;
                }
                _ => {
                    let end = char_end(bytes, i);
                    let mut ch = String::new();
                    push_char(&mut ch, &bytes[i..end]).map_err(|e| match e {
                        Error::InvalidCharacter { bytes, .. } => Error::InvalidCharacter {
                            bytes,
                            decoded: out.clone(),
                        },
                        other => other,
                    })?;
                    let mut chars = ch.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) if end - i == 2 => {
                            out.push(REMAP.to_ascii.get(&c).copied().unwrap_or(c));
                        }
                        _ => out.push_str(&ch),
                    }
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
                Token::LineFeed => out.extend_from_slice(&[CONTROL, LINE_FEED]),
                Token::Tag(tag) => match CODES.iter().find(|(_, n)| *n == tag) {
                    Some((code, _)) => out.extend_from_slice(&[CONTROL, *code]),
                    None => return Err(Error::UnknownTag(tag.to_string())),
                },
                Token::Char(c) => {
                    let c = REMAP.to_wide.get(&c).copied().unwrap_or(c);
                    encode_char(c, &mut out)?;
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn remap_tables_pair_every_character() {
        assert_eq!(ASCII.chars().count(), 95);
        assert_eq!(WIDE.chars().count(), 95);
        assert_eq!(REMAP.to_wide.len(), 95);
        assert_eq!(REMAP.to_ascii.len(), 93);
    }

    #[test]
    fn wide_glyphs_decode_to_ascii() {
        // "Α" (space) "Ρ" ('0') "Ч" ('h') in Shift_JIS
        let bytes = [0x83, 0x9F, 0x83, 0xAF, 0x84, 0x58];
        let text = SummonText.decode(&bytes, 0, None).unwrap();
        assert_eq!(text, " 0h");
        assert_eq!(SummonText.encode(&text).unwrap(), bytes);
    }

    #[test]
    fn tag_and_escape_openers_stay_wide() {
        // "ε" draws '<', "Л" draws '\'
        let mut bytes = vec![0x83, 0xC3, 0x82, 0xA0, 0x84, 0x4C];
        bytes.extend(SummonText.encode("n").unwrap());
        let text = SummonText.decode(&bytes, 0, Some(bytes.len())).unwrap();
        assert_eq!(text, "εあЛn");
        assert_eq!(SummonText.encode(&text).unwrap(), bytes);
        assert!(matches!(SummonText.encode("<"), Err(Error::UnterminatedTag(_))));
    }

    #[test]
    fn control_codes_become_tags() {
        let bytes = [0xFF, 0x61, 0x82, 0xA0, 0xFF, 0x21, 0xFF, 0x20, 0xFF, 0xFE];
        let text = SummonText.decode(&bytes, 0, None).unwrap();
        assert_eq!(text, "<happy>あ\\n<br><votes>");
        assert_eq!(SummonText.encode(&text).unwrap(), bytes);
    }

    #[test]
    fn unknown_control_code_reports_progress() {
        let bytes = [0x82, 0xA0, 0xFF, 0x99];
        match SummonText.decode(&bytes, 0, None).unwrap_err() {
            Error::UnknownControlCode { code, decoded } => {
                assert_eq!(code, 0xFF99);
                assert_eq!(decoded, "あ");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ascii_is_widened_on_encode() {
        // 'A' is drawn with "κ"
        assert_eq!(SummonText.encode("A").unwrap(), [0x83, 0xC8]);
    }
}
