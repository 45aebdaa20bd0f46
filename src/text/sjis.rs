//! Shift_JIS character helpers and the plain Shift_JIS transcoder.
//!
//! Decoding goes through the WHATWG Shift_JIS table, which includes the
//! CP932 extensions. Codes that CP932 defines twice (`8790` and `81E0` are
//! both `≒`) decode to the same character and re-encode to the canonical
//! code, so such bytes do not survive a round trip unchanged.

use encoding_rs::SHIFT_JIS;

use super::{Syntax, Token, Transcoder, tokens, window};
use crate::utils::bytes_to_hex;
use crate::{Error, Result};

/// Whether `lead` is a complete Shift_JIS character on its own
/// (ASCII or half-width katakana).
#[inline]
pub(crate) fn is_single_byte(lead: u8) -> bool {
    lead < 0x80 || (0xA0..=0xDF).contains(&lead)
}

/// Byte length of the character whose first byte is `bytes[i]`, clamped to
/// the end of `bytes`.
#[inline]
pub(crate) fn char_end(bytes: &[u8], i: usize) -> usize {
    let width = if is_single_byte(bytes[i]) { 1 } else { 2 };
    (i + width).min(bytes.len())
}

/// Decode one code-page character and append it to `out`.
pub(crate) fn push_char(out: &mut String, bytes: &[u8]) -> Result<()> {
    match SHIFT_JIS.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(s) => {
            out.push_str(&s);
            Ok(())
        }
        None => Err(Error::InvalidCharacter {
            bytes: bytes_to_hex(bytes),
            decoded: out.clone(),
        }),
    }
}

/// Encode one character through the code page.
pub(crate) fn encode_char(c: char, out: &mut Vec<u8>) -> Result<()> {
    let mut buf = [0u8; 4];
    let (bytes, _, had_errors) = SHIFT_JIS.encode(c.encode_utf8(&mut buf));
    if had_errors {
        return Err(Error::Unencodable(c));
    }
    out.extend_from_slice(&bytes);
    Ok(())
}

/// Shift_JIS with `\r` / `\n` escapes and nothing else.
///
/// Used by the SaGa 2 and Ash containers. Unbounded strings end at the first
/// `0x00`; bounded ones decode every byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct SjisText;

impl Transcoder for SjisText {
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
                0x0A => {
                    out.push_str("\\n");
                    i += 1;
                }
                _ => {
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
            tags: false,
        };
        let mut out = Vec::with_capacity(text.len() * 2);
        for token in tokens(text, syntax) {
            match token? {
                Token::CarriageReturn => out.push(0x0D),
                Token::LineFeed => out.push(0x0A),
                Token::Char(c) => encode_char(c, &mut out)?,
                Token::Tag(tag) => return Err(Error::UnknownTag(tag.to_string())),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;

    // "テスト" followed by CR LF and a half-width "ｱ"
    const LINE: &[u8] = &[0x83, 0x65, 0x83, 0x58, 0x83, 0x67, 0x0D, 0x0A, 0xB1];

    #[test]
    fn decodes_mixed_widths_and_escapes_breaks() {
        let s = SjisText.decode(LINE, 0, None).unwrap();
        assert_eq!(s, "テスト\\r\\nｱ");
        assert_eq!(SjisText.encode(&s).unwrap(), LINE);
    }

    #[test]
    fn duplicate_codes_re_encode_canonically() {
        let s = SjisText.decode(&[0x87, 0x90], 0, None).unwrap();
        assert_eq!(s, "≒");
        assert_eq!(SjisText.encode(&s).unwrap(), [0x81, 0xE0]);
    }

    #[test]
    fn stops_at_null_without_length() {
        let data = b"ab\0cd";
        assert_eq!(SjisText.decode(data, 0, None).unwrap(), "ab");
        assert_eq!(SjisText.decode(data, 3, None).unwrap(), "cd");
    }

    #[test]
    fn length_bounds_decoding() {
        assert_eq!(SjisText.decode(LINE, 0, Some(4)).unwrap(), "テス");
        assert!(SjisText.decode(LINE, 0, Some(64)).is_err());
    }

    #[test]
    fn truncated_lead_byte_is_rejected() {
        let err = SjisText.decode(&[0x41, 0x83], 0, None).unwrap_err();
        match err {
            Error::InvalidCharacter { bytes, decoded } => {
                assert_eq!(bytes, "83");
                assert_eq!(decoded, "A");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unencodable_characters_fail() {
        assert!(matches!(
            SjisText.encode("😀"),
            Err(Error::Unencodable('😀'))
        ));
    }

    #[quickcheck]
    fn ascii_round_trips(seed: Vec<u8>) -> bool {
        let bytes: Vec<u8> = seed
            .into_iter()
            .map(|b| 0x20 + b % 0x5F)
            .filter(|&b| b != b'\\')
            .collect();
        let text = SjisText.decode(&bytes, 0, None).unwrap();
        SjisText.encode(&text).unwrap() == bytes
    }
}
