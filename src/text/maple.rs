//! MapleStory DS message text: plain UTF-16LE.
//!
//! Tabs are written as `[\t]`; CR and LF use the usual `\r` / `\n` escapes.

use super::{Syntax, Token, Transcoder, tokens, window};
use crate::utils::bytes_to_hex;
use crate::{Error, Result};

const TAB: &str = "[\\t]";

/// Transcoder for MapleStory DS message tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapleText;

impl Transcoder for MapleText {
    fn decode(&self, data: &[u8], offset: usize, length: Option<usize>) -> Result<String> {
        let bytes = window(data, offset, length)?;
        if bytes.len() % 2 != 0 && length.is_some() {
            return Err(Error::InvalidCharacter {
                bytes: bytes_to_hex(&bytes[bytes.len() - 1..]),
                decoded: String::new(),
            });
        }
        let units = bytes
            .chunks_exact(2)
            .map(|p| u16::from_le_bytes([p[0], p[1]]))
            .take_while(|&u| length.is_some() || u != 0);

        let mut out = String::new();
        for c in char::decode_utf16(units) {
            match c {
                Ok('\t') => out.push_str(TAB),
                Ok('\r') => out.push_str("\\r"),
                Ok('\n') => out.push_str("\\n"),
                Ok(c) => out.push(c),
                Err(e) => {
                    return Err(Error::InvalidCharacter {
                        bytes: bytes_to_hex(&e.unpaired_surrogate().to_le_bytes()),
                        decoded: out,
                    });
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
        let text = text.replace(TAB, "\t");
        let mut out = Vec::with_capacity(text.len() * 2);
        let mut buf = [0u16; 2];
        for token in tokens(&text, syntax) {
            let c = match token? {
                Token::CarriageReturn => '\r',
                Token::LineFeed => '\n',
                Token::Char(c) => c,
                Token::Tag(tag) => return Err(Error::UnknownTag(tag.to_string())),
            };
            for unit in c.encode_utf16(&mut buf) {
                out.extend_from_slice(&unit.to_le_bytes());
            }
        }
        Ok(out)
    }
}
