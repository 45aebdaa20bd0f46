//! Tingle's Balloon Trip of Love language database text.
//!
//! Every character is a little-endian `u16` index into a custom code table.
//! Strings end with `FFFF`.
//!
//! ## Code table
//! ```text
//! 0000..001B  U+0020..U+003B  ASCII punctuation and digits
//! 001C        <lt>
//! 001D        '='
//! 001E        <gt>
//! 001F..005E  U+003F..U+007E  ASCII letters and symbols
//! 00E0..011E  SJIS 8140..817E full-width punctuation
//! 011F..014B  SJIS 8180..81AC
//! 0151..01A3  SJIS 829F..82F1 hiragana
//! 01B1..01EF  SJIS 8340..837E katakana
//! 01F0..0206  SJIS 8380..8396
//! 0251 02D4 03BE 0500         <hXXXX> (raw glyph codes)
//! F00X        <X>             engine command
//! F10X vvvv   <X:v>           engine command with a decimal argument
//! FFFF        terminator
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use encoding_rs::SHIFT_JIS;

use super::{Syntax, Token, Transcoder, window};
use crate::utils::bytes_to_hex;
use crate::{Error, Result};

const TERMINATOR: u16 = 0xFFFF;
const LESS_THAN: u16 = 0x001C;
const GREATER_THAN: u16 = 0x001E;
const COMMAND: u16 = 0xF000;
const COMMAND_WITH_ARG: u16 = 0xF100;
const RAW_GLYPHS: [u16; 4] = [0x0251, 0x02D4, 0x03BE, 0x0500];

/// `(first code, first Unicode scalar, count)`
const UNICODE_RANGES: &[(u16, u32, u16)] = &[
    (0x0000, 0x0020, 28),
    (0x001D, 0x003D, 1),
    (0x001F, 0x003F, 64),
];

/// `(first code, first Shift_JIS code, count)`
const SJIS_RANGES: &[(u16, u16, u16)] = &[
    (0x00E0, 0x8140, 63),
    (0x011F, 0x8180, 45),
    (0x0151, 0x829F, 83),
    (0x01B1, 0x8340, 63),
    (0x01F0, 0x8380, 23),
];

struct Table {
    to_char: HashMap<u16, char>,
    to_code: HashMap<char, u16>,
}

static TABLE: LazyLock<Table> = LazyLock::new(|| {
    let mut to_char = HashMap::new();
    for &(code, first, count) in UNICODE_RANGES {
        for i in 0..count {
            if let Some(c) = char::from_u32(first + u32::from(i)) {
                to_char.insert(code + i, c);
            }
        }
    }
    for &(code, first, count) in SJIS_RANGES {
        for i in 0..count {
            let bytes = (first + i).to_be_bytes();
            let decoded = SHIFT_JIS.decode_without_bom_handling_and_without_replacement(&bytes);
            if let Some(c) = decoded.and_then(|s| s.chars().next()) {
                to_char.insert(code + i, c);
            }
        }
    }
    let to_code = to_char.iter().map(|(&k, &c)| (c, k)).collect();
    Table { to_char, to_code }
});

fn parse_hex_digit(s: &str) -> Option<u16> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.to_digit(16).map(|d| d as u16),
        _ => None,
    }
}

fn encode_tag(tag: &str, out: &mut Vec<u16>) -> Result<()> {
    let unknown = || Error::UnknownTag(tag.to_string());
    match tag {
        "lt" => out.push(LESS_THAN),
        "gt" => out.push(GREATER_THAN),
        _ => {
            if let Some(hex) = tag.strip_prefix('h')
                && hex.len() == 4
            {
                let code = u16::from_str_radix(hex, 16).map_err(|_| unknown())?;
                out.push(code);
            } else if let Some((cmd, arg)) = tag.split_once(':') {
                let cmd = parse_hex_digit(cmd).ok_or_else(unknown)?;
                let arg: u16 = arg.parse().map_err(|_| unknown())?;
                out.extend([COMMAND_WITH_ARG | cmd, arg]);
            } else {
                let cmd = parse_hex_digit(tag).ok_or_else(unknown)?;
                out.push(COMMAND | cmd);
            }
        }
    }
    Ok(())
}

/// Transcoder for the Tingle language database.
///
/// Encoded strings always carry their `FFFF` terminator.
#[derive(Debug, Clone, Copy, Default)]
pub struct TingleText;

impl Transcoder for TingleText {
    fn decode(&self, data: &[u8], offset: usize, length: Option<usize>) -> Result<String> {
        let bytes = window(data, offset, length)?;
        let mut units = bytes
            .chunks(2)
            .map(|pair| match pair {
                [lo, hi] => Ok(u16::from_le_bytes([*lo, *hi])),
                _ => Err(bytes_to_hex(pair)),
            });
        let mut out = String::new();
        while let Some(unit) = units.next() {
            let code = unit.map_err(|bytes| Error::InvalidCharacter {
                bytes,
                decoded: out.clone(),
            })?;
            match code {
                TERMINATOR if length.is_none() => break,
                TERMINATOR => {}
                LESS_THAN => out.push_str("<lt>"),
                GREATER_THAN => out.push_str("<gt>"),
                0xF000..=0xF00F => out.push_str(&format!("<{:X}>", code & 0x0F)),
                0xF100..=0xF10F => {
                    let Some(Ok(arg)) = units.next() else {
                        return Err(Error::UnknownControlCode { code, decoded: out });
                    };
                    out.push_str(&format!("<{:X}:{}>", code & 0x0F, arg));
                }
                _ if RAW_GLYPHS.contains(&code) => out.push_str(&format!("<h{code:04X}>")),
                _ => match TABLE.to_char.get(&code) {
                    Some(&c) => out.push(c),
                    None => return Err(Error::UnknownControlCode { code, decoded: out }),
                },
            }
        }
        Ok(out)
    }

    fn encode(&self, text: &str) -> Result<Vec<u8>> {
        let syntax = Syntax {
            escapes: false,
            tags: true,
        };
        let mut codes = Vec::with_capacity(text.len() + 1);
        for token in super::tokens(text, syntax) {
            match token? {
                Token::Tag(tag) => encode_tag(tag, &mut codes)?,
                Token::Char(c) => match TABLE.to_code.get(&c) {
                    Some(&code) => codes.push(code),
                    None => return Err(Error::Unencodable(c)),
                },
                Token::CarriageReturn | Token::LineFeed => {
                    return Err(Error::Parse("line break escapes are not used by this encoding"));
                }
            }
        }
        codes.push(TERMINATOR);
        Ok(codes.iter().flat_map(|c| c.to_le_bytes()).collect())
    }
}
