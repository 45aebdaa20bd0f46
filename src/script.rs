//! Editable text files.
//!
//! A [`StringTable`] is exported as one escaped string per line. Sectioned
//! tables put a separator line before every section:
//!
//! ```text
//! ====================[0]====================
//! first string of section 0
//! second string of section 0
//! ====================[1]====================
//! ...
//! ```
//!
//! Exported lines end with CRLF; imports accept CRLF or LF. UTF-16LE files
//! start with a byte-order mark, Shift_JIS files have none.
//!
//! Import is driven by the loaded table: it reads exactly as many lines as
//! the table has strings, so a translator cannot add or drop strings.

use std::fs;
use std::path::Path;

use encoding_rs::{EncoderResult, SHIFT_JIS, UTF_16LE};

use crate::formats::StringTable;
use crate::{Error, Result};

/// Marks a separator line; string lines must not contain it.
const RULE: &str = "==========";
const BOM: [u8; 2] = [0xFF, 0xFE];

/// Character encoding of an exported text file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextEncoding {
    Utf16Le,
    ShiftJis,
}

impl TextEncoding {
    fn encode(self, text: &str) -> Result<Vec<u8>> {
        match self {
            TextEncoding::Utf16Le => {
                let mut out = Vec::with_capacity(2 + text.len() * 2);
                out.extend_from_slice(&BOM);
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
                Ok(out)
            }
            TextEncoding::ShiftJis => {
                let mut encoder = SHIFT_JIS.new_encoder();
                let mut out = Vec::with_capacity(text.len() * 2);
                let mut rest = text;
                loop {
                    let (result, read) =
                        encoder.encode_from_utf8_to_vec_without_replacement(rest, &mut out, true);
                    rest = &rest[read..];
                    match result {
                        EncoderResult::InputEmpty => return Ok(out),
                        EncoderResult::OutputFull => out.reserve(rest.len() * 2 + 2),
                        EncoderResult::Unmappable(c) => return Err(Error::Unencodable(c)),
                    }
                }
            }
        }
    }

    fn decode(self, file: &[u8]) -> Result<String> {
        let decoded = match self {
            TextEncoding::Utf16Le => {
                let body = file.strip_prefix(&BOM).unwrap_or(file);
                if body.len() % 2 != 0 {
                    return Err(Error::Parse("UTF-16 text file has an odd length"));
                }
                UTF_16LE.decode_without_bom_handling_and_without_replacement(body)
            }
            TextEncoding::ShiftJis => {
                SHIFT_JIS.decode_without_bom_handling_and_without_replacement(file)
            }
        };
        decoded
            .map(|s| s.into_owned())
            .ok_or(Error::Parse("text file does not match its encoding"))
    }
}

/// The separator line written before section `k`.
pub fn section_header(k: usize) -> String {
    format!("{RULE}{RULE}[{k}]{RULE}{RULE}")
}

/// Render `table` as a text file.
pub fn export(table: &StringTable, encoding: TextEncoding) -> Result<Vec<u8>> {
    let mut text = String::new();
    for (k, section) in table.sections().iter().enumerate() {
        if table.is_sectioned() {
            text.push_str(&section_header(k));
            text.push_str("\r\n");
        }
        for s in section {
            text.push_str(s);
            text.push_str("\r\n");
        }
    }
    encoding.encode(&text)
}

/// Read an edited text file shaped like `template`.
///
/// Lines beyond the template's strings are ignored.
pub fn import(file: &[u8], template: &StringTable, encoding: TextEncoding) -> Result<StringTable> {
    let text = encoding.decode(file)?;
    let mut lines = text
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .enumerate()
        .map(|(i, l)| (i + 1, l));
    let mut next = |last: usize| {
        lines
            .next()
            .ok_or(Error::UnexpectedEndOfScript { line: last + 1 })
    };

    let mut line = 0;
    let mut sections = Vec::with_capacity(template.sections().len());
    for (k, section) in template.sections().iter().enumerate() {
        if template.is_sectioned() {
            (line, _) = next(line)?;
        }
        let mut strings = Vec::with_capacity(section.len());
        for _ in section {
            let (n, s) = next(line)?;
            line = n;
            if template.is_sectioned() && s.contains(RULE) {
                return Err(Error::LineBreak {
                    section: k,
                    line: n,
                });
            }
            strings.push(s.to_string());
        }
        sections.push(strings);
    }

    Ok(if template.is_sectioned() {
        StringTable::sectioned(sections)
    } else {
        StringTable::flat(sections.into_iter().next().unwrap_or_default())
    })
}

/// [`export`] to a file, creating parent directories.
pub fn export_file(
    table: &StringTable,
    encoding: TextEncoding,
    path: impl AsRef<Path>,
) -> Result<()> {
    let path = path.as_ref();
    let out = export(table, encoding).map_err(|e| e.in_file(path))?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::from(e).in_file(path))?;
    }
    fs::write(path, out).map_err(|e| Error::from(e).in_file(path))
}

/// [`import`] from a file.
pub fn import_file(
    path: impl AsRef<Path>,
    template: &StringTable,
    encoding: TextEncoding,
) -> Result<StringTable> {
    let path = path.as_ref();
    let file = fs::read(path).map_err(|e| Error::from(e).in_file(path))?;
    import(&file, template, encoding).map_err(|e| e.in_file(path))
}
