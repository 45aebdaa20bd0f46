//! Tingle language database.
//!
//! A fixed header followed by a run of blocks; each block is a record table
//! plus its text area. Only block 0 carries strings: its records hold each
//! string's byte length, and the strings sit back to back in its text area.
//!
//! ## Layout
//! ```text
//! [0x00] TableCount                      (u16 LE)
//! [0x02] StringCount                     (u32 LE)
//! [0x10] TableCount × Directory entry (16 bytes)
//!          [0x00] Id                     (u32, kept)
//!          [0x04] TableOffset            (u32 LE)
//!          [0x08] TextOffset             (u32 LE)
//!          [0x0C] BlockLength            (u32 LE, table + text)
//! [0x80] Blocks, in directory order
//! ```
//!
//! ## Block 0 record (8 bytes)
//! ```text
//! [0x00] Ids                             (3 × u16, kept)
//! [0x06] TextLength                      (u16 LE, bytes incl. FFFF)
//! ```
//!
//! Block 0's text area is zero-padded to 16 bytes. Strings stored with a
//! zero length have no terminator; they stay that way while left empty.

use crate::formats::StringTable;
use crate::text::Transcoder;
use crate::utils::{pad_to, read_len, read_u16, slice, to_u16, to_u32, write_u16, write_u32};
use crate::{Error, Result};

/// Configuration of a language database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    pub table_count_offset: usize,
    pub string_count_offset: usize,
    pub header_len: usize,
    pub directory: usize,
    pub record_len: usize,
    pub length_field: usize,
    pub text_align: usize,
}

/// Non-string data of a loaded language database.
#[derive(Debug, Clone)]
pub(crate) struct Blocks {
    header: Vec<u8>,
    /// `(table, text)` bytes of every block.
    blocks: Vec<(Vec<u8>, Vec<u8>)>,
    /// Strings that were stored with a zero length.
    bare: Vec<bool>,
}

impl BlockLayout {
    fn entry(&self, i: usize) -> usize {
        self.directory + i * 16
    }

    pub(crate) fn load(&self, data: &[u8], text: &dyn Transcoder) -> Result<(StringTable, Blocks)> {
        let tables = read_u16(data, self.table_count_offset)? as usize;
        let count = read_len(data, self.string_count_offset)?;
        let header = slice(data, 0, self.header_len)?.to_vec();

        let mut blocks = Vec::with_capacity(tables);
        for i in 0..tables {
            let table_offset = read_len(data, self.entry(i) + 4)?;
            let text_offset = read_len(data, self.entry(i) + 8)?;
            let block_len = read_len(data, self.entry(i) + 12)?;
            let table_len = text_offset
                .checked_sub(table_offset)
                .ok_or(Error::Parse("text area starts before its table"))?;
            let text_len = block_len
                .checked_sub(table_len)
                .ok_or(Error::Parse("block shorter than its table"))?;
            blocks.push((
                slice(data, table_offset, table_len)?.to_vec(),
                slice(data, text_offset, text_len)?.to_vec(),
            ));
        }

        let Some((records, texts)) = blocks.first() else {
            if count > 0 {
                return Err(Error::Parse("strings declared without a string block"));
            }
            return Ok((
                StringTable::flat(Vec::new()),
                Blocks {
                    header,
                    blocks,
                    bare: Vec::new(),
                },
            ));
        };

        let mut strings = Vec::with_capacity(count);
        let mut bare = Vec::with_capacity(count);
        let mut cursor = 0;
        for j in 0..count {
            let len = read_u16(records, j * self.record_len + self.length_field)? as usize;
            strings.push(text.decode(texts, cursor, Some(len))?);
            bare.push(len == 0);
            cursor += len;
        }

        Ok((
            StringTable::flat(strings),
            Blocks {
                header,
                blocks,
                bare,
            },
        ))
    }

    pub(crate) fn save(
        &self,
        blocks: &Blocks,
        table: &StringTable,
        text: &dyn Transcoder,
    ) -> Result<Vec<u8>> {
        let mut layout: Vec<(Vec<u8>, Vec<u8>)> = blocks.blocks.clone();
        if let Some((records, texts)) = layout.first_mut() {
            texts.clear();
            for (j, s) in table.strings().enumerate() {
                let field = j * self.record_len + self.length_field;
                if s.is_empty() && blocks.bare.get(j).copied().unwrap_or(false) {
                    write_u16(records, field, 0)?;
                    continue;
                }
                let bytes = text.encode(s)?;
                write_u16(records, field, to_u16("text length", bytes.len())?)?;
                texts.extend_from_slice(&bytes);
            }
            pad_to(texts, self.text_align, 0);
        }

        let mut header = blocks.header.clone();
        let mut cursor = header.len();
        for (i, (records, texts)) in layout.iter().enumerate() {
            let at = self.entry(i);
            write_u32(&mut header, at + 4, to_u32("table offset", cursor)?)?;
            write_u32(&mut header, at + 8, to_u32("text offset", cursor + records.len())?)?;
            let block_len = records.len() + texts.len();
            write_u32(&mut header, at + 12, to_u32("block length", block_len)?)?;
            cursor += block_len;
        }

        let mut out = header;
        out.reserve(cursor - out.len());
        for (records, texts) in &layout {
            out.extend_from_slice(records);
            out.extend_from_slice(texts);
        }
        Ok(out)
    }
}
