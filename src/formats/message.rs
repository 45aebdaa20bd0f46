//! GMM message tables (MapleStory DS).
//!
//! ## Layout
//! ```text
//! [0x00] TotalLength                  (u16 LE)
//! [0x02] Count                        (u16 LE)
//! [0x04] Count × Entry (12 bytes)
//!          [0x00] opaque              (8 bytes)
//!          [0x08] TextOffset          (u32 LE, relative to the text section)
//! [...]  Text section
//!          [0x00] SectionLength       (u16 LE, includes this field)
//!          [0x02] Count × { Length u16 LE, Length bytes of UTF-16LE }
//! ```

use crate::formats::StringTable;
use crate::text::Transcoder;
use crate::utils::{push_u16, read_len, read_u16, slice, to_u16, to_u32, write_u16, write_u32};
use crate::{Error, Result};

/// Configuration of a message table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLayout {
    pub total_len_offset: usize,
    pub count_offset: usize,
    pub table_offset: usize,
    pub entry_len: usize,
    /// Offset of the text pointer within an entry.
    pub pointer_field: usize,
}

impl MessageLayout {
    fn text_section(&self, count: usize) -> usize {
        self.table_offset + count * self.entry_len
    }

    fn pointer(&self, i: usize) -> usize {
        self.table_offset + i * self.entry_len + self.pointer_field
    }

    /// Returns the table and every byte before the text section.
    pub(crate) fn load(
        &self,
        data: &[u8],
        text: &dyn Transcoder,
    ) -> Result<(StringTable, Vec<u8>)> {
        let count = read_u16(data, self.count_offset)? as usize;
        let section = self.text_section(count);
        slice(data, 0, section)?;

        let mut strings = Vec::with_capacity(count);
        for i in 0..count {
            let at = section + read_len(data, self.pointer(i))?;
            let len = read_u16(data, at)? as usize;
            strings.push(text.decode(data, at + 2, Some(len))?);
        }
        Ok((StringTable::flat(strings), data[..section].to_vec()))
    }

    pub(crate) fn save(
        &self,
        header: &[u8],
        table: &StringTable,
        text: &dyn Transcoder,
    ) -> Result<Vec<u8>> {
        let mut head = header.to_vec();
        let mut body = vec![0u8; 2];
        for (i, s) in table.strings().enumerate() {
            write_u32(&mut head, self.pointer(i), to_u32("text offset", body.len())?)?;
            let bytes = text.encode(s)?;
            push_u16(&mut body, to_u16("message length", bytes.len())?);
            body.extend_from_slice(&bytes);
        }
        let body_len = to_u16("text section length", body.len())?;
        write_u16(&mut body, 0, body_len)?;
        let total = head.len() + body.len();
        write_u16(&mut head, self.total_len_offset, to_u16("file length", total)?)?;

        if head.len() != self.text_section(table.len()) {
            return Err(Error::Parse("message header does not match the string count"));
        }
        head.extend_from_slice(&body);
        Ok(head)
    }
}
