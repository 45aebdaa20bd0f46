//! Nested section tables.
//!
//! An outer table points at sections; every section is a self-contained
//! `(offset, length)` string table. Sections are written back to back in
//! table order.
//!
//! ## Layout
//! ```text
//! [0x00]        Header (Signature), kept byte for byte
//! [CountOff]    SectionCount                  (u32 LE)
//! [CountOff+4]  SectionCount × SectionOffset  (u32 LE, absolute)
//! [...]         Sections
//! ```
//!
//! ## Section
//! ```text
//! [0x00] Count                              (u32 LE)
//! [0x04] Count × (Offset u32, Length u32)   relative to 0x04
//! [...]  String data, no terminators
//! ```

use crate::formats::StringTable;
use crate::formats::pointer::{Entry, OffsetBase, read_entries, write_entries};
use crate::text::Transcoder;
use crate::utils::{push_u32, read_len, slice, to_u32, write_u32};
use crate::{Error, Result};

const ENTRY: Entry = Entry::OffsetLength;
const BASE: OffsetBase = OffsetBase::Table;

/// Configuration of a nested section container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionLayout {
    /// Offset of the section count; the section pointers follow it.
    pub count_offset: usize,
}

impl SectionLayout {
    /// Returns the table and the preserved header.
    pub(crate) fn load(
        &self,
        data: &[u8],
        text: &dyn Transcoder,
    ) -> Result<(StringTable, Vec<u8>)> {
        let count = read_len(data, self.count_offset)?;
        let table = self.count_offset + 4;
        let table_len = count
            .checked_mul(4)
            .ok_or(Error::Parse("section count overflows"))?;
        slice(data, table, table_len)?;

        let mut sections = Vec::with_capacity(count);
        for k in 0..count {
            let at = read_len(data, table + k * 4)?;
            let strings = read_len(data, at)?;
            sections.push(read_entries(data, at + 4, strings, ENTRY, BASE, text)?);
        }
        Ok((
            StringTable::sectioned(sections),
            data[..self.count_offset].to_vec(),
        ))
    }

    pub(crate) fn save(
        &self,
        header: &[u8],
        table: &StringTable,
        text: &dyn Transcoder,
    ) -> Result<Vec<u8>> {
        let sections = table.sections();
        let mut out = header.to_vec();
        push_u32(&mut out, to_u32("section count", sections.len())?);
        let pointers = out.len();
        out.resize(pointers + sections.len() * 4, 0);

        for (k, strings) in sections.iter().enumerate() {
            let here = to_u32("section offset", out.len())?;
            write_u32(&mut out, pointers + k * 4, here)?;
            push_u32(&mut out, to_u32("string count", strings.len())?);
            let (entries, blob) = write_entries(strings, ENTRY, BASE, text)?;
            out.extend_from_slice(&entries);
            out.extend_from_slice(&blob);
        }
        Ok(out)
    }
}
