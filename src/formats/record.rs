//! Record-patched section tables.
//!
//! Each section is an array of fixed-size binary records. Some record fields
//! are absolute pointers to null-terminated strings; which ones depends on
//! the section and comes from configuration ([`RecordSection`]). Everything
//! else in a record is kept byte for byte.
//!
//! ## Layout
//! ```text
//! [0x00] Header (Signature, Unknown), kept byte for byte
//! [0x08] SectionCount                               (u32 LE)
//! [0x0C] SectionCount × (RecordCount u32, RecordTableOffset u32)
//! [...]  per section, in order:
//!          strings of every record, each + 0x00
//!          zeros to a 4-byte boundary
//!          RecordCount × RecordLen bytes of records
//! ```

use crate::formats::StringTable;
use crate::text::Transcoder;
use crate::utils::{pad_to, push_u32, read_len, slice, to_u32, write_u32};
use crate::{Error, Result};

/// Record geometry of one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSection {
    pub record_len: usize,
    /// Offsets of the string pointer fields within a record.
    pub pointers: &'static [usize],
}

/// Configuration of a record-patched container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    /// Preserved header bytes before the section count.
    pub header_len: usize,
    /// Alignment of each section's string block.
    pub align: usize,
    pub sections: &'static [RecordSection],
}

/// Non-string data of a loaded record container.
#[derive(Debug, Clone)]
pub(crate) struct Records {
    header: Vec<u8>,
    /// Raw record bytes of each section.
    sections: Vec<Vec<u8>>,
}

impl RecordLayout {
    fn section_table(&self) -> usize {
        self.header_len + 4
    }

    fn section(&self, k: usize) -> Result<&RecordSection> {
        self.sections
            .get(k)
            .ok_or(Error::Parse("more sections than the record layout describes"))
    }

    /// Returns one sectioned table per file section (records × pointer
    /// fields) and the record bytes.
    pub(crate) fn load(
        &self,
        data: &[u8],
        text: &dyn Transcoder,
    ) -> Result<(Vec<StringTable>, Records)> {
        let count = read_len(data, self.header_len)?;
        let mut tables = Vec::with_capacity(count.min(self.sections.len()));
        let mut raw = Vec::with_capacity(tables.capacity());

        for k in 0..count {
            let geometry = self.section(k)?;
            let at = self.section_table() + k * 8;
            let records = read_len(data, at)?;
            let offset = read_len(data, at + 4)?;
            let len = records
                .checked_mul(geometry.record_len)
                .ok_or(Error::Parse("record count overflows"))?;
            let bytes = slice(data, offset, len)?;

            let mut groups = Vec::with_capacity(records);
            for record in bytes.chunks_exact(geometry.record_len.max(1)) {
                let mut slots = Vec::with_capacity(geometry.pointers.len());
                for &field in geometry.pointers {
                    let ptr = read_len(record, field)?;
                    slots.push(text.decode(data, ptr, None)?);
                }
                groups.push(slots);
            }
            tables.push(StringTable::sectioned(groups));
            raw.push(bytes.to_vec());
        }

        let header = data[..self.header_len].to_vec();
        Ok((
            tables,
            Records {
                header,
                sections: raw,
            },
        ))
    }

    pub(crate) fn save(
        &self,
        records: &Records,
        tables: &[StringTable],
        text: &dyn Transcoder,
    ) -> Result<Vec<u8>> {
        let mut out = records.header.clone();
        push_u32(&mut out, to_u32("section count", tables.len())?);
        out.resize(self.section_table() + tables.len() * 8, 0);

        for (k, (table, raw)) in tables.iter().zip(&records.sections).enumerate() {
            let geometry = self.section(k)?;
            let mut patched = raw.clone();
            for (i, slots) in table.sections().iter().enumerate() {
                for (&field, s) in geometry.pointers.iter().zip(slots) {
                    let here = to_u32("string offset", out.len())?;
                    write_u32(&mut patched, i * geometry.record_len + field, here)?;
                    out.extend_from_slice(&text.encode(s)?);
                    out.push(0);
                }
            }
            pad_to(&mut out, self.align, 0);

            let at = self.section_table() + k * 8;
            let record_count = table.sections().len();
            write_u32(&mut out, at, to_u32("record count", record_count)?)?;
            let table_offset = to_u32("record table offset", out.len())?;
            write_u32(&mut out, at + 4, table_offset)?;
            out.extend_from_slice(&patched);
        }
        Ok(out)
    }
}
