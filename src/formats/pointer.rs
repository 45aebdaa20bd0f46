//! Flat pointer tables.
//!
//! The simplest container shape: a preserved header that ends with the
//! string count, a table of per-string entries, then the string data.
//!
//! ## Layout
//! ```text
//! [0x00]    Header, kept byte for byte (ends with Count)
//! [Table]   Count × Entry
//!             Offset  (u32 LE)
//!             Length  (u32 LE)   only for `Entry::OffsetLength`
//! [...]     String data in table order
//! ```
//!
//! Offsets are relative either to the start of the table or to the start of
//! the string data; see [`OffsetBase`].

use crate::formats::StringTable;
use crate::text::Transcoder;
use crate::utils::{push_u32, read_len, slice, to_u32};
use crate::{Error, Result};

/// Where the entry table begins and how many entries it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStart {
    /// Count at a fixed offset, table right after it.
    AfterCount { count_offset: usize },
    /// An opaque blob whose `u32` size is stored at `size_offset` starts at
    /// `blob_offset`; the count follows the blob.
    AfterBlob {
        size_offset: usize,
        blob_offset: usize,
    },
    /// A run of fixed-size records (count at `records_count_offset`) starts at
    /// `records_offset`; the table follows it. The string count is stored
    /// separately at `count_offset`.
    AfterRecords {
        records_count_offset: usize,
        records_offset: usize,
        record_len: usize,
        count_offset: usize,
    },
}

impl TableStart {
    /// `(count, table offset)`
    pub(crate) fn locate(&self, data: &[u8]) -> Result<(usize, usize)> {
        match *self {
            TableStart::AfterCount { count_offset } => {
                Ok((read_len(data, count_offset)?, count_offset + 4))
            }
            TableStart::AfterBlob {
                size_offset,
                blob_offset,
            } => {
                let count_offset = blob_offset + read_len(data, size_offset)?;
                Ok((read_len(data, count_offset)?, count_offset + 4))
            }
            TableStart::AfterRecords {
                records_count_offset,
                records_offset,
                record_len,
                count_offset,
            } => {
                let records = read_len(data, records_count_offset)?;
                let table = records
                    .checked_mul(record_len)
                    .and_then(|n| n.checked_add(records_offset))
                    .ok_or(Error::Parse("record count overflows"))?;
                Ok((read_len(data, count_offset)?, table))
            }
        }
    }
}

/// What terminates a null-terminated string on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullPad {
    /// A single `0x00`.
    Single,
    /// `0x00` then pad to an even length: one byte after an odd-length
    /// string, two after an even one (including the empty string).
    Even,
}

impl NullPad {
    pub(crate) fn apply(self, out: &mut Vec<u8>, encoded_len: usize) {
        let n = match self {
            NullPad::Single => 1,
            NullPad::Even if encoded_len % 2 == 1 => 1,
            NullPad::Even => 2,
        };
        out.resize(out.len() + n, 0);
    }
}

/// Shape of one table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    /// `(offset, length)`; strings carry no terminator.
    OffsetLength,
    /// A bare offset to a null-terminated string.
    Offset { pad: NullPad },
}

impl Entry {
    pub(crate) fn width(self) -> usize {
        match self {
            Entry::OffsetLength => 8,
            Entry::Offset { .. } => 4,
        }
    }
}

/// What stored offsets are relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetBase {
    /// The first byte of the entry table.
    Table,
    /// The first byte after the entry table.
    Strings,
}

/// Configuration of a flat pointer-table container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerLayout {
    pub start: TableStart,
    pub entry: Entry,
    pub base: OffsetBase,
}

/// Decode `count` entries of a table starting at `table`.
pub(crate) fn read_entries(
    data: &[u8],
    table: usize,
    count: usize,
    entry: Entry,
    base: OffsetBase,
    text: &dyn Transcoder,
) -> Result<Vec<String>> {
    let table_len = count
        .checked_mul(entry.width())
        .ok_or(Error::Parse("string count overflows"))?;
    slice(data, table, table_len)?;
    let base = match base {
        OffsetBase::Table => table,
        OffsetBase::Strings => table + table_len,
    };

    let mut strings = Vec::with_capacity(count);
    for i in 0..count {
        let at = table + i * entry.width();
        let offset = base + read_len(data, at)?;
        let s = match entry {
            Entry::OffsetLength => text.decode(data, offset, Some(read_len(data, at + 4)?))?,
            Entry::Offset { .. } => text.decode(data, offset, None)?,
        };
        strings.push(s);
    }
    Ok(strings)
}

/// Encode `strings` into an entry table and the string data behind it.
pub(crate) fn write_entries(
    strings: &[String],
    entry: Entry,
    base: OffsetBase,
    text: &dyn Transcoder,
) -> Result<(Vec<u8>, Vec<u8>)> {
    let table_len = strings.len() * entry.width();
    let start = match base {
        OffsetBase::Table => table_len,
        OffsetBase::Strings => 0,
    };

    let mut table = Vec::with_capacity(table_len);
    let mut blob = Vec::new();
    for s in strings {
        let bytes = text.encode(s)?;
        push_u32(&mut table, to_u32("string offset", start + blob.len())?);
        blob.extend_from_slice(&bytes);
        match entry {
            Entry::OffsetLength => push_u32(&mut table, to_u32("string length", bytes.len())?),
            Entry::Offset { pad } => pad.apply(&mut blob, bytes.len()),
        }
    }
    Ok((table, blob))
}

impl PointerLayout {
    /// Returns the table and the preserved header.
    pub(crate) fn load(
        &self,
        data: &[u8],
        text: &dyn Transcoder,
    ) -> Result<(StringTable, Vec<u8>)> {
        let (count, table) = self.start.locate(data)?;
        let strings = read_entries(data, table, count, self.entry, self.base, text)?;
        Ok((StringTable::flat(strings), data[..table].to_vec()))
    }

    pub(crate) fn save(
        &self,
        header: &[u8],
        table: &StringTable,
        text: &dyn Transcoder,
    ) -> Result<Vec<u8>> {
        let strings = table.sections().first().map(Vec::as_slice).unwrap_or(&[]);
        let (entries, blob) = write_entries(strings, self.entry, self.base, text)?;
        let mut out = Vec::with_capacity(header.len() + entries.len() + blob.len());
        out.extend_from_slice(header);
        out.extend_from_slice(&entries);
        out.extend_from_slice(&blob);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{SjisText, SummonText};
    use pretty_assertions::assert_eq;

    const COUNTED: PointerLayout = PointerLayout {
        start: TableStart::AfterCount { count_offset: 0 },
        entry: Entry::OffsetLength,
        base: OffsetBase::Table,
    };

    #[test]
    fn offset_length_table_round_trips() {
        #[rustfmt::skip]
        let data = [
            2, 0, 0, 0,
            16, 0, 0, 0, 2, 0, 0, 0,
            18, 0, 0, 0, 3, 0, 0, 0,
            b'h', b'i', b'y', b'o', b'u',
        ];
        let (table, header) = COUNTED.load(&data, &SjisText).unwrap();
        assert_eq!(table.strings().collect::<Vec<_>>(), ["hi", "you"]);
        assert_eq!(header, [2, 0, 0, 0]);
        assert_eq!(COUNTED.save(&header, &table, &SjisText).unwrap(), data);
    }

    #[test]
    fn even_padding_follows_each_string() {
        let layout = PointerLayout {
            start: TableStart::AfterRecords {
                records_count_offset: 0,
                records_offset: 8,
                record_len: 8,
                count_offset: 4,
            },
            entry: Entry::Offset { pad: NullPad::Even },
            base: OffsetBase::Strings,
        };
        #[rustfmt::skip]
        let data = [
            1, 0, 0, 0, 3, 0, 0, 0,
            0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA,
            0, 0, 0, 0, 4, 0, 0, 0, 10, 0, 0, 0,
            0xFF, 0x61, 0, 0,
            0x82, 0xA0, 0x82, 0xA2, 0xB1, 0,
            0, 0,
        ];
        let (table, header) = layout.load(&data, &SummonText).unwrap();
        assert_eq!(table.strings().collect::<Vec<_>>(), ["<happy>", "あいｱ", ""]);
        assert_eq!(header.len(), 16);
        assert_eq!(layout.save(&header, &table, &SummonText).unwrap(), data);
    }

    #[test]
    fn blob_header_is_skipped() {
        let layout = PointerLayout {
            start: TableStart::AfterBlob {
                size_offset: 4,
                blob_offset: 8,
            },
            entry: Entry::OffsetLength,
            base: OffsetBase::Table,
        };
        #[rustfmt::skip]
        let data = [
            b'D', b'C', b'P', b'B', 4, 0, 0, 0,
            9, 9, 9, 9,
            1, 0, 0, 0,
            8, 0, 0, 0, 1, 0, 0, 0,
            b'x',
        ];
        let (table, header) = layout.load(&data, &SjisText).unwrap();
        assert_eq!(table.get(0, 0), Some("x"));
        assert_eq!(header.len(), 16);
        assert_eq!(layout.save(&header, &table, &SjisText).unwrap(), data);
    }

    #[test]
    fn table_past_end_is_out_of_range() {
        let data = [9, 0, 0, 0, 0, 0];
        assert!(COUNTED.load(&data, &SjisText).is_err());
    }
}
