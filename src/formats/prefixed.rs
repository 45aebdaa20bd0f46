//! Pointer tables to groups of length-prefixed strings.
//!
//! Each pointer addresses a fixed-size group of strings (a name and its
//! description, for example). Every string carries a `u16` length that
//! counts an implicit terminator.
//!
//! ## Layout
//! ```text
//! [0x00]       Header (Signature), kept byte for byte
//! [CountOff]   Count               (u32 LE)
//! [CountOff+4] Count × GroupOffset (u32 LE, absolute)
//! [...]        Groups
//! ```
//!
//! ## Group
//! ```text
//! GroupLen × {
//!   Length  (u16 LE)  encoded length + 1, or 0 for an empty string
//!   Bytes   (Length - 1 bytes)
//!   Padding (0 if Length == 0, 2 if Length is odd, else 1; zeros)
//! }
//! [...] zeros up to `group_align`
//! ```

use crate::formats::StringTable;
use crate::text::Transcoder;
use crate::utils::{
    pad_to, push_u16, push_u32, read_len, read_u16, slice, to_u16, to_u32, write_u32,
};
use crate::{Error, Result};

/// Configuration of a length-prefixed group container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixedLayout {
    /// Offset of the group count; the pointer table follows it.
    pub count_offset: usize,
    /// Strings per group.
    pub group_len: usize,
    /// Alignment of each group's end; `1` for none.
    pub group_align: usize,
    /// Export one section per group instead of a flat list.
    pub sectioned: bool,
}

/// Stored length field for `encoded_len` bytes of text.
fn stored_len(encoded_len: usize) -> usize {
    if encoded_len == 0 { 0 } else { encoded_len + 1 }
}

/// Zero bytes written after the text of a string with stored length `len`.
fn padding(len: usize) -> usize {
    match len {
        0 => 0,
        _ if len % 2 == 1 => 2,
        _ => 1,
    }
}

impl PrefixedLayout {
    fn read_group(
        &self,
        data: &[u8],
        mut offset: usize,
        text: &dyn Transcoder,
    ) -> Result<Vec<String>> {
        let mut group = Vec::with_capacity(self.group_len);
        for _ in 0..self.group_len {
            let len = read_u16(data, offset)? as usize;
            group.push(text.decode(data, offset + 2, Some(len.saturating_sub(1)))?);
            offset += 2 + len + len % 2;
        }
        Ok(group)
    }

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
            .ok_or(Error::Parse("group count overflows"))?;
        slice(data, table, table_len)?;

        let mut groups = Vec::with_capacity(count);
        for i in 0..count {
            let offset = read_len(data, table + i * 4)?;
            groups.push(self.read_group(data, offset, text)?);
        }

        let strings = if self.sectioned {
            StringTable::sectioned(groups)
        } else {
            StringTable::flat(groups.concat())
        };
        Ok((strings, data[..self.count_offset].to_vec()))
    }

    pub(crate) fn save(
        &self,
        header: &[u8],
        table: &StringTable,
        text: &dyn Transcoder,
    ) -> Result<Vec<u8>> {
        let groups: Vec<&[String]> = if self.sectioned {
            table.sections().iter().map(Vec::as_slice).collect()
        } else {
            table
                .sections()
                .iter()
                .flat_map(|s| s.chunks(self.group_len.max(1)))
                .collect()
        };

        let mut out = header.to_vec();
        push_u32(&mut out, to_u32("group count", groups.len())?);
        let pointers = out.len();
        out.resize(pointers + groups.len() * 4, 0);

        for (i, group) in groups.iter().enumerate() {
            let here = to_u32("group offset", out.len())?;
            write_u32(&mut out, pointers + i * 4, here)?;
            for s in group.iter() {
                let bytes = text.encode(s)?;
                let len = stored_len(bytes.len());
                push_u16(&mut out, to_u16("string length", len)?);
                out.extend_from_slice(&bytes);
                out.resize(out.len() + padding(len), 0);
            }
            if self.group_align > 1 {
                pad_to(&mut out, self.group_align, 0);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::SjisText;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const PAIRS: PrefixedLayout = PrefixedLayout {
        count_offset: 4,
        group_len: 2,
        group_align: 4,
        sectioned: false,
    };

    #[rstest]
    #[case(0, 0, 0)]
    #[case(1, 2, 1)]
    #[case(2, 3, 2)]
    #[case(5, 6, 1)]
    fn length_and_padding(#[case] encoded: usize, #[case] stored: usize, #[case] pad: usize) {
        assert_eq!(stored_len(encoded), stored);
        assert_eq!(padding(stored), pad);
        // the reader skips exactly what the writer wrote
        assert_eq!(stored + stored % 2, encoded + pad);
    }

    #[test]
    fn aligned_pairs_round_trip() {
        #[rustfmt::skip]
        let data = [
            b'N', b'I', b'D', b'X', 1, 0, 0, 0,
            12, 0, 0, 0,
            3, 0, b'a', b'b', 0, 0,
            2, 0, b'c', 0,
            0, 0,
        ];
        let (table, header) = PAIRS.load(&data, &SjisText).unwrap();
        assert_eq!(table.strings().collect::<Vec<_>>(), ["ab", "c"]);
        assert_eq!(PAIRS.save(&header, &table, &SjisText).unwrap(), data);
    }

    #[test]
    fn sectioned_groups_keep_their_pairs() {
        let layout = PrefixedLayout {
            group_align: 1,
            sectioned: true,
            ..PAIRS
        };
        let table = StringTable::sectioned(vec![
            vec!["x".into(), "yz".into()],
            vec!["".into(), "w".into()],
        ]);
        let bytes = layout.save(b"DNGC", &table, &SjisText).unwrap();
        let (back, header) = layout.load(&bytes, &SjisText).unwrap();
        assert_eq!(header, b"DNGC");
        assert_eq!(back, table);
    }
}
