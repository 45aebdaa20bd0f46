//! Fixed-size inline string slots, patched in place.
//!
//! ## Layout
//! ```text
//! [CountOff]  Count                          (u32 LE)
//! [StartOff]  FirstSlot - StartBias          (u32 LE)
//! [FirstSlot] Count × record of Stride bytes, string slot at +0
//!             (MaxLen bytes, null-padded)
//! ```
//!
//! Nothing moves on save: the original file is copied and each slot is
//! overwritten, so an encoded string may not exceed `max_len` bytes.

use crate::formats::StringTable;
use crate::text::Transcoder;
use crate::utils::{read_len, slice, terminated_len};
use crate::{Error, Result};

/// Configuration of an inline-slot container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLayout {
    pub count_offset: usize,
    /// Field holding the offset of the first slot, minus `start_bias`.
    pub start_field: usize,
    pub start_bias: usize,
    /// Distance between consecutive slots.
    pub stride: usize,
    /// Largest encoded string a slot can hold.
    pub max_len: usize,
}

impl SlotLayout {
    fn slots(&self, data: &[u8]) -> Result<(usize, usize)> {
        let count = read_len(data, self.count_offset)?;
        let first = self.start_bias + read_len(data, self.start_field)?;
        Ok((count, first))
    }

    /// Returns the table and a copy of the whole file.
    pub(crate) fn load(
        &self,
        data: &[u8],
        text: &dyn Transcoder,
    ) -> Result<(StringTable, Vec<u8>)> {
        let (count, first) = self.slots(data)?;
        let mut strings = Vec::new();
        for i in 0..count {
            let at = first + i * self.stride;
            slice(data, at, self.max_len)?;
            let len = terminated_len(data, at, self.max_len);
            strings.push(text.decode(data, at, Some(len))?);
        }
        Ok((StringTable::flat(strings), data.to_vec()))
    }

    pub(crate) fn save(
        &self,
        image: &[u8],
        table: &StringTable,
        text: &dyn Transcoder,
    ) -> Result<Vec<u8>> {
        let (_, first) = self.slots(image)?;
        let mut out = image.to_vec();
        for (i, s) in table.strings().enumerate() {
            let bytes = text.encode(s)?;
            if bytes.len() > self.max_len {
                return Err(Error::StringTooLong {
                    length: bytes.len(),
                    max: self.max_len,
                    text: s.to_string(),
                });
            }
            let at = first + i * self.stride;
            let len = out.len();
            let slot = out.get_mut(at..at + self.max_len).ok_or(Error::OutOfRange {
                offset: at,
                width: self.max_len,
                len,
            })?;
            slot.fill(0);
            slot[..bytes.len()].copy_from_slice(&bytes);
        }
        Ok(out)
    }
}
