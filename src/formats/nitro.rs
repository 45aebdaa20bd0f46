//! Nitro generic file header.
//!
//! Shared by the NDS resource formats (NFTR, NARC, NCGR, ...).
//!
//! ## Layout
//! ```text
//! [0x00] Signature       (u32 LE, e.g. "RTFN" for NFTR)
//! [0x04] ByteOrder+Ver   (u32, kept)
//! [0x08] FileSize        (u32 LE)
//! [0x0C] HeaderSize      (u16 LE, always 0x10)
//! [0x0E] SectionCount    (u16 LE)
//! ```

use crate::utils::{push_u16, push_u32, read_u16, read_u32, signature};
use crate::{Error, Result};

/// Parsed Nitro file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NitroHeader {
    pub signature: u32,
    /// Byte-order mark and version, stored as one word.
    pub byte_order: u32,
    pub file_size: u32,
    pub section_count: u16,
}

impl NitroHeader {
    pub const SIZE: usize = 0x10;

    /// Parse the header at the start of `data`, checking its signature.
    pub fn parse(data: &[u8], expected: u32, format: &'static str) -> Result<Self> {
        signature(data, 0, expected, format)?;
        if read_u16(data, 0x0C)? as usize != Self::SIZE {
            return Err(Error::Parse("unexpected Nitro header size"));
        }
        Ok(Self {
            signature: expected,
            byte_order: read_u32(data, 0x04)?,
            file_size: read_u32(data, 0x08)?,
            section_count: read_u16(data, 0x0E)?,
        })
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        push_u32(out, self.signature);
        push_u32(out, self.byte_order);
        push_u32(out, self.file_size);
        push_u16(out, Self::SIZE as u16);
        push_u16(out, self.section_count);
    }
}
