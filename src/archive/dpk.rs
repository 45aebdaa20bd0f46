//! DPK - Summon Night X script pack.
//!
//! ## Layout
//! ```text
//! [0x00] Count                        (u32 LE)
//! [0x04] Count × Entry (12 bytes)
//!          [0x00] Id                  (u32, kept)
//!          [0x04] Offset              (u32 LE, absolute)
//!          [0x08] Size                (u32 LE, padded length)
//! [...]  0xEE up to a 16-byte boundary
//! [...]  Children, each padded with 0xEE to 16 bytes
//! ```
//!
//! Children written by [`pack`] record their padded size, so a packed
//! archive unpacks to the same bytes it was built from.

use std::fs;
use std::path::Path;

use crate::archive::ArchiveEntry;
use crate::utils::{pad_to, push_u32, read_len, read_u32, round_up, slice, to_u32};
use crate::{Error, Result};

const TABLE: usize = 0x04;
const ENTRY_LEN: usize = 0x0C;
pub const ALIGN: usize = 0x10;
pub const PADDING: u8 = 0xEE;
/// Children larger than this hold script text (DTX).
pub const MIN_TEXT_SIZE: usize = 0x10;

/// Unpack-time metadata of a DPK.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DpkManifest {
    pub entries: Vec<ArchiveEntry>,
}

impl DpkManifest {
    /// Indices of the children that are script files.
    pub fn text_children(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.size > MIN_TEXT_SIZE)
            .map(|(i, _)| i)
    }

    /// File name of child `index`, zero-padded to the digits of the count.
    pub fn child_name(&self, index: usize) -> String {
        let width = self.entries.len().to_string().len();
        format!("{index:0width$}.dtx")
    }
}

/// Read the entry table.
pub fn entries(data: &[u8]) -> Result<Vec<ArchiveEntry>> {
    let count = read_len(data, 0)?;
    let table_len = count
        .checked_mul(ENTRY_LEN)
        .ok_or(Error::Parse("DPK entry count overflows"))?;
    slice(data, TABLE, table_len)?;
    (0..count)
        .map(|i| {
            let at = TABLE + i * ENTRY_LEN;
            Ok(ArchiveEntry {
                id: read_u32(data, at)?,
                offset: read_len(data, at + 4)?,
                size: read_len(data, at + 8)?,
            })
        })
        .collect()
}

/// Split an archive into its children.
pub fn unpack(data: &[u8]) -> Result<(DpkManifest, Vec<Vec<u8>>)> {
    let entries = entries(data)?;
    let children = entries
        .iter()
        .map(|e| {
            tracing::trace!(id = e.id, offset = e.offset, size = e.size, "DPK child");
            slice(data, e.offset, e.size).map(<[u8]>::to_vec)
        })
        .collect::<Result<Vec<_>>>()?;
    tracing::debug!(children = children.len(), bytes = data.len(), "unpacked DPK");
    Ok((DpkManifest { entries }, children))
}

/// Build an archive from `children`, in manifest order.
pub fn pack<C: AsRef<[u8]>>(manifest: &DpkManifest, children: &[C]) -> Result<Vec<u8>> {
    if manifest.entries.len() != children.len() {
        return Err(Error::Parse("DPK child count does not match the manifest"));
    }
    let table_len = TABLE + ENTRY_LEN * children.len();
    let mut offset = round_up(table_len, ALIGN);

    let mut header = Vec::with_capacity(offset);
    let mut body = Vec::new();
    push_u32(&mut header, to_u32("DPK count", children.len())?);
    for (entry, child) in manifest.entries.iter().zip(children) {
        let child = child.as_ref();
        let size = round_up(child.len(), ALIGN);
        push_u32(&mut header, entry.id);
        push_u32(&mut header, to_u32("DPK offset", offset)?);
        push_u32(&mut header, to_u32("DPK size", size)?);
        body.extend_from_slice(child);
        pad_to(&mut body, ALIGN, PADDING);
        offset += size;
    }
    pad_to(&mut header, ALIGN, PADDING);

    header.extend_from_slice(&body);
    tracing::debug!(children = children.len(), bytes = header.len(), "packed DPK");
    Ok(header)
}

/// [`unpack`] into `dir`, one file per child.
pub fn unpack_to_dir(data: &[u8], dir: impl AsRef<Path>) -> Result<DpkManifest> {
    let dir = dir.as_ref();
    let (manifest, children) = unpack(data)?;
    fs::create_dir_all(dir).map_err(|e| Error::from(e).in_file(dir))?;
    for (i, child) in children.iter().enumerate() {
        let path = dir.join(manifest.child_name(i));
        fs::write(&path, child).map_err(|e| Error::from(e).in_file(&path))?;
    }
    Ok(manifest)
}

/// [`pack`] the files written by [`unpack_to_dir`].
pub fn pack_from_dir(manifest: &DpkManifest, dir: impl AsRef<Path>) -> Result<Vec<u8>> {
    let dir = dir.as_ref();
    let children = (0..manifest.entries.len())
        .map(|i| {
            let path = dir.join(manifest.child_name(i));
            fs::read(&path).map_err(|e| Error::from(e).in_file(&path))
        })
        .collect::<Result<Vec<_>>>()?;
    pack(manifest, &children)
}
