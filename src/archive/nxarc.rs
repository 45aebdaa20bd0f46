//! NXARC - Nexon folder archive (MapleStory DS).
//!
//! ## Layout
//! ```text
//! [0x00] Signature "NxAC"               (u32 LE)
//! [0x04] FolderCount                    (u16 LE)
//! [0x06] FileCount                      (u16 LE)
//! [0x08] FileTableOffset                (u32 LE)
//! [0x0C] DataOffset                     (u32 LE, end of the header)
//! [0x20] FolderCount × FileCount        (u16 LE + 2 bytes, kept)
//! [...]  FolderCount × Name             (ASCII, null-terminated)
//! [FileTableOffset]
//!        FileCount × (Offset u32, Size u32), offsets relative to DataOffset
//! [DataOffset]
//!        Children, each padded with 0xFF to 4 bytes
//! ```
//!
//! Files belong to folders in order: the first `count[0]` files to folder
//! 0, and so on. The whole header is kept on pack; only the file table is
//! rewritten.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::archive::{ArchiveEntry, FileKind};
use crate::utils::{pad_to, read_len, read_u16, signature, slice, terminated_len, to_u32, write_u32};
use crate::{Error, Result};

/// `"NxAC"`
pub const SIGNATURE: u32 = 0x4341784E;
pub const ALIGN: usize = 4;
pub const PADDING: u8 = 0xFF;
const FOLDERS: usize = 0x20;

/// Children of MapleStory DS that are message tables, as `folder:index`.
pub const MAPLESTORY_GMM: &[&str] = &[
    "IN/STAGE/GLOBAL:0",
    "IN/STAGE/GLOBAL:1",
    "IN/STAGE/GLOBAL:2",
    "IN/STAGE/GLOBAL:28",
    "IN/STAGE/GLOBAL:30",
    "IN/STAGE/GLOBAL:32",
    "IN/STAGE/GLOBAL:33",
    "IN/STAGE/GLOBAL:34",
    "IN/STAGE/GLOBAL:39",
    "IN/STAGE/GLOBAL:41",
    "IN/STAGE/GLOBAL:42",
    "IN/STAGE/GLOBAL:44",
    "IN/STAGE/GLOBAL:45",
    "IN/STAGE/GLOBAL:47",
    "IN/STAGE/GLOBAL:50",
    "IN/STAGE/GLOBAL:52",
    "IN/STAGE/GLOBAL:53",
    "IN/STAGE/GLOBAL:59",
    "IN/STAGE/GLOBAL:60",
    "IN/STAGE/GLOBAL:62",
    "IN/STAGE/GLOBAL:64",
    "IN/STAGE/GLOBAL:65",
    "IN/STAGE/GLOBAL:67",
    "IN/STAGE/GLOBAL:68",
    "IN/STAGE/GLOBAL:71",
];

/// Game-specific unpack settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NxarcConfig {
    /// `folder:index` keys of children that are message tables.
    pub gmm_keys: Vec<String>,
}

impl NxarcConfig {
    pub fn maplestory() -> Self {
        Self {
            gmm_keys: MAPLESTORY_GMM.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn is_gmm(&self, folder: &str, index: usize) -> bool {
        let key = format!("{folder}:{index}");
        self.gmm_keys.iter().any(|k| *k == key)
    }
}

/// One folder of the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NxarcFolder {
    pub name: String,
    pub count: usize,
}

/// Unpack-time metadata of an NXARC.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NxarcManifest {
    pub folders: Vec<NxarcFolder>,
    /// Kind of every child, in file order.
    pub kinds: Vec<FileKind>,
    /// Length of the preserved header.
    pub header_len: usize,
}

impl NxarcManifest {
    /// `(folder, index within folder)` of every child, in file order.
    pub fn positions(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.folders
            .iter()
            .flat_map(|f| (0..f.count).map(move |i| (f.name.as_str(), i)))
    }

    /// Relative path of every child, in file order.
    pub fn child_paths(&self) -> Vec<PathBuf> {
        self.positions()
            .zip(&self.kinds)
            .map(|((folder, i), kind)| {
                Path::new(folder).join(format!("{i}{}", kind.extension()))
            })
            .collect()
    }

    /// Indices of the children that are message tables.
    pub fn gmm_children(&self) -> impl Iterator<Item = usize> + '_ {
        self.kinds
            .iter()
            .enumerate()
            .filter(|(_, k)| **k == FileKind::Gmm)
            .map(|(i, _)| i)
    }
}

struct Header {
    folders: Vec<NxarcFolder>,
    files: usize,
    table: usize,
    data: usize,
}

fn header(data: &[u8]) -> Result<Header> {
    signature(data, 0, SIGNATURE, "NXARC")?;
    let folder_count = read_u16(data, 0x04)? as usize;
    let files = read_u16(data, 0x06)? as usize;
    let table = read_len(data, 0x08)?;
    let data_offset = read_len(data, 0x0C)?;

    let counts = (0..folder_count)
        .map(|i| read_u16(data, FOLDERS + i * 4).map(usize::from))
        .collect::<Result<Vec<_>>>()?;
    let mut at = FOLDERS + folder_count * 4;
    let mut folders = Vec::with_capacity(folder_count);
    for count in counts {
        let len = terminated_len(data, at, data.len());
        let name = slice(data, at, len)?;
        if !name.is_ascii() {
            return Err(Error::Parse("NXARC folder name is not ASCII"));
        }
        folders.push(NxarcFolder {
            name: String::from_utf8_lossy(name).into_owned(),
            count,
        });
        at += len + 1;
    }

    if folders.iter().map(|f| f.count).sum::<usize>() != files {
        return Err(Error::Parse("NXARC folder counts do not add up to the file count"));
    }
    slice(data, table, files * 8)?;
    Ok(Header {
        folders,
        files,
        table,
        data: data_offset,
    })
}

/// Read the file table. Offsets are absolute.
pub fn entries(data: &[u8]) -> Result<Vec<ArchiveEntry>> {
    let h = header(data)?;
    (0..h.files)
        .map(|i| {
            let at = h.table + i * 8;
            Ok(ArchiveEntry {
                id: i as u32,
                offset: h.data + read_len(data, at)?,
                size: read_len(data, at + 4)?,
            })
        })
        .collect()
}

/// Split an archive into its children, classifying each one.
pub fn unpack(data: &[u8], config: &NxarcConfig) -> Result<(NxarcManifest, Vec<Vec<u8>>)> {
    let h = header(data)?;
    let entries = entries(data)?;

    let mut manifest = NxarcManifest {
        folders: h.folders,
        kinds: Vec::new(),
        header_len: h.data,
    };
    let mut kinds = Vec::with_capacity(entries.len());
    let mut children = Vec::with_capacity(entries.len());
    for ((folder, i), e) in manifest.positions().zip(&entries) {
        let child = slice(data, e.offset, e.size)?;
        let kind = match FileKind::sniff(child) {
            FileKind::Data if config.is_gmm(folder, i) => FileKind::Gmm,
            kind => kind,
        };
        tracing::trace!(folder, index = i, size = e.size, ?kind, "NXARC child");
        kinds.push(kind);
        children.push(child.to_vec());
    }
    manifest.kinds = kinds;

    tracing::debug!(
        folders = manifest.folders.len(),
        children = children.len(),
        "unpacked NXARC"
    );
    Ok((manifest, children))
}

/// Rebuild an archive from the original header and `children`.
///
/// `original` only needs to hold the header; its file table is rewritten.
pub fn pack<C: AsRef<[u8]>>(
    original: &[u8],
    manifest: &NxarcManifest,
    children: &[C],
) -> Result<Vec<u8>> {
    let h = header(original)?;
    if h.files != children.len() || manifest.kinds.len() != children.len() {
        return Err(Error::Parse("NXARC child count does not match the header"));
    }

    let mut out = slice(original, 0, manifest.header_len)?.to_vec();
    let mut offset = 0;
    for (i, child) in children.iter().enumerate() {
        let child = child.as_ref();
        let at = h.table + i * 8;
        write_u32(&mut out, at, to_u32("NXARC offset", offset)?)?;
        write_u32(&mut out, at + 4, to_u32("NXARC size", child.len())?)?;
        let start = out.len();
        out.extend_from_slice(child);
        pad_to(&mut out, ALIGN, PADDING);
        offset += out.len() - start;
    }

    tracing::debug!(children = children.len(), bytes = out.len(), "packed NXARC");
    Ok(out)
}

/// [`unpack`] into `dir`, one file per child at [`NxarcManifest::child_paths`].
pub fn unpack_to_dir(
    data: &[u8],
    config: &NxarcConfig,
    dir: impl AsRef<Path>,
) -> Result<NxarcManifest> {
    let dir = dir.as_ref();
    let (manifest, children) = unpack(data, config)?;
    for (rel, child) in manifest.child_paths().iter().zip(&children) {
        let path = dir.join(contained(rel)?);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::from(e).in_file(parent))?;
        }
        fs::write(&path, child).map_err(|e| Error::from(e).in_file(&path))?;
    }
    Ok(manifest)
}

/// Reject child paths that would leave the target directory.
fn contained(rel: &Path) -> Result<&Path> {
    if rel.components().all(|c| matches!(c, Component::Normal(_))) {
        Ok(rel)
    } else {
        Err(Error::Parse("NXARC folder name is not a relative path"))
    }
}

/// [`pack`] the files written by [`unpack_to_dir`].
pub fn pack_from_dir(
    original: &[u8],
    manifest: &NxarcManifest,
    dir: impl AsRef<Path>,
) -> Result<Vec<u8>> {
    let dir = dir.as_ref();
    let children = manifest
        .child_paths()
        .iter()
        .map(|rel| {
            let path = dir.join(contained(rel)?);
            fs::read(&path).map_err(|e| Error::from(e).in_file(&path))
        })
        .collect::<Result<Vec<_>>>()?;
    pack(original, manifest, &children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{push_u16, push_u32};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    /// Two folders: "A" with two files, "IN/STAGE/GLOBAL" with one.
    fn archive() -> Vec<u8> {
        let mut out = Vec::new();
        push_u32(&mut out, SIGNATURE);
        push_u16(&mut out, 2);
        push_u16(&mut out, 3);
        push_u32(&mut out, 0x40);
        push_u32(&mut out, 0x58);
        out.resize(0x20, 0);
        out.extend_from_slice(&[2, 0, 0, 0, 1, 0, 0, 0]);
        out.extend_from_slice(b"A\0IN/STAGE/GLOBAL\0");
        out.resize(0x40, 0);
        for (offset, size) in [(0u32, 4u32), (4, 3), (8, 5)] {
            push_u32(&mut out, offset);
            push_u32(&mut out, size);
        }
        out.resize(0x58, 0);
        out.extend_from_slice(b"RTFN");
        out.extend_from_slice(b"abc\xFF");
        out.extend_from_slice(b"hello\xFF\xFF\xFF");
        out
    }

    #[test]
    fn children_are_classified() {
        let (m, kids) = unpack(&archive(), &NxarcConfig::maplestory()).unwrap();
        assert_eq!(m.kinds, [FileKind::Nftr, FileKind::Data, FileKind::Gmm]);
        assert_eq!(kids[1], b"abc");
        assert_eq!(m.gmm_children().collect::<Vec<_>>(), [2]);
        assert_eq!(
            m.child_paths(),
            [
                PathBuf::from("A/0.NFTR"),
                PathBuf::from("A/1.dat"),
                PathBuf::from("IN/STAGE/GLOBAL/0.GMM.KOREAN"),
            ]
        );

        let (plain, _) = unpack(&archive(), &NxarcConfig::default()).unwrap();
        assert_eq!(plain.kinds[2], FileKind::Data);
    }

    #[test]
    fn unpack_then_pack_is_identity() {
        let data = archive();
        let (m, kids) = unpack(&data, &NxarcConfig::maplestory()).unwrap();
        assert_eq!(pack(&data, &m, &kids).unwrap(), data);
    }

    #[test]
    fn growing_a_child_moves_the_rest() {
        let data = archive();
        let (m, mut kids) = unpack(&data, &NxarcConfig::default()).unwrap();
        kids[1] = b"abcd".to_vec();
        let out = pack(&data, &m, &kids).unwrap();
        assert_eq!(read_len(&out, 0x48).unwrap(), 4);
        assert_eq!(read_len(&out, 0x4C).unwrap(), 4);
        assert_eq!(read_len(&out, 0x50).unwrap(), 8);
        assert_eq!(&out[0x60..0x65], b"hello");
    }

    #[test]
    fn entries_are_absolute() {
        let e = entries(&archive()).unwrap();
        assert_eq!(e[2].offset, 0x60);
        assert_eq!(e[2].size, 5);
    }

    #[rstest]
    #[case(b"../../../GLOBAL")]
    #[case(b"/IN/STAGE/GLOBA")]
    fn folder_names_cannot_escape_the_directory(#[case] name: &[u8; 15]) {
        let mut data = archive();
        data[0x2A..0x39].copy_from_slice(name);
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out");
        let err = unpack_to_dir(&data, &NxarcConfig::default(), &target).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert!(!dir.path().join("GLOBAL").exists());
    }

    #[test]
    fn directory_round_trip() {
        let data = archive();
        let dir = tempfile::tempdir().unwrap();
        let m = unpack_to_dir(&data, &NxarcConfig::maplestory(), dir.path()).unwrap();
        assert!(dir.path().join("IN/STAGE/GLOBAL/0.GMM.KOREAN").exists());
        assert_eq!(pack_from_dir(&data, &m, dir.path()).unwrap(), data);
    }
}
