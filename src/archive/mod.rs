//! Archives that hold text containers as children.
//!
//! | Module     | Format | Notes |
//! |------------|--------|-------|
//! | [`dpk`]    | DPK    | Summon Night X script pack, 16-byte aligned children |
//! | [`nxarc`]  | NXARC  | Nexon two-level folder archive, 4-byte aligned children |
//! | [`narc`]   | NARC   | Nitro archive, delegated to an external helper |
//!
//! Unpacking yields the children plus a manifest: the metadata that cannot
//! be recovered from the children alone but is needed to pack them again.

pub mod dpk;
pub mod narc;
pub mod nxarc;

use crate::utils::read_u32;

/// Location of one child inside an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArchiveEntry {
    pub id: u32,
    pub offset: usize,
    pub size: usize,
}

/// Content type of an archive child, picked from its first four bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FileKind {
    /// Zero-length child.
    Empty,
    Narc,
    Nanr,
    Ncer,
    Ncgr,
    Nclr,
    Nftr,
    Nscr,
    /// Message table; never sniffed, only assigned from a key list.
    Gmm,
    Data,
}

impl FileKind {
    pub const NARC: u32 = 0x4352414E;
    pub const NANR: u32 = 0x4E414E52;
    pub const NCER: u32 = 0x4E434552;
    pub const NCGR: u32 = 0x4E434752;
    pub const NCLR: u32 = 0x4E434C52;
    pub const NFTR: u32 = 0x4E465452;
    pub const NSCR: u32 = 0x4E534352;

    pub fn sniff(child: &[u8]) -> Self {
        if child.is_empty() {
            return FileKind::Empty;
        }
        let Ok(signature) = read_u32(child, 0) else {
            return FileKind::Data;
        };
        match signature {
            Self::NARC => FileKind::Narc,
            Self::NANR => FileKind::Nanr,
            Self::NCER => FileKind::Ncer,
            Self::NCGR => FileKind::Ncgr,
            Self::NCLR => FileKind::Nclr,
            Self::NFTR => FileKind::Nftr,
            Self::NSCR => FileKind::Nscr,
            _ => FileKind::Data,
        }
    }

    /// File name suffix used when the child is written to disk.
    pub fn extension(self) -> &'static str {
        match self {
            FileKind::Empty => "",
            FileKind::Narc => ".NARC",
            FileKind::Nanr => ".NANR",
            FileKind::Ncer => ".NCER",
            FileKind::Ncgr => ".NCGR",
            FileKind::Nclr => ".NCLR",
            FileKind::Nftr => ".NFTR",
            FileKind::Nscr => ".NSCR",
            FileKind::Gmm => ".GMM.KOREAN",
            FileKind::Data => ".dat",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(b"NARC", FileKind::Narc)]
    #[case(b"RNAN", FileKind::Nanr)]
    #[case(b"RECN", FileKind::Ncer)]
    #[case(b"RGCN", FileKind::Ncgr)]
    #[case(b"RLCN", FileKind::Nclr)]
    #[case(b"RTFN", FileKind::Nftr)]
    #[case(b"RCSN", FileKind::Nscr)]
    #[case(b"GMM!", FileKind::Data)]
    fn sniffs_nitro_signatures(#[case] magic: &[u8; 4], #[case] kind: FileKind) {
        assert_eq!(FileKind::sniff(magic), kind);
    }

    #[test]
    fn only_zero_length_children_are_empty() {
        assert_eq!(FileKind::sniff(&[]), FileKind::Empty);
        assert_eq!(FileKind::Empty.extension(), "");
        assert_eq!(FileKind::sniff(b"NAR"), FileKind::Data);
        assert_eq!(FileKind::sniff(b"NAR").extension(), ".dat");
    }
}
