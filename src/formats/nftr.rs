//! NFTR (Nitro font resource).
//!
//! Fonts have to be extended when a translation needs glyphs the game never
//! shipped. This codec reads the whole font into owned structures and writes
//! it back with every chunk size, offset and link recomputed.
//!
//! ## Layout
//! ```text
//! [0x00] Nitro header "RTFN"   (0x10 bytes, see [`super::nitro`])
//! [0x10] FINF                  (0x1C bytes)
//! [...]  CGLP                  glyph bitmaps
//! [...]  CWDH                  glyph widths
//! [...]  CMAP × n              character maps, linked list
//! ```
//! Every chunk starts with a signature and its total size, and is
//! zero-padded to 4 bytes. Chunk offsets stored in FINF and CMAP point 8
//! bytes into the target chunk.
//!
//! ## FINF (0x1C bytes)
//! ```text
//! [0x00] "FNIF"  [0x04] Size (0x1C)
//! [0x08] Font metrics            (8 bytes, kept)
//! [0x10] GlyphOffset  [0x14] WidthOffset  [0x18] MapOffset
//! ```
//!
//! ## CGLP
//! ```text
//! [0x00] "PLGC"  [0x04] Size
//! [0x08] CellWidth u8  [0x09] CellHeight u8  [0x0A] GlyphSize u16
//! [0x0C] Baseline u8   [0x0D] MaxWidth u8    [0x0E] Bpp u8  [0x0F] Flags u8
//! [0x10] GlyphCount × GlyphSize packed pixels, MSB first
//! ```
//!
//! ## CWDH
//! ```text
//! [0x00] "HDWC"  [0x04] Size
//! [0x08] FirstIndex u16  [0x0A] LastIndex u16  [0x0C] Next u32
//! [0x10] GlyphCount × (Left u8, Width u8, Advance u8)
//! ```
//!
//! ## CMAP
//! ```text
//! [0x00] "PAMC"  [0x04] Size
//! [0x08] FirstCode u16  [0x0A] LastCode u16  [0x0C] Type u16  [0x0E] Reserved u16
//! [0x10] NextMapOffset u32 (0 = last)
//! [0x14] Type 0: FirstIndex u16
//!        Type 1: (LastCode - FirstCode + 1) × Index u16 (0xFFFF = none)
//!        Type 2: Count u16, Count × (Code u16, Index u16)
//! ```

use crate::formats::nitro::NitroHeader;
use crate::utils::{
    pad_to, push_u16, push_u32, read_array, read_len, read_u8, read_u16, read_u32, round_up,
    signature, slice, to_u16, to_u32, write_u32,
};
use crate::{Error, Result};

/// `"RTFN"`
pub const SIGNATURE: u32 = 0x4E465452;
const FINF: u32 = 0x46494E46;
const CGLP: u32 = 0x43474C50;
const CWDH: u32 = 0x43574448;
const CMAP: u32 = 0x434D4150;

const FINF_SIZE: usize = 0x1C;
const CGLP_HEADER: usize = 0x10;
const CWDH_HEADER: usize = 0x10;
const CMAP_HEADER: usize = 0x14;
const LINK_BIAS: usize = 8;
const NO_GLYPH: u16 = 0xFFFF;

/// Glyph bitmap chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphSheet {
    pub cell_width: u8,
    pub cell_height: u8,
    /// Bytes per glyph.
    pub glyph_size: u16,
    pub baseline: u8,
    pub max_width: u8,
    pub bpp: u8,
    pub flags: u8,
    /// Packed glyphs, `glyph_size` bytes each.
    pub data: Vec<u8>,
}

/// Horizontal metrics of one glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphWidth {
    pub left: u8,
    pub width: u8,
    pub advance: u8,
}

/// How a character map stores its glyph indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapBody {
    /// Consecutive codes map to consecutive glyphs.
    Range { first_index: u16 },
    /// One index per code in the range.
    List(Vec<u16>),
    /// Sparse `(code, index)` pairs.
    Map(Vec<(u16, u16)>),
}

/// One CMAP chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterMap {
    pub first_code: u16,
    pub last_code: u16,
    pub reserved: u16,
    pub body: MapBody,
}

impl CharacterMap {
    fn kind(&self) -> u16 {
        match self.body {
            MapBody::Range { .. } => 0,
            MapBody::List(_) => 1,
            MapBody::Map(_) => 2,
        }
    }

    fn body_len(&self) -> usize {
        match &self.body {
            MapBody::Range { .. } => 2,
            MapBody::List(v) => v.len() * 2,
            MapBody::Map(v) => 2 + v.len() * 4,
        }
    }

    fn chunk_len(&self) -> usize {
        round_up(CMAP_HEADER + self.body_len(), 4)
    }

    /// Glyph index for `code`, if this map covers it.
    pub fn lookup(&self, code: u16) -> Option<u16> {
        match &self.body {
            MapBody::Range { first_index } => (self.first_code..=self.last_code)
                .contains(&code)
                .then(|| first_index.wrapping_add(code - self.first_code)),
            MapBody::List(indices) => code
                .checked_sub(self.first_code)
                .and_then(|i| indices.get(i as usize))
                .copied()
                .filter(|&i| i != NO_GLYPH),
            MapBody::Map(pairs) => pairs.iter().find(|(c, _)| *c == code).map(|(_, i)| *i),
        }
    }

    fn parse(data: &[u8], at: usize) -> Result<(Self, usize)> {
        signature(data, at, CMAP, "NFTR CMAP")?;
        let first_code = read_u16(data, at + 0x08)?;
        let last_code = read_u16(data, at + 0x0A)?;
        let kind = read_u16(data, at + 0x0C)?;
        let reserved = read_u16(data, at + 0x0E)?;
        let next = read_len(data, at + 0x10)?;
        let body_at = at + CMAP_HEADER;

        let body = match kind {
            0 => MapBody::Range {
                first_index: read_u16(data, body_at)?,
            },
            1 => {
                let n = (last_code as usize + 1).saturating_sub(first_code as usize);
                let indices = (0..n)
                    .map(|i| read_u16(data, body_at + i * 2))
                    .collect::<Result<_>>()?;
                MapBody::List(indices)
            }
            2 => {
                let n = read_u16(data, body_at)? as usize;
                let pairs = (0..n)
                    .map(|i| {
                        let p = body_at + 2 + i * 4;
                        Ok((read_u16(data, p)?, read_u16(data, p + 2)?))
                    })
                    .collect::<Result<_>>()?;
                MapBody::Map(pairs)
            }
            _ => return Err(Error::Parse("unknown character map type")),
        };

        Ok((
            Self {
                first_code,
                last_code,
                reserved,
                body,
            },
            next,
        ))
    }

    fn write(&self, out: &mut Vec<u8>, next: usize) -> Result<()> {
        push_u32(out, CMAP);
        push_u32(out, to_u32("CMAP size", self.chunk_len())?);
        push_u16(out, self.first_code);
        push_u16(out, self.last_code);
        push_u16(out, self.kind());
        push_u16(out, self.reserved);
        push_u32(out, to_u32("CMAP link", next)?);
        match &self.body {
            MapBody::Range { first_index } => push_u16(out, *first_index),
            MapBody::List(indices) => indices.iter().for_each(|&i| push_u16(out, i)),
            MapBody::Map(pairs) => {
                push_u16(out, to_u16("CMAP pair count", pairs.len())?);
                for &(code, index) in pairs {
                    push_u16(out, code);
                    push_u16(out, index);
                }
            }
        }
        pad_to(out, 4, 0);
        Ok(())
    }
}

/// A single glyph bitmap.
#[derive(Debug, Clone, Copy)]
pub struct Glyph<'a> {
    data: &'a [u8],
    width: u8,
    bpp: u8,
}

impl Glyph<'_> {
    /// Pixel intensity at `(x, y)`, `0..2^bpp`.
    ///
    /// Pixels may straddle a byte boundary at 3, 5, 6 or 7 bits per pixel.
    pub fn pixel(&self, x: u8, y: u8) -> u8 {
        let bpp = self.bpp as usize;
        if !(1..=8).contains(&bpp) {
            return 0;
        }
        let bit = (y as usize * self.width as usize + x as usize) * bpp;
        let Some(&hi) = self.data.get(bit / 8) else {
            return 0;
        };
        let lo = self.data.get(bit / 8 + 1).copied().unwrap_or(0);
        let word = u16::from_be_bytes([hi, lo]);
        let shift = 16 - bpp - bit % 8;
        ((word >> shift) & ((1 << bpp) - 1)) as u8
    }
}

/// A parsed NFTR font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NitroFont {
    pub header: NitroHeader,
    pub metrics: [u8; 8],
    pub glyphs: GlyphSheet,
    pub first_index: u16,
    pub width_link: u32,
    pub widths: Vec<GlyphWidth>,
    pub maps: Vec<CharacterMap>,
}

fn chunk_at(link: usize) -> Result<usize> {
    link.checked_sub(LINK_BIAS)
        .ok_or(Error::Parse("NFTR chunk link points before the file"))
}

impl NitroFont {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = NitroHeader::parse(data, SIGNATURE, "NFTR")?;

        let finf = NitroHeader::SIZE;
        signature(data, finf, FINF, "NFTR FINF")?;
        if read_len(data, finf + 4)? != FINF_SIZE {
            return Err(Error::Parse("unsupported FINF size"));
        }
        let metrics = read_array(data, finf + 0x08)?;
        let cglp = chunk_at(read_len(data, finf + 0x10)?)?;
        let cwdh = chunk_at(read_len(data, finf + 0x14)?)?;
        let mut link = read_len(data, finf + 0x18)?;

        signature(data, cwdh, CWDH, "NFTR CWDH")?;
        let first_index = read_u16(data, cwdh + 0x08)?;
        let last_index = read_u16(data, cwdh + 0x0A)?;
        let width_link = read_u32(data, cwdh + 0x0C)?;
        let count = (last_index as usize + 1).saturating_sub(first_index as usize);
        let widths = slice(data, cwdh + CWDH_HEADER, count * 3)?
            .chunks_exact(3)
            .map(|w| GlyphWidth {
                left: w[0],
                width: w[1],
                advance: w[2],
            })
            .collect();

        signature(data, cglp, CGLP, "NFTR CGLP")?;
        let glyph_size = read_u16(data, cglp + 0x0A)?;
        let bpp = read_u8(data, cglp + 0x0E)?;
        if !(1..=8).contains(&bpp) {
            return Err(Error::Parse("NFTR glyph depth must be 1 to 8 bits"));
        }
        let glyphs = GlyphSheet {
            cell_width: read_u8(data, cglp + 0x08)?,
            cell_height: read_u8(data, cglp + 0x09)?,
            glyph_size,
            baseline: read_u8(data, cglp + 0x0C)?,
            max_width: read_u8(data, cglp + 0x0D)?,
            bpp,
            flags: read_u8(data, cglp + 0x0F)?,
            data: slice(data, cglp + CGLP_HEADER, count * glyph_size as usize)?.to_vec(),
        };

        let mut maps = Vec::new();
        while link != 0 {
            if maps.len() >= header.section_count as usize {
                return Err(Error::Parse("character map chain does not end"));
            }
            let (map, next) = CharacterMap::parse(data, chunk_at(link)?)?;
            maps.push(map);
            link = next;
        }

        Ok(Self {
            header,
            metrics,
            glyphs,
            first_index,
            width_link,
            widths,
            maps,
        })
    }

    /// Glyph index of a character code, searching every map in order.
    pub fn glyph_index(&self, code: u16) -> Option<u16> {
        self.maps.iter().find_map(|m| m.lookup(code))
    }

    /// Bitmap of glyph `index`.
    pub fn glyph(&self, index: u16) -> Option<Glyph<'_>> {
        let size = self.glyphs.glyph_size as usize;
        let start = index as usize * size;
        let data = self.glyphs.data.get(start..start + size)?;
        Some(Glyph {
            data,
            width: self.glyphs.cell_width,
            bpp: self.glyphs.bpp,
        })
    }

    /// Serialize the font, recomputing every size and link.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let cglp = NitroHeader::SIZE + FINF_SIZE;
        let cglp_len = round_up(CGLP_HEADER + self.glyphs.data.len(), 4);
        let cwdh = cglp + cglp_len;
        let cwdh_len = round_up(CWDH_HEADER + self.widths.len() * 3, 4);
        let first_map = cwdh + cwdh_len;

        let mut out = Vec::with_capacity(first_map + self.maps.len() * 0x20);
        let header = NitroHeader {
            section_count: to_u16("NFTR section count", 3 + self.maps.len())?,
            ..self.header
        };
        header.write(&mut out);

        push_u32(&mut out, FINF);
        push_u32(&mut out, FINF_SIZE as u32);
        out.extend_from_slice(&self.metrics);
        push_u32(&mut out, to_u32("CGLP link", cglp + LINK_BIAS)?);
        push_u32(&mut out, to_u32("CWDH link", cwdh + LINK_BIAS)?);
        let map_link = if self.maps.is_empty() { 0 } else { first_map + LINK_BIAS };
        push_u32(&mut out, to_u32("CMAP link", map_link)?);

        let g = &self.glyphs;
        push_u32(&mut out, CGLP);
        push_u32(&mut out, to_u32("CGLP size", cglp_len)?);
        out.extend_from_slice(&[g.cell_width, g.cell_height]);
        push_u16(&mut out, g.glyph_size);
        out.extend_from_slice(&[g.baseline, g.max_width, g.bpp, g.flags]);
        out.extend_from_slice(&g.data);
        pad_to(&mut out, 4, 0);

        push_u32(&mut out, CWDH);
        push_u32(&mut out, to_u32("CWDH size", cwdh_len)?);
        push_u16(&mut out, self.first_index);
        let last = self.first_index as usize + self.widths.len();
        push_u16(&mut out, (last.wrapping_sub(1) & 0xFFFF) as u16);
        push_u32(&mut out, self.width_link);
        for w in &self.widths {
            out.extend_from_slice(&[w.left, w.width, w.advance]);
        }
        pad_to(&mut out, 4, 0);

        for (i, map) in self.maps.iter().enumerate() {
            let next = if i + 1 < self.maps.len() {
                out.len() + map.chunk_len() + LINK_BIAS
            } else {
                0
            };
            map.write(&mut out, next)?;
        }

        let size = to_u32("NFTR file size", out.len())?;
        write_u32(&mut out, 0x08, size)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn font() -> NitroFont {
        NitroFont {
            header: NitroHeader {
                signature: SIGNATURE,
                byte_order: 0x0100FEFF,
                file_size: 0,
                section_count: 0,
            },
            metrics: [0, 12, 0, 0, 1, 2, 3, 1],
            glyphs: GlyphSheet {
                cell_width: 4,
                cell_height: 2,
                glyph_size: 2,
                baseline: 1,
                max_width: 4,
                bpp: 2,
                flags: 0,
                // glyph 0: first row 3,2,1,0
                data: vec![0b11_10_01_00, 0, 0xFF, 0xFF, 0x55, 0xAA],
            },
            first_index: 0,
            width_link: 0,
            widths: vec![
                GlyphWidth {
                    left: 0,
                    width: 4,
                    advance: 5,
                };
                3
            ],
            maps: vec![
                CharacterMap {
                    first_code: 0x20,
                    last_code: 0x21,
                    reserved: 0,
                    body: MapBody::Range { first_index: 0 },
                },
                CharacterMap {
                    first_code: 0x8140,
                    last_code: 0x8142,
                    reserved: 0,
                    body: MapBody::List(vec![2, NO_GLYPH, 1]),
                },
                CharacterMap {
                    first_code: 0,
                    last_code: 0xFFFF,
                    reserved: 0,
                    body: MapBody::Map(vec![(0x3042, 2)]),
                },
            ],
        }
    }

    #[test]
    fn font_round_trips_with_recomputed_header() {
        let bytes = font().to_bytes().unwrap();
        let parsed = NitroFont::parse(&bytes).unwrap();
        assert_eq!(parsed.header.section_count, 6);
        assert_eq!(parsed.header.file_size as usize, bytes.len());
        assert_eq!(parsed.maps, font().maps);
        assert_eq!(parsed.widths, font().widths);
        assert_eq!(parsed.glyphs, font().glyphs);
        assert_eq!(parsed.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn every_chunk_is_word_aligned() {
        let bytes = font().to_bytes().unwrap();
        let mut at = NitroHeader::SIZE;
        let mut chunks = 0;
        while at < bytes.len() {
            let size = read_len(&bytes, at + 4).unwrap();
            assert_eq!(size % 4, 0, "chunk at {at:#X}");
            at += size;
            chunks += 1;
        }
        assert_eq!(at, bytes.len());
        assert_eq!(chunks, 6);
    }

    #[test]
    fn maps_resolve_codes() {
        let f = font();
        assert_eq!(f.glyph_index(0x21), Some(1));
        assert_eq!(f.glyph_index(0x8140), Some(2));
        assert_eq!(f.glyph_index(0x8141), None);
        assert_eq!(f.glyph_index(0x3042), Some(2));
        assert_eq!(f.glyph_index(0x7A), None);
    }

    #[test]
    fn pixels_are_msb_first() {
        let f = font();
        let g = f.glyph(0).unwrap();
        assert_eq!(
            (0..4).map(|x| g.pixel(x, 0)).collect::<Vec<_>>(),
            [3, 2, 1, 0]
        );
        assert_eq!(g.pixel(0, 1), 0);
        assert!(f.glyph(3).is_none());
    }

    #[test]
    fn pixels_may_straddle_bytes() {
        // 5, 3, 6, 1 at three bits each
        let g = Glyph {
            data: &[0b1010_1111, 0b0001_0000],
            width: 4,
            bpp: 3,
        };
        assert_eq!(
            (0..4).map(|x| g.pixel(x, 0)).collect::<Vec<_>>(),
            [5, 3, 6, 1]
        );
        assert_eq!(g.pixel(0, 1), 0);
    }

    #[test]
    fn unsupported_depth_is_rejected() {
        let mut f = font();
        f.glyphs.bpp = 3;
        assert!(NitroFont::parse(&f.to_bytes().unwrap()).is_ok());
        for bpp in [0, 9] {
            f.glyphs.bpp = bpp;
            let bytes = f.to_bytes().unwrap();
            assert!(matches!(NitroFont::parse(&bytes), Err(Error::Parse(_))));
        }
    }

    #[test]
    fn bad_signature_is_rejected() {
        let mut bytes = font().to_bytes().unwrap();
        bytes[0] = b'X';
        assert!(matches!(
            NitroFont::parse(&bytes),
            Err(Error::BadSignature { .. })
        ));
    }
}
