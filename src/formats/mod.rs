//! Text container codecs for Nintendo DS game files.
//!
//! Every supported file is described by a [`FormatConfig`]: an optional
//! signature, the game's [`TextVariant`], the encoding of exported text
//! files and a structural [`Layout`]. [`Container::load`] decodes a file
//! into [`StringTable`]s plus the bytes it must keep; [`Container::save`]
//! rebuilds a complete file from the (edited) tables.
//!
//! All codecs follow the same conventions:
//!
//! * **Whole-buffer** - `load` borrows the complete file, `save` returns a
//!   new buffer. Nothing is written until the buffer is complete.
//! * **Shape-locked** - strings can be rewritten but never added or
//!   removed, so pointer tables are recomputed from the table order alone.
//! * **Minimal retention** - only the byte ranges a layout cannot rebuild
//!   (header prefixes, fixed records, foreign blocks) survive a load.
//!
//! ## Layout overview
//!
//! | Module       | Layout            | Presets |
//! |--------------|-------------------|---------|
//! | [`pointer`]  | Flat pointer table | [`presets::DCPB`], [`presets::DMSB`], [`presets::DTX`] |
//! | [`prefixed`] | Length-prefixed string groups | [`presets::NIDX`], [`presets::DNGC`] |
//! | [`section`]  | Nested section tables | [`presets::DMST`] |
//! | [`record`]   | Record-patched sections | [`presets::PARM`] |
//! | [`slots`]    | Fixed inline slots | [`presets::MUSIC_BOX`] |
//! | [`message`]  | GMM message table | [`presets::GMM`] |
//! | [`langdb`]   | Language database blocks | [`presets::LANGUAGE_DB`] |
//! | [`nftr`]     | NFTR font (not a text container) | - |

pub mod langdb;
pub mod message;
pub mod nftr;
pub mod nitro;
pub mod pointer;
pub mod prefixed;
pub mod presets;
pub mod record;
pub mod section;
pub mod slots;
pub mod table;

pub use table::StringTable;

use std::fs;
use std::path::Path;

use crate::script::{self, TextEncoding};
use crate::text::TextVariant;
use crate::utils::signature;
use crate::{Error, Result};

/// Structural layout of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Pointers(pointer::PointerLayout),
    Prefixed(prefixed::PrefixedLayout),
    Sections(section::SectionLayout),
    Records(record::RecordLayout),
    Slots(slots::SlotLayout),
    Messages(message::MessageLayout),
    Blocks(langdb::BlockLayout),
}

/// Everything needed to load and save one game file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatConfig {
    pub name: &'static str,
    /// Little-endian `u32` expected at offset 0.
    pub signature: Option<u32>,
    pub text: TextVariant,
    /// Encoding of exported text files.
    pub export: TextEncoding,
    pub layout: Layout,
}

/// Bytes a loaded container keeps for `save`.
#[derive(Debug, Clone)]
enum Retained {
    /// Everything before the rebuilt part of the file.
    Header(Vec<u8>),
    /// The whole file, patched in place.
    Image(Vec<u8>),
    Records(record::Records),
    Blocks(langdb::Blocks),
}

/// A loaded text container.
#[derive(Debug, Clone)]
pub struct Container {
    config: FormatConfig,
    tables: Vec<StringTable>,
    /// Kind and section lengths of each table as loaded.
    shapes: Vec<(bool, Vec<usize>)>,
    retained: Retained,
}

impl Container {
    /// Decode `data` according to `config`.
    pub fn load(config: FormatConfig, data: &[u8]) -> Result<Self> {
        if let Some(expected) = config.signature {
            signature(data, 0, expected, config.name)?;
        }
        let text = config.text.transcoder();

        let (tables, retained) = match config.layout {
            Layout::Pointers(l) => one(l.load(data, text)?, Retained::Header),
            Layout::Prefixed(l) => one(l.load(data, text)?, Retained::Header),
            Layout::Sections(l) => one(l.load(data, text)?, Retained::Header),
            Layout::Messages(l) => one(l.load(data, text)?, Retained::Header),
            Layout::Slots(l) => one(l.load(data, text)?, Retained::Image),
            Layout::Blocks(l) => one(l.load(data, text)?, Retained::Blocks),
            Layout::Records(l) => {
                let (tables, records) = l.load(data, text)?;
                (tables, Retained::Records(records))
            }
        };

        tracing::debug!(
            format = config.name,
            tables = tables.len(),
            strings = tables.iter().map(StringTable::len).sum::<usize>(),
            bytes = data.len(),
            "loaded container"
        );
        let shapes = tables
            .iter()
            .map(|t| (t.is_sectioned(), t.shape()))
            .collect();
        Ok(Self {
            config,
            tables,
            shapes,
            retained,
        })
    }

    /// Re-encode the container with its current strings.
    ///
    /// Fails with [`Error::ShapeMismatch`] if a table was replaced by one
    /// with a different shape through [`Container::tables_mut`].
    pub fn save(&self) -> Result<Vec<u8>> {
        for (table, (sectioned, shape)) in self.tables.iter().zip(&self.shapes) {
            table.check_shape(*sectioned, shape)?;
        }
        let text = self.config.text.transcoder();
        let first = || {
            self.tables
                .first()
                .ok_or(Error::Parse("container has no string table"))
        };

        let out = match (&self.config.layout, &self.retained) {
            (Layout::Pointers(l), Retained::Header(h)) => l.save(h, first()?, text)?,
            (Layout::Prefixed(l), Retained::Header(h)) => l.save(h, first()?, text)?,
            (Layout::Sections(l), Retained::Header(h)) => l.save(h, first()?, text)?,
            (Layout::Messages(l), Retained::Header(h)) => l.save(h, first()?, text)?,
            (Layout::Slots(l), Retained::Image(image)) => l.save(image, first()?, text)?,
            (Layout::Blocks(l), Retained::Blocks(b)) => l.save(b, first()?, text)?,
            (Layout::Records(l), Retained::Records(r)) => l.save(r, &self.tables, text)?,
            _ => return Err(Error::Parse("retained data does not match the layout")),
        };

        tracing::debug!(format = self.config.name, bytes = out.len(), "saved container");
        Ok(out)
    }

    /// Read and decode a file.
    pub fn read_file(config: FormatConfig, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| Error::from(e).in_file(path))?;
        Self::load(config, &data).map_err(|e| e.in_file(path))
    }

    /// Encode and write the container, creating parent directories.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let out = self.save().map_err(|e| e.in_file(path))?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| Error::from(e).in_file(path))?;
        }
        fs::write(path, out).map_err(|e| Error::from(e).in_file(path))
    }

    pub fn config(&self) -> &FormatConfig {
        &self.config
    }

    /// The decoded tables. Most layouts have exactly one.
    pub fn tables(&self) -> &[StringTable] {
        &self.tables
    }

    /// Mutable access for editing; the slice cannot grow or shrink, and
    /// [`Container::save`] rejects tables whose shape changed.
    pub fn tables_mut(&mut self) -> &mut [StringTable] {
        &mut self.tables
    }

    /// Render table `index` as a text file in the format's export encoding.
    pub fn export(&self, index: usize) -> Result<Vec<u8>> {
        let table = self
            .tables
            .get(index)
            .ok_or(Error::Parse("no string table at that index"))?;
        script::export(table, self.config.export)
    }

    /// Replace the strings of table `index` with an edited text file.
    pub fn import(&mut self, index: usize, file: &[u8]) -> Result<()> {
        let encoding = self.config.export;
        let table = self
            .tables
            .get_mut(index)
            .ok_or(Error::Parse("no string table at that index"))?;
        let edited = script::import(file, table, encoding)?;
        table.replace_with(edited)
    }
}

fn one<R>(
    (table, retained): (StringTable, R),
    wrap: fn(R) -> Retained,
) -> (Vec<StringTable>, Retained) {
    (vec![table], wrap(retained))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn signature_is_checked_before_parsing() {
        let err = Container::load(presets::NIDX, b"XXXX\0\0\0\0").unwrap_err();
        assert!(matches!(err, Error::BadSignature { format: "NIDX", .. }));
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn unsigned_container_round_trips_through_text() {
        #[rustfmt::skip]
        let data = [
            2, 0, 0, 0,
            16, 0, 0, 0, 2, 0, 0, 0,
            18, 0, 0, 0, 1, 0, 0, 0,
            b'h', b'i', b'!',
        ];
        let mut c = Container::load(presets::DMSB, &data).unwrap();
        assert_eq!(c.tables()[0].strings().collect::<Vec<_>>(), ["hi", "!"]);
        assert_eq!(c.save().unwrap(), data);

        let exported = c.export(0).unwrap();
        let edited = String::from_utf8(exported).unwrap().replace("hi", "hey");
        c.import(0, edited.as_bytes()).unwrap();
        assert_eq!(c.tables()[0].get(0, 0), Some("hey"));
        let out = c.save().unwrap();
        assert_eq!(read(&out, 8), 3);
        assert_eq!(read(&out, 12), 19);
        assert_eq!(&out[20..], b"hey!");
    }

    #[test]
    fn replaced_table_must_keep_its_shape() {
        #[rustfmt::skip]
        let data = [
            1, 0, 0, 0,
            8, 0, 0, 0, 2, 0, 0, 0,
            b'h', b'i',
        ];
        let mut c = Container::load(presets::DMSB, &data).unwrap();
        c.tables_mut()[0] = StringTable::flat(vec!["a".into(), "b".into()]);
        match c.save().unwrap_err() {
            Error::ShapeMismatch { expected, found } => {
                assert_eq!(expected, [1]);
                assert_eq!(found, [2]);
            }
            other => panic!("unexpected error: {other}"),
        }

        c.tables_mut()[0] = StringTable::sectioned(vec![vec!["a".into()]]);
        assert!(matches!(c.save(), Err(Error::ShapeMismatch { .. })));

        c.tables_mut()[0] = StringTable::flat(vec!["hey".into()]);
        let out = c.save().unwrap();
        assert_eq!(&out[12..], b"hey");
    }

    fn read(data: &[u8], at: usize) -> u32 {
        crate::utils::read_u32(data, at).unwrap()
    }

    #[test]
    fn missing_table_index_is_an_error() {
        let c = Container::load(presets::DMSB, &[0, 0, 0, 0]).unwrap();
        assert!(c.tables()[0].is_empty());
        assert!(c.export(1).is_err());
    }

    #[test]
    fn write_file_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.bin");
        let c = Container::load(presets::DMSB, &[0, 0, 0, 0]).unwrap();
        c.write_file(&path).unwrap();
        let back = Container::read_file(presets::DMSB, &path).unwrap();
        assert_eq!(back.save().unwrap(), [0, 0, 0, 0]);
    }

    #[test]
    fn read_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = Container::read_file(presets::DMSB, dir.path().join("missing")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("missing"));
    }
}
