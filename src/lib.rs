//! **ndstrans** - text container and archive codecs for Nintendo DS
//! translation patches.
//!
//! Game files are decoded into escaped, line-safe Unicode strings, exported
//! to editable text files, re-imported, and encoded back into byte-exact
//! game binaries.
//!
//! # Modules
//! | Module | Purpose |
//! |--------|---------|
//! | [`utils`]   | Offset-addressed little-endian integers, alignment, hex |
//! | [`text`]    | Per-game transcoders between game bytes and escaped text |
//! | [`formats`] | Container codecs, presets and the NFTR font codec |
//! | [`script`]  | Text file export and import |
//! | [`archive`] | DPK and NXARC archives, NARC through an external helper |
//!
//! # Example
//! ```no_run
//! use ndstrans::formats::{Container, presets};
//!
//! # fn main() -> ndstrans::Result<()> {
//! let mut c = Container::read_file(presets::NIDX, "item.nidx")?;
//! let text = c.export(0)?;
//! // ... translate ...
//! c.import(0, &text)?;
//! c.write_file("out/item.nidx")?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod error;
pub mod formats;
pub mod script;
pub mod text;
pub mod utils;

pub use error::{Error, ErrorKind, Result};
