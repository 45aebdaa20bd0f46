//! Library-wide error and result types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout ndstrans.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, an unknown code or tag, or a size limit breach.
    Format,
    /// An offset or length reached outside its buffer.
    OutOfRange,
    /// The filesystem or an external process failed.
    Io,
}

/// All errors the library can produce.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A signature field did not match the expected value.
    #[error("{format}: bad signature {found:#010X} (expected {expected:#010X})")]
    BadSignature {
        format: &'static str,
        expected: u32,
        found: u32,
    },

    /// A fixed-width access would read or write past the end of the buffer.
    #[error("{width}-byte access at {offset:#X} is outside a {len}-byte buffer")]
    OutOfRange {
        offset: usize,
        width: usize,
        len: usize,
    },

    /// A control code with no known meaning was found while decoding.
    #[error("unrecognized control code {code:04X} in line: {decoded}")]
    UnknownControlCode { code: u16, decoded: String },

    /// A byte sequence is not a valid character in the game's code page.
    #[error("invalid character bytes {bytes} in line: {decoded}")]
    InvalidCharacter { bytes: String, decoded: String },

    /// A bracketed tag does not name any known code.
    #[error("unrecognized control code <{0}>")]
    UnknownTag(String),

    /// A `<` opened a tag that never closes.
    #[error("unterminated tag in: {0}")]
    UnterminatedTag(String),

    /// A character has no representation in the game's encoding.
    #[error("character {0:?} cannot be encoded")]
    Unencodable(char),

    /// An encoded string does not fit its fixed-size slot.
    #[error("string length {length} exceeds maximum of {max}: \"{text}\"")]
    StringTooLong {
        length: usize,
        max: usize,
        text: String,
    },

    /// A recomputed size or offset does not fit its on-disk field.
    #[error("{field} value {value} does not fit its field")]
    FieldOverflow { field: &'static str, value: usize },

    /// A replacement string table does not have the loaded table's shape.
    #[error("string table shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// A section separator was found where a string line was expected.
    #[error("invalid line break detected in section [{section}] at line {line}")]
    LineBreak { section: usize, line: usize },

    /// A text file ended before every string was read back.
    #[error("text file ended at line {line} before all strings were read")]
    UnexpectedEndOfScript { line: usize },

    /// A structural constraint was violated (message describes which one).
    #[error("parse error: {0}")]
    Parse(&'static str),

    /// The external child-archive helper failed or timed out.
    #[error("archive helper failed: {0}")]
    ArchiveService(String),

    /// An underlying I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Another error, tagged with the file it happened in.
    #[error("{}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Which of the three failure families this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::OutOfRange { .. } => ErrorKind::OutOfRange,
            Error::Io(_) | Error::ArchiveService(_) => ErrorKind::Io,
            Error::File { source, .. } => source.kind(),
            _ => ErrorKind::Format,
        }
    }

    /// Attach the name of the file being processed.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Error::File { .. } => self,
            other => Error::File {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }
}
