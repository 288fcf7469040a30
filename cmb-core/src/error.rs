use alloc::format;
use alloc::string::ToString;
use core::error;
use core::fmt::{Display, Formatter, Result};

use bytemuck::PodCastError;

#[derive(Debug)]
pub enum Error {
    Cast(PodCastError),
    /// `data_offset` points inside the header or entry table
    InvalidDataOffset {
        data_offset: u32,
        table_end: u32,
    },
    /// Entry data extends past the end of the archive
    EntryOutOfBounds {
        index: u32,
        end: u64,
        len: u64,
    },
    /// Path field contains a NUL before its padding
    InvalidPath,
    PathTooLong(usize),
    Overflow,
    /// Archive is shorter than the header or entry table it declares
    TooShort {
        expected: u64,
        len: u64,
    },
    TryFromInt(core::num::TryFromIntError),
    Utf8(core::str::Utf8Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> Result {
        use Error::*;

        let msg = match self {
            Cast(err) => format!("Cast: {:?}", err),
            InvalidDataOffset {
                data_offset,
                table_end,
            } => format!(
                "Invalid data offset: {} is inside the entry table (ends at {})",
                data_offset, table_end
            ),
            EntryOutOfBounds { index, end, len } => format!(
                "Entry {} out of bounds: data ends at {}, archive is {} bytes",
                index, end, len
            ),
            InvalidPath => "Path field contains an embedded NUL".to_string(),
            PathTooLong(len) => format!("Path too long: {} bytes", len),
            Overflow => "Overflow".to_string(),
            TooShort { expected, len } => format!(
                "Archive too short: expected at least {} bytes, got {}",
                expected, len
            ),
            TryFromInt(err) => format!("TryFromInt: {}", err),
            Utf8(err) => format!("Path is not valid UTF-8: {}", err),
        };
        write!(f, "{}", msg)
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::TryFromInt(e) => Some(e),
            Self::Utf8(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PodCastError> for Error {
    fn from(err: PodCastError) -> Error {
        Error::Cast(err)
    }
}

impl From<core::num::TryFromIntError> for Error {
    fn from(err: core::num::TryFromIntError) -> Error {
        Error::TryFromInt(err)
    }
}

impl From<core::str::Utf8Error> for Error {
    fn from(err: core::str::Utf8Error) -> Error {
        Error::Utf8(err)
    }
}
