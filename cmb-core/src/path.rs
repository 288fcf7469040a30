//! Fixed-width path field stored in every entry

use core::fmt;
use core::str;

use bytemuck::{Pod, Zeroable};

use crate::{Error, PATH_LEN};

/// Separator between path components inside an archive
pub const PATH_SEPARATOR: char = '\\';

/// Relative path from the archive root's parent, NUL padded to
/// [`PATH_LEN`] bytes. A path of exactly `PATH_LEN` bytes has no terminator.
#[derive(Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(transparent)]
pub struct PathField(pub [u8; PATH_LEN]);

impl PathField {
    /// Encode `path`, truncating it to at most `PATH_LEN` bytes. The cut never
    /// splits a character, so a truncated field still decodes. Returns the
    /// field and the number of bytes that did not fit.
    pub fn encode_lossy(path: &str) -> (PathField, usize) {
        let bytes = path.as_bytes();
        let mut len = bytes.len().min(PATH_LEN);
        while !path.is_char_boundary(len) {
            len -= 1;
        }

        let mut field = PathField::zeroed();
        field.0[..len].copy_from_slice(&bytes[..len]);
        (field, bytes.len() - len)
    }

    /// Encode `path`, failing instead of truncating
    pub fn encode(path: &str) -> Result<PathField, Error> {
        match PathField::encode_lossy(path) {
            (field, 0) => Ok(field),
            _ => Err(Error::PathTooLong(path.len())),
        }
    }

    /// Retrieve the path bytes with the trailing NUL padding removed
    pub fn as_bytes(&self) -> &[u8] {
        let end = self
            .0
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |i| i + 1);
        &self.0[..end]
    }

    pub fn decode(&self) -> Result<&str, Error> {
        let bytes = self.as_bytes();
        if bytes.contains(&0) {
            return Err(Error::InvalidPath);
        }
        Ok(str::from_utf8(bytes)?)
    }

    /// Iterate the backslash-separated components of the decoded path
    pub fn components(&self) -> Result<str::Split<'_, char>, Error> {
        Ok(self.decode()?.split(PATH_SEPARATOR))
    }
}

impl fmt::Debug for PathField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match str::from_utf8(self.as_bytes()) {
            Ok(path) => write!(f, "{:?}", path),
            Err(_) => write!(f, "{:02x?}", self.as_bytes()),
        }
    }
}
