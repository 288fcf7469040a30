//! The packed structs represent the on-disk format of CMB archives
use core::fmt::Display;

use bytemuck::{Pod, Zeroable};

use crate::{Error, PathField};

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C, packed)]
pub struct Entry {
    /// Relative path, backslash separated, beginning with the root directory name
    pub path: PathField,
    /// Little endian offset of file data from the start of the data region
    pub offset: u32,
    /// Little endian size in bytes of the file data
    pub size: u32,
}

impl Display for Entry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let path = self.path;
        write!(
            f,
            "path={:?} offset={} size={}",
            path,
            self.offset(),
            self.size()
        )
    }
}

impl Entry {
    pub fn new(path: PathField, offset: u32, size: u32) -> Entry {
        Entry {
            path,
            offset: offset.to_le(),
            size: size.to_le(),
        }
    }

    pub fn offset(&self) -> u32 {
        u32::from_le(self.offset)
    }

    pub fn size(&self) -> u32 {
        u32::from_le(self.size)
    }

    /// Offset one past the last data byte, relative to the data region
    pub fn end(&self) -> Result<u32, Error> {
        self.offset()
            .checked_add(self.size())
            .ok_or(Error::Overflow)
    }

    pub fn path_field(&self) -> PathField {
        self.path
    }

    /// Retrieve the decoded relative path
    pub fn path(&self) -> Result<&str, Error> {
        // The struct is packed, but PathField has an alignment of 1
        let field: &PathField = &self.path;
        field.decode()
    }
}
