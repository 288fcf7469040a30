use alloc::vec::Vec;
use core::convert::TryFrom;

use crate::{Entry, Error, Header, PathField};

/// Header and entry table of an archive, computed from file sizes alone.
///
/// Entries are laid out back to back in the order they are given, the first
/// one at offset 0 of the data region. Nothing is read or written; the data
/// region is whatever the caller writes after [`Layout::head_bytes`].
#[derive(Clone, Debug)]
pub struct Layout {
    header: Header,
    entries: Vec<Entry>,
    data_size: u32,
}

impl Layout {
    pub fn new<I>(files: I) -> Result<Layout, Error>
    where
        I: IntoIterator<Item = (PathField, u64)>,
    {
        let mut entries = Vec::new();
        let mut data_size: u32 = 0;
        for (path, size) in files {
            let size = u32::try_from(size)?;
            entries.push(Entry::new(path, data_size, size));
            data_size = data_size.checked_add(size).ok_or(Error::Overflow)?;
        }

        let header = Header::with_count(u32::try_from(entries.len())?)?;
        // Every offset in the archive must fit in 32 bits
        header
            .data_offset()
            .checked_add(data_size)
            .ok_or(Error::Overflow)?;

        Ok(Layout {
            header,
            entries,
            data_size,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn data_size(&self) -> u32 {
        self.data_size
    }

    /// Total archive length
    pub fn archive_size(&self) -> u64 {
        u64::from(self.header.data_offset()) + u64::from(self.data_size)
    }

    /// Serialize the header followed by the entry table
    pub fn head_bytes(&self) -> Vec<u8> {
        let mut head = Vec::with_capacity(self.header.data_offset() as usize);
        head.extend_from_slice(bytemuck::bytes_of(&self.header));
        head.extend_from_slice(bytemuck::cast_slice(&self.entries));
        head
    }
}
