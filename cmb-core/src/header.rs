//! The packed structs represent the on-disk format of CMB archives

use bytemuck::{Pod, PodCastError, Zeroable};

use crate::{Entry, Error, ENTRY_SIZE, HEADER_SIZE};

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C, packed)]
pub struct Header {
    /// Little endian offset from the start of the archive to the data region
    pub data_offset: u32,
    /// Count of Entry structs, which start immediately after header struct
    pub count: u32,
}

/// Size of the header plus `count` entries, which is where the data region
/// of a well-formed archive starts
pub fn table_size(count: u32) -> Result<u32, Error> {
    let entries = count
        .checked_mul(ENTRY_SIZE as u32)
        .ok_or(Error::Overflow)?;
    entries
        .checked_add(HEADER_SIZE as u32)
        .ok_or(Error::Overflow)
}

impl Header {
    pub fn with_count(count: u32) -> Result<Header, Error> {
        Ok(Header {
            data_offset: table_size(count)?.to_le(),
            count: count.to_le(),
        })
    }

    /// Parse header from raw header data without verification
    pub fn new_unchecked(data: &[u8]) -> Result<&Header, Error> {
        let data = data
            .get(..HEADER_SIZE)
            .ok_or(Error::Cast(PodCastError::SizeMismatch))?;
        Ok(bytemuck::try_from_bytes(data)?)
    }

    /// Ensure that an archive of `len` bytes holds the declared entry table,
    /// and that the data region does not start inside it
    pub fn check(&self, len: u64) -> Result<(), Error> {
        let table_end = self.total_size()?;
        if u64::from(table_end) > len {
            return Err(Error::TooShort {
                expected: table_end.into(),
                len,
            });
        }
        if self.data_offset() < table_end {
            return Err(Error::InvalidDataOffset {
                data_offset: self.data_offset(),
                table_end,
            });
        }
        Ok(())
    }

    pub fn count(&self) -> u32 {
        u32::from_le(self.count)
    }

    pub fn data_offset(&self) -> u32 {
        u32::from_le(self.data_offset)
    }

    /// Retrieve the size of the entries
    pub fn entries_size(&self) -> Result<u32, Error> {
        self.count()
            .checked_mul(ENTRY_SIZE as u32)
            .ok_or(Error::Overflow)
    }

    /// Retrieve the size of the Header and its entries
    pub fn total_size(&self) -> Result<u32, Error> {
        table_size(self.count())
    }

    /// Absolute position in the archive of an entry's data
    pub fn entry_position(&self, entry: &Entry) -> u64 {
        u64::from(self.data_offset()) + u64::from(entry.offset())
    }

    /// Parse entries from raw entries data
    pub fn entries<'a>(&self, data: &'a [u8]) -> Result<&'a [Entry], Error> {
        let entries_size = self.entries_size()? as usize;

        let entries_data = data
            .get(..entries_size)
            .ok_or(Error::Cast(PodCastError::SizeMismatch))?;

        Ok(bytemuck::try_cast_slice(entries_data)?)
    }
}
