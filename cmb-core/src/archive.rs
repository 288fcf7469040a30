use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use core::convert::TryFrom;

use crate::{Entry, Error, Header, HEADER_SIZE};

/// A file recovered from an archive
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    /// Backslash-separated path as stored in the archive
    pub path: String,
    pub data: Vec<u8>,
}

/// Random access to the bytes of an archive
pub trait ArchiveSrc {
    type Err: From<Error>;

    /// Total length of the archive in bytes
    fn size(&mut self) -> Result<u64, Self::Err>;

    /// Fill `buf` with the bytes starting at `offset`. Callers only request
    /// ranges inside `size`.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), Self::Err>;

    fn read_header(&mut self) -> Result<Header, Self::Err> {
        let len = self.size()?;
        if len < HEADER_SIZE as u64 {
            return Err(Error::TooShort {
                expected: HEADER_SIZE as u64,
                len,
            }
            .into());
        }

        let mut header_data = [0; HEADER_SIZE];
        self.read_at(0, &mut header_data)?;
        let header = *Header::new_unchecked(&header_data)?;
        header.check(len)?;
        Ok(header)
    }

    /// Read the entry table described by `header`
    fn read_entries(&mut self, header: &Header) -> Result<Vec<Entry>, Self::Err> {
        let entries_size = header.entries_size()? as usize;
        let mut entries_data = vec![0; entries_size];
        self.read_at(HEADER_SIZE as u64, &mut entries_data)?;
        let entries = header.entries(&entries_data)?;
        Ok(entries.to_vec())
    }

    /// Read the data of `entry`, the `index`th entry of the archive described
    /// by `header`
    fn read_entry(&mut self, header: &Header, index: u32, entry: &Entry) -> Result<Vec<u8>, Self::Err> {
        let len = self.size()?;
        let start = header.entry_position(entry);
        let end = start + u64::from(entry.size());
        if end > len {
            return Err(Error::EntryOutOfBounds { index, end, len }.into());
        }

        let mut data = vec![0; entry.size() as usize];
        self.read_at(start, &mut data)?;
        Ok(data)
    }

    /// Decode every entry and read its data, in table order
    fn read_records(&mut self) -> Result<Vec<Record>, Self::Err> {
        let header = self.read_header()?;
        let entries = self.read_entries(&header)?;

        let mut records = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let index = u32::try_from(index).map_err(Error::TryFromInt)?;
            let path = entry.path()?.to_string();
            let data = self.read_entry(&header, index, entry)?;
            records.push(Record { path, data });
        }
        Ok(records)
    }
}

impl<T: AsRef<[u8]>> ArchiveSrc for T {
    type Err = Error;

    fn size(&mut self) -> Result<u64, Error> {
        Ok(self.as_ref().len() as u64)
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), Error> {
        let start = usize::try_from(offset)?;
        let end = start.checked_add(buf.len()).ok_or(Error::Overflow)?;
        let data = self.as_ref();
        let src = data.get(start..end).ok_or(Error::TooShort {
            expected: end as u64,
            len: data.len() as u64,
        })?;
        buf.copy_from_slice(src);
        Ok(())
    }
}

/// Split an in-memory archive into its files
pub fn unpack(archive: &[u8]) -> Result<Vec<Record>, Error> {
    let mut src = archive;
    src.read_records()
}
