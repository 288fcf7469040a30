use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use bytemuck::Zeroable;
use cmb_core::{ArchiveSrc, Header};

use crate::{wrap_io_err, Error};

/// A `.cmb` file on disk
#[derive(Debug)]
pub struct ArchiveFile {
    path: PathBuf,
    src: BufReader<File>,
    len: u64,
    header: Header,
}

impl ArchiveFile {
    pub fn new(path: impl AsRef<Path>) -> Result<ArchiveFile, Error> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .open(&path)
            .map_err(wrap_io_err!(path, "Open archive"))?;
        let metadata = file
            .metadata()
            .map_err(wrap_io_err!(path, "Stat archive"))?;
        if !metadata.is_file() {
            return Err(Error::NotAFile(path));
        }

        let mut new = ArchiveFile {
            path,
            src: BufReader::new(file),
            len: metadata.len(),

            // Need a blank header to construct the ArchiveFile, since reading
            //   the real one goes through ArchiveSrc
            header: Header::zeroed(),
        };

        new.header = new.read_header()?;
        Ok(new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> Header {
        self.header
    }
}

impl ArchiveSrc for ArchiveFile {
    type Err = Error;

    fn size(&mut self) -> Result<u64, Error> {
        Ok(self.len)
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), Error> {
        self.src
            .seek(SeekFrom::Start(offset))
            .map_err(wrap_io_err!(self.path, "Seek archive"))?;
        self.src
            .read_exact(buf)
            .map_err(wrap_io_err!(self.path, "Read archive"))
    }
}
