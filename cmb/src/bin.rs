use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use cmb_core::ArchiveSrc;
use log::info;

use crate::builder::{root_name, ArchiveBuilder};
use crate::{wrap_io_err, ArchiveFile, Error, Transaction};

/// Extension of archives written by [`create`]
pub const ARCHIVE_EXTENSION: &str = "cmb";

/// Pack `folder` into `<folder name>.cmb` inside `output_dir`, returning the
/// path of the new archive
pub fn create(folder: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> Result<PathBuf, Error> {
    let folder = folder.as_ref();
    let output_dir = output_dir.as_ref();
    if !folder.is_dir() {
        return Err(Error::NotADirectory(folder.to_path_buf()));
    }
    if !output_dir.is_dir() {
        return Err(Error::NotADirectory(output_dir.to_path_buf()));
    }

    let canonical = fs::canonicalize(folder).map_err(wrap_io_err!(folder, "Resolve directory"))?;
    let canonical_output =
        fs::canonicalize(output_dir).map_err(wrap_io_err!(output_dir, "Resolve directory"))?;
    let archive_name = format!("{}.{}", root_name(&canonical)?, ARCHIVE_EXTENSION);
    let tmp_name = format!(".{}.tmp", archive_name);
    let archive_path = output_dir.join(&archive_name);
    let tmp_path = output_dir.join(&tmp_name);

    // The output directory may lie inside the packed folder
    let mut builder = ArchiveBuilder::new();
    builder
        .exclude(canonical_output.join(&archive_name))
        .exclude(canonical_output.join(&tmp_name))
        .dir(folder)?;

    let count = builder.len();
    let truncated = builder.truncations().len();

    // Replace a previous archive only once the new one is complete
    let tmp_file = File::create(&tmp_path).map_err(wrap_io_err!(tmp_path, "Create archive"))?;
    let mut writer = BufWriter::new(tmp_file);
    let written = builder.write_archive(&mut writer).and_then(|size| {
        writer
            .flush()
            .map_err(wrap_io_err!(tmp_path, "Flush archive"))?;
        Ok(size)
    });
    drop(writer);

    let installed = written.and_then(|size| {
        fs::rename(&tmp_path, &archive_path).map_err(wrap_io_err!(archive_path, "Rename archive"))?;
        Ok(size)
    });
    let size = match installed {
        Ok(size) => size,
        Err(err) => {
            let _ = fs::remove_file(&tmp_path);
            return Err(err);
        }
    };

    info!(
        "Created {} ({} files, {} bytes)",
        archive_path.display(),
        count,
        size
    );
    if truncated > 0 {
        info!("{} paths were truncated to fit the path field", truncated);
    }
    Ok(archive_path)
}

/// Unpack every file of `archive_path` below `base_dir`. Either all files are
/// moved into place or, if staging fails, none are.
pub fn extract(archive_path: impl AsRef<Path>, base_dir: impl AsRef<Path>) -> Result<usize, Error> {
    let archive_path = archive_path.as_ref();
    let mut archive = ArchiveFile::new(archive_path)?;

    let mut transaction = Transaction::install(&mut archive, base_dir.as_ref())?;
    let count = match transaction.commit() {
        Ok(count) => count,
        Err(err) => {
            // Leave no temp files behind for the entries that were not moved
            let _ = transaction.abort();
            return Err(err);
        }
    };

    info!(
        "Extracted {} files from {} to {}",
        count,
        archive.path().display(),
        base_dir.as_ref().display()
    );
    Ok(count)
}

/// Print the path, data offset and size of every entry
pub fn list(archive_path: impl AsRef<Path>) -> Result<(), Error> {
    let mut archive = ArchiveFile::new(archive_path)?;
    let header = archive.header();
    for entry in archive.read_entries(&header)? {
        println!("{}\t{}\t{}", entry.path()?, entry.offset(), entry.size());
    }

    Ok(())
}
