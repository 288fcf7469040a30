use std::fmt;
use std::fs::{self, DirEntry, File};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

use cmb_core::{Layout, PathField, PATH_SEPARATOR};
use log::{debug, warn};

use crate::{wrap_io_err, Error};

/// Name used for the archive root when the packed directory has none (`/`)
pub const UNKNOWN_ROOT: &str = "unk";

/// A path that did not fit in the fixed path field and was cut short
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathTruncation {
    /// Path as it should have been stored
    pub target: String,
    /// Number of trailing bytes that were dropped
    pub dropped: usize,
}

struct BuilderEntry {
    /// Target path for archive entry, backslash separated
    target: String,
    path: PathField,
    size: u64,
    kind: BuilderEntryKind,
}

enum BuilderEntryKind {
    /// Path to regular file during build
    File(PathBuf),

    Bytes(Vec<u8>),
}

impl fmt::Debug for BuilderEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match &self.kind {
            BuilderEntryKind::File(p) => format!("File({:?})", p),
            BuilderEntryKind::Bytes(data) => format!("Bytes({})", data.len()),
        };
        f.debug_struct("BuilderEntry")
            .field("target", &self.target)
            .field("size", &self.size)
            .field("kind", &kind)
            .finish()
    }
}

/// Builder pattern for constructing CMB archives. Holds a list of entries
/// and consumes itself to construct an archive.
///
/// Entries are written in the order they were added. Every `target` is the
/// backslash-separated path stored in the archive, conventionally beginning
/// with the name of the packed root directory. Targets longer than
/// [`cmb_core::PATH_LEN`] bytes are truncated; see
/// [`ArchiveBuilder::truncations`].
///
/// # Example
/// ```
/// use cmb::ArchiveBuilder;
///
/// let mut builder = ArchiveBuilder::new();
/// builder
///     .bytes(&[1, 2, 3, 4][..], "root\\a.txd")
///     .bytes(&[0xAA, 0xBB][..], "root\\sub\\b.txd");
///
/// let archive = builder.to_vec().unwrap();
/// let records = cmb::core::unpack(&archive).unwrap();
/// assert_eq!(records[1].path, "root\\sub\\b.txd");
/// assert_eq!(records[1].data, [0xAA, 0xBB]);
/// ```
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    entries: Vec<BuilderEntry>,
    truncations: Vec<PathTruncation>,
    excluded: Vec<PathBuf>,
}

impl ArchiveBuilder {
    pub fn new() -> ArchiveBuilder {
        ArchiveBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Paths that were truncated to fit the path field, in entry order
    pub fn truncations(&self) -> &[PathTruncation] {
        &self.truncations
    }

    /// Leave the file at `path` out of later [`ArchiveBuilder::dir`] scans.
    /// `path` must be canonical, as scanned paths are.
    pub fn exclude(&mut self, path: impl Into<PathBuf>) -> &mut ArchiveBuilder {
        self.excluded.push(path.into());
        self
    }

    fn push(&mut self, target: String, size: u64, kind: BuilderEntryKind) {
        let (path, dropped) = PathField::encode_lossy(&target);
        if dropped > 0 {
            warn!(
                "Path {} exceeds the {} byte path field, {} bytes truncated",
                target,
                cmb_core::PATH_LEN,
                dropped
            );
            self.truncations.push(PathTruncation {
                target: target.clone(),
                dropped,
            });
        }
        debug!("Add {} ({} bytes)", target, size);
        self.entries.push(BuilderEntry {
            target,
            path,
            size,
            kind,
        });
    }

    /// Add a regular file to this builder. `source` is the position of the
    /// file on the build system; its size is taken now and checked again
    /// when the archive is written.
    pub fn file(
        &mut self,
        source: impl AsRef<Path>,
        target: impl Into<String>,
    ) -> Result<&mut ArchiveBuilder, Error> {
        let source = source.as_ref();
        let metadata = fs::metadata(source).map_err(wrap_io_err!(source, "Stat source file"))?;
        if !metadata.is_file() {
            return Err(Error::NotAFile(source.to_path_buf()));
        }
        self.push(
            target.into(),
            metadata.len(),
            BuilderEntryKind::File(source.to_path_buf()),
        );
        Ok(self)
    }

    /// Add a file to this builder. `source` is read to the end immediately.
    pub fn file_reader(
        &mut self,
        mut source: impl Read,
        target: impl Into<String>,
    ) -> Result<&mut ArchiveBuilder, Error> {
        let mut data = Vec::new();
        source
            .read_to_end(&mut data)
            .map_err(wrap_io_err!("Read entry source"))?;
        Ok(self.bytes(data, target))
    }

    /// Add a file whose contents are already in memory
    pub fn bytes(&mut self, data: impl Into<Vec<u8>>, target: impl Into<String>) -> &mut ArchiveBuilder {
        let data = data.into();
        self.push(target.into(), data.len() as u64, BuilderEntryKind::Bytes(data));
        self
    }

    /// Add the files directly under `root`, then the files directly under
    /// each of its subdirectories. Deeper directories are not descended
    /// into. Stored paths begin with the name of `root`.
    pub fn dir(&mut self, root: impl AsRef<Path>) -> Result<&mut ArchiveBuilder, Error> {
        let root = root.as_ref();
        let base = fs::canonicalize(root).map_err(wrap_io_err!(root, "Resolve directory"))?;
        if !base.is_dir() {
            return Err(Error::NotADirectory(root.to_path_buf()));
        }
        let name = root_name(&base)?;

        let mut subdirs = Vec::new();
        for entry in sorted_dir(&base)? {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .map_err(wrap_io_err!(path, "Read file type"))?;
            if file_type.is_dir() {
                subdirs.push(path);
            } else {
                self.add_dir_entry(&name, &base, entry)?;
            }
        }

        for subdir in subdirs {
            for entry in sorted_dir(&subdir)? {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .map_err(wrap_io_err!(path, "Read file type"))?;
                if file_type.is_dir() {
                    debug!("Skip nested directory {}", path.display());
                } else {
                    self.add_dir_entry(&name, &base, entry)?;
                }
            }
        }
        Ok(self)
    }

    fn add_dir_entry(&mut self, name: &str, base: &Path, entry: DirEntry) -> Result<(), Error> {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(wrap_io_err!(path, "Read file type"))?;
        if !file_type.is_file() {
            warn!("Skip {}: not a regular file", path.display());
            return Ok(());
        }
        if self.excluded.contains(&path) {
            debug!("Skip excluded {}", path.display());
            return Ok(());
        }

        let target = target_path(name, base, &path)?;
        self.file(&path, target)?;
        Ok(())
    }

    /// Compute the header and entry table from the entry sizes
    pub fn layout(&self) -> Result<Layout, Error> {
        Ok(Layout::new(
            self.entries.iter().map(|entry| (entry.path, entry.size)),
        )?)
    }

    /// Consume this `ArchiveBuilder`, writing the header, entry table and
    /// data region to `writer` in a single forward pass. Returns the
    /// archive length.
    pub fn write_archive<W: Write>(self, writer: &mut W) -> Result<u64, Error> {
        let layout = self.layout()?;

        writer
            .write_all(&layout.head_bytes())
            .map_err(wrap_io_err!("Write archive head"))?;

        for (builder_entry, entry) in self.entries.iter().zip(layout.entries()) {
            let expected = u64::from(entry.size());
            let actual = match &builder_entry.kind {
                BuilderEntryKind::File(source) => {
                    let file = File::open(source).map_err(wrap_io_err!(source, "Open source file"))?;
                    // One extra byte exposes a file that grew since it was added
                    io::copy(&mut file.take(expected + 1), writer)
                        .map_err(wrap_io_err!(source, "Copy source file"))?
                }
                BuilderEntryKind::Bytes(data) => {
                    writer
                        .write_all(data)
                        .map_err(wrap_io_err!("Write entry data"))?;
                    data.len() as u64
                }
            };

            if actual != expected {
                return Err(Error::LengthMismatch {
                    entry: PathBuf::from(&builder_entry.target),
                    actual,
                    expected,
                });
            }
        }

        Ok(layout.archive_size())
    }

    /// Consume this `ArchiveBuilder`, returning the archive bytes
    pub fn to_vec(self) -> Result<Vec<u8>, Error> {
        let mut archive = Vec::new();
        self.write_archive(&mut archive)?;
        Ok(archive)
    }
}

/// Pack `root` and its immediate subdirectories into archive bytes
pub fn pack(root: impl AsRef<Path>) -> Result<Vec<u8>, Error> {
    let mut builder = ArchiveBuilder::new();
    builder.dir(root)?;
    builder.to_vec()
}

/// Name that stored paths start with, and that the archive is named after
pub fn root_name(root: &Path) -> Result<String, Error> {
    match root.file_name() {
        Some(name) => name
            .to_str()
            .map(str::to_string)
            .ok_or_else(|| Error::NonUtf8Path(root.to_path_buf())),
        None => Ok(UNKNOWN_ROOT.to_string()),
    }
}

/// Build the stored path of `path`, a file somewhere below `base`
fn target_path(name: &str, base: &Path, path: &Path) -> Result<String, Error> {
    let invalid = |component: &Path| Error::InvalidPath {
        entry: path.display().to_string(),
        component: component.display().to_string(),
    };
    let relative = path.strip_prefix(base).map_err(|_| invalid(path))?;

    let mut target = name.to_string();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| Error::NonUtf8Path(path.to_path_buf()))?;
                // Would be read back as extra directory levels
                if part.contains(PATH_SEPARATOR) {
                    return Err(invalid(Path::new(part)));
                }
                target.push(PATH_SEPARATOR);
                target.push_str(part);
            }
            other => return Err(invalid(other.as_ref())),
        }
    }
    Ok(target)
}

/// Read a directory, sorted by file name so that archives are deterministic
fn sorted_dir(dir: &Path) -> Result<Vec<DirEntry>, Error> {
    let mut entries = Vec::new();
    for entry_res in fs::read_dir(dir).map_err(wrap_io_err!(dir, "Read directory"))? {
        entries.push(entry_res.map_err(wrap_io_err!(dir, "Read directory entry"))?);
    }
    entries.sort_by_key(|entry| entry.file_name());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{root_name, target_path, ArchiveBuilder, UNKNOWN_ROOT};
    use crate::Error;

    #[test]
    fn target_path_starts_at_root_name() {
        let base = Path::new("/data/textures/root");
        let target = target_path("root", base, &base.join("sub").join("b.txd")).unwrap();
        assert_eq!(target, "root\\sub\\b.txd");
    }

    #[test]
    fn root_name_recurring_in_path_is_not_stripped() {
        // Stripping by searching for the name would cut at the first "root"
        let base = Path::new("/root/work/root");
        let target = target_path("root", base, &base.join("a.txd")).unwrap();
        assert_eq!(target, "root\\a.txd");
    }

    #[cfg(unix)]
    #[test]
    fn separator_in_file_name_is_rejected() {
        let base = Path::new("/data/root");
        match target_path("root", base, &base.join("a\\b.txd")) {
            Err(Error::InvalidPath { component, .. }) => assert_eq!(component, "a\\b.txd"),
            other => panic!("expected InvalidPath, got {:?}", other),
        }
    }

    #[test]
    fn filesystem_root_has_placeholder_name() {
        assert_eq!(root_name(Path::new("/")).unwrap(), UNKNOWN_ROOT);
        assert_eq!(root_name(Path::new("/data/txd")).unwrap(), "txd");
    }

    #[test]
    fn truncations_are_reported() {
        let long = format!("root\\{}.txd", "x".repeat(80));
        let mut builder = ArchiveBuilder::new();
        builder.bytes(vec![1], "root\\short.txd").bytes(vec![2], long.clone());

        let truncations = builder.truncations();
        assert_eq!(truncations.len(), 1);
        assert_eq!(truncations[0].target, long);
        assert_eq!(truncations[0].dropped, long.len() - 80);
        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn excluded_files_are_not_scanned() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("root");
        std::fs::create_dir_all(root.join("sub")).unwrap();
        std::fs::write(root.join("a.txd"), b"a").unwrap();
        std::fs::write(root.join("sub").join("b.txd"), b"b").unwrap();
        let base = std::fs::canonicalize(&root).unwrap();

        let mut builder = ArchiveBuilder::new();
        builder.exclude(base.join("sub").join("b.txd")).dir(&root).unwrap();
        assert_eq!(builder.len(), 1);
        assert_eq!(builder.entries[0].target, "root\\a.txd");
    }

    #[test]
    fn empty_builder_writes_header_only() {
        let archive = ArchiveBuilder::new().to_vec().unwrap();
        assert_eq!(archive, [8, 0, 0, 0, 0, 0, 0, 0]);
    }
}
