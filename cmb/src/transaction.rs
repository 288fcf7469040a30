use std::collections::VecDeque;
use std::convert::TryFrom;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use cmb_core::ArchiveSrc;
use log::debug;

use crate::ext::EntryExt;
use crate::{wrap_io_err, Error};

/// Staging path next to `target_path`, unique per entry so that archives
/// holding the same path twice do not share a temp file
fn temp_path(target_path: &Path, index: u32) -> Result<PathBuf, Error> {
    let parent = target_path.parent().ok_or_else(|| Error::InvalidPath {
        entry: target_path.display().to_string(),
        component: String::from("/"),
    })?;
    fs::create_dir_all(parent).map_err(wrap_io_err!(parent, "Create directory"))?;

    let tmp_name = match target_path.file_name() {
        Some(filename) => format!(".cmb.{}.{}", index, Path::new(filename).display()),
        None => format!(".cmb.{}", index),
    };
    Ok(parent.join(tmp_name))
}

/// Temp file (`.cmb.*`) to target file
#[derive(Debug)]
struct Action {
    tmp: PathBuf,
    target: PathBuf,
}

impl Action {
    fn commit(&self) -> io::Result<()> {
        fs::rename(&self.tmp, &self.target)
    }

    fn abort(&self) -> io::Result<()> {
        fs::remove_file(&self.tmp)
    }
}

/// Files of an archive staged next to their destinations. Nothing is visible
/// at the destination until [`Transaction::commit`].
#[derive(Debug)]
pub struct Transaction {
    actions: VecDeque<Action>,
}

impl Transaction {
    /// Stage every entry of `src` below `base_dir`, creating the directory
    /// chain of each stored path as needed
    pub fn install<Src>(src: &mut Src, base_dir: impl AsRef<Path>) -> Result<Transaction, Error>
    where
        Src: ArchiveSrc<Err = Error>,
    {
        let base_dir = base_dir.as_ref();
        let header = src.read_header()?;
        let entries = src.read_entries(&header)?;

        let mut transaction = Transaction {
            actions: VecDeque::with_capacity(entries.len()),
        };
        for (index, entry) in entries.iter().enumerate() {
            let index = u32::try_from(index).map_err(cmb_core::Error::TryFromInt)?;
            let relative_path = entry.check_path()?;
            let target_path = base_dir.join(&relative_path);

            // Stage everything or nothing
            let staged = temp_path(&target_path, index).and_then(|tmp_path| {
                let data = src.read_entry(&header, index, entry)?;
                fs::write(&tmp_path, &data).map_err(wrap_io_err!(tmp_path, "Write temp file"))?;
                Ok(tmp_path)
            });
            let tmp_path = match staged {
                Ok(tmp_path) => tmp_path,
                Err(err) => {
                    let _ = transaction.abort();
                    return Err(err);
                }
            };

            debug!("Stage {} ({} bytes)", relative_path.display(), entry.size());
            transaction.actions.push_back(Action {
                tmp: tmp_path,
                target: target_path,
            });
        }
        Ok(transaction)
    }

    /// Number of files waiting to be committed
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Move staged files into place, in archive order. A failed commit can
    /// be retried; the remaining actions stay part of this transaction.
    pub fn commit(&mut self) -> Result<usize, Error> {
        let mut count = 0;
        while let Some(action) = self.actions.pop_front() {
            if let Err(err) = action.commit() {
                self.actions.push_front(action);
                return Err(Error::FailedCommit {
                    changed: count,
                    remaining: self.actions.len(),
                    source: err,
                });
            }
            count += 1;
        }
        Ok(count)
    }

    /// Clean up any tmp files referenced by this transaction without committing.
    /// All actions are attempted before the first failure is returned; the
    /// ones that failed are left in the transaction so this can be re-run.
    pub fn abort(&mut self) -> Result<usize, Error> {
        let mut count = 0;
        let mut failed = VecDeque::new();
        let mut first_err = None;
        while let Some(action) = self.actions.pop_front() {
            match action.abort() {
                Ok(()) => count += 1,
                Err(err) => {
                    first_err.get_or_insert(err);
                    failed.push_back(action);
                }
            }
        }
        self.actions = failed;

        match first_err {
            Some(source) => Err(Error::FailedCommit {
                changed: count,
                remaining: self.actions.len(),
                source,
            }),
            None => Ok(count),
        }
    }
}
