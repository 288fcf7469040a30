mod archive;
mod bin;
mod builder;
pub mod ext;
mod transaction;

pub use archive::*;
pub use bin::*;
pub use builder::*;
pub use transaction::*;

pub use cmb_core as core;

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Build a closure that wraps an [`io::Error`] with a context message and,
/// optionally, the path it happened on.
#[macro_export]
macro_rules! wrap_io_err {
    ($path:expr, $context:expr) => {
        |source| $crate::Error::Io {
            source,
            path: Some(::std::path::PathBuf::from(&$path)),
            context: $context,
        }
    };
    ($context:expr) => {
        |source| $crate::Error::Io {
            source,
            path: None,
            context: $context,
        }
    };
}

#[derive(thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] cmb_core::Error),

    #[error("{context}{}", display_path(.path))]
    Io {
        #[source]
        source: io::Error,
        path: Option<PathBuf>,
        context: &'static str,
    },

    #[error("Invalid path component {component:?} in entry {entry:?}")]
    InvalidPath { entry: String, component: String },

    #[error("Entry size mismatch for {}: expected {expected}, got {actual}", .entry.display())]
    LengthMismatch {
        entry: PathBuf,
        actual: u64,
        expected: u64,
    },

    #[error("Path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("Failed to commit transaction. {changed} files changed, {remaining} files remaining")]
    FailedCommit {
        changed: usize,
        remaining: usize,
        #[source]
        source: io::Error,
    },
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(": {}", path.display()),
        None => String::new(),
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{self}")?;

        let mut source = self.source();
        while let Some(err) = source {
            writeln!(f, "\tCaused by: {err}")?;
            source = err.source();
        }

        Ok(())
    }
}
