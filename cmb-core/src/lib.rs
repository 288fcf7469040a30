#![no_std]
extern crate alloc;

use core::mem;

pub use crate::archive::{unpack, ArchiveSrc, Record};
pub use crate::entry::Entry;
pub use crate::error::Error;
pub use crate::header::{table_size, Header};
pub use crate::layout::Layout;
pub use crate::path::{PathField, PATH_SEPARATOR};

mod archive;
mod entry;
mod error;
mod header;
mod layout;
mod path;


pub const HEADER_SIZE: usize = mem::size_of::<Header>();
pub const ENTRY_SIZE: usize = mem::size_of::<Entry>();
/// Width of the fixed path field in every entry
pub const PATH_LEN: usize = 0x50;
