mod bitmap;
mod dump;
mod error;
mod image;
pub mod layout;
mod record;
mod time;

pub use crate::bitmap::{free_block_number, free_inode_number, Bitmap};
pub use crate::dump::{dump, Dumper};
pub use crate::error::{DumpError, Result};
pub use crate::image::{FileImage, ImageReader, MemImage};
pub use crate::layout::{
    dir_entry::{DirEntry, DirSlot},
    group::GroupDescriptor,
    inode::{Inode, InodeKind},
    superblock::Superblock,
};
pub use crate::record::Record;
pub use crate::time::format_timestamp;
