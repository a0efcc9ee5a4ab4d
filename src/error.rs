use thiserror::Error;

/// Fatal conditions raised while building the image.
///
/// Inode-number conflicts are not listed here: they are logged and the
/// build carries on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("out of free blocks: needed {requested}, only {available} left")]
    OutOfBlocks { requested: usize, available: usize },
    #[error("inode {inode} given {count} block pointers, at most 7 fit")]
    TooManyPointers { inode: u32, count: usize },
    #[error("directory inode {inode} has no pointer slot left for another block")]
    DirectoryFull { inode: u32 },
    #[error("file of {blocks} data blocks needs more than 7 indirect blocks")]
    IndirectOverflow { blocks: usize },
    #[error("inode number {inode} is outside the inode table")]
    InodeOutOfRange { inode: u32 },
    #[error("write to block {block} is outside the disk")]
    BlockOutOfRange { block: usize },
    #[error("malformed permission descriptor {descriptor:?}")]
    BadPermissions { descriptor: String },
    #[error("no open directory to add an entry to")]
    EmptyDirectoryStack,
}

pub type Result<T> = std::result::Result<T, ImageError>;
