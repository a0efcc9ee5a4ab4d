/// Directory construction.
///
/// Directories are files of 8-word entries:
///   0      inode number
///   1..=4  name, two characters per word, space padded to 8
///   5..=7  unused
///
/// Open directories sit on a stack. Each frame is a write cursor into the
/// directory's current block; a full block is followed immediately by a
/// fresh one linked into the next free pointer slot.
use log::{debug, warn};

use crate::error::{ImageError, Result};
use crate::image::Image;
use crate::inode::{check_range, FileKind, InodeFlags};
use crate::layout::*;
use crate::word::pack_chars;

/// Which implicit entries a new directory gets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirPolicy {
    /// "." pointing at the directory itself
    pub dot: bool,
    /// ".." pointing at the enclosing directory
    pub dotdot: bool,
    /// no "dd" entry
    pub nodd: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirFrame {
    pub block: usize,
    pub offset: usize,
    pub inode: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryTarget {
    Inode(u32),
    /// Whatever inode was filled most recently.
    Last,
}

pub fn pack_name(name: &str) -> [u32; DIRENT_NAME_WORDS] {
    let mut padded = [b' '; DIRENT_NAME_LEN];
    for (dst, &src) in padded.iter_mut().zip(name.as_bytes()) {
        *dst = src;
    }
    let mut words = [0; DIRENT_NAME_WORDS];
    for (w, pair) in words.iter_mut().zip(padded.chunks(2)) {
        *w = pack_chars(pair[0], pair[1]);
    }
    words
}

impl Image {
    /// Fail, before anything is written, when the open directory cannot
    /// take one more entry. `reserved` blocks are already promised to the
    /// caller and must stay available on top of any growth block.
    fn check_entry_room(&self, reserved: usize) -> Result<()> {
        let frame = self.dirs.last().ok_or(ImageError::EmptyDirectoryStack)?;
        if frame.offset + DIRENT_SIZE < WORDS_PER_BLOCK {
            return Ok(());
        }
        // The entry filling a block links the next one straight away, so
        // the 56th entry of a directory already needs an eighth block.
        if self.free_ptr_slot(frame.inode).is_none() {
            return Err(ImageError::DirectoryFull { inode: frame.inode });
        }
        let available = self.free.len();
        if available < reserved + 1 {
            return Err(ImageError::OutOfBlocks {
                requested: reserved + 1,
                available,
            });
        }
        Ok(())
    }

    pub fn add_entry(&mut self, name: &str, target: EntryTarget) -> Result<()> {
        let inode = match target {
            EntryTarget::Inode(n) => n,
            EntryTarget::Last => self.last_inode,
        };
        check_range(inode)?;
        self.check_entry_room(0)?;
        let frame = *self.dirs.last().ok_or(ImageError::EmptyDirectoryStack)?;

        if name.len() > DIRENT_NAME_LEN {
            warn!("name {name:?} truncated to {DIRENT_NAME_LEN} characters");
        }
        let mut entry = [0u32; DIRENT_SIZE];
        entry[0] = inode;
        entry[1..=DIRENT_NAME_WORDS].copy_from_slice(&pack_name(name));
        self.store.write_words(frame.block, frame.offset, &entry)?;

        self.grow_size(frame.inode, DIRENT_SIZE)?;
        self.bump_link(inode)?;
        debug!("dir {}: {name:?} -> inode {inode}", frame.inode);

        let mut next = DirFrame {
            offset: frame.offset + DIRENT_SIZE,
            ..frame
        };
        if next.offset >= WORDS_PER_BLOCK {
            next.block = self.extend_directory(frame.inode)?;
            next.offset = 0;
        }
        if let Some(top) = self.dirs.last_mut() {
            *top = next;
        }
        Ok(())
    }

    /// Give a directory one more block, linked into its next pointer slot.
    fn extend_directory(&mut self, inode: u32) -> Result<usize> {
        let slot = self
            .free_ptr_slot(inode)
            .ok_or(ImageError::DirectoryFull { inode })?;
        let block = self.allocate(WORDS_PER_BLOCK)?[0];
        self.set_ptr(inode, slot, block)?;
        debug!("dir {inode}: grew into block {block}");
        Ok(block)
    }

    pub fn create_directory(
        &mut self,
        name: &str,
        perms: InodeFlags,
        uid: i32,
        explicit: Option<u32>,
    ) -> Result<u32> {
        self.peek_inode(explicit)?;
        if !self.dirs.is_empty() {
            self.check_entry_room(1)?;
        }
        let blocks = self.allocate(WORDS_PER_BLOCK)?;
        let inode = self.allocate_inode(explicit)?;
        self.fill_inode(inode, perms, FileKind::Directory, uid, 0, &blocks)?;

        let parent = match self.dirs.last() {
            Some(frame) => {
                let parent = frame.inode;
                self.add_entry(name, EntryTarget::Inode(inode))?;
                parent
            }
            None => inode,
        };

        self.dirs.push(DirFrame {
            block: blocks[0],
            offset: 0,
            inode,
        });
        debug!("enter directory {name:?} (inode {inode})");

        let policy = self.policy;
        if policy.dot {
            self.add_entry(".", EntryTarget::Inode(inode))?;
        }
        if policy.dotdot {
            self.add_entry("..", EntryTarget::Inode(parent))?;
        }
        if !policy.nodd {
            self.add_entry("dd", EntryTarget::Inode(DD_INODE))?;
        }
        // With every implicit entry switched off a directory would have
        // no way back up, so it still gets its "..".
        if !policy.dot && !policy.dotdot && policy.nodd {
            self.add_entry("..", EntryTarget::Inode(parent))?;
        }
        Ok(inode)
    }

    pub fn add_file(
        &mut self,
        name: &str,
        perms: InodeFlags,
        uid: i32,
        words: &[u32],
        explicit: Option<u32>,
    ) -> Result<u32> {
        let data_blocks = words.len().div_ceil(WORDS_PER_BLOCK);
        let indirect_blocks = if words.len() > MAX_DIRECT_WORDS {
            data_blocks.div_ceil(WORDS_PER_BLOCK)
        } else {
            0
        };
        if indirect_blocks > NUM_PTRS {
            return Err(ImageError::IndirectOverflow {
                blocks: data_blocks,
            });
        }
        let needed = data_blocks + indirect_blocks;
        let available = self.free.len();
        if needed > available {
            return Err(ImageError::OutOfBlocks {
                requested: needed,
                available,
            });
        }
        self.peek_inode(explicit)?;
        self.check_entry_room(needed)?;

        let data = self.allocate(words.len())?;
        for (&blk, chunk) in data.iter().zip(words.chunks(WORDS_PER_BLOCK)) {
            self.store.write_words(blk, 0, chunk)?;
        }
        let ptrs = if indirect_blocks > 0 {
            self.build_indirect(&data)?
        } else {
            data
        };

        let inode = self.allocate_inode(explicit)?;
        self.fill_inode(inode, perms, FileKind::File, uid, words.len(), &ptrs)?;
        self.add_entry(name, EntryTarget::Inode(inode))?;
        Ok(inode)
    }

    pub fn add_special(
        &mut self,
        name: &str,
        perms: InodeFlags,
        uid: i32,
        explicit: Option<u32>,
    ) -> Result<u32> {
        self.peek_inode(explicit)?;
        self.check_entry_room(0)?;
        let inode = self.allocate_inode(explicit)?;
        self.fill_inode(inode, perms, FileKind::Special, uid, 0, &[])?;
        self.add_entry(name, EntryTarget::Inode(inode))?;
        Ok(inode)
    }

    pub fn ascend(&mut self) -> Result<()> {
        let frame = self.dirs.pop().ok_or(ImageError::EmptyDirectoryStack)?;
        debug!("leave directory inode {}", frame.inode);
        Ok(())
    }
}
